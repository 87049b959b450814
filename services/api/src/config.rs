//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use secrecy::SecretString;
use std::net::SocketAddr;
use tracing::Level;

/// Signing keys shorter than this are refused at startup.
pub const MIN_TOKEN_SECRET_LEN: usize = 32;

/// Longest accepted token validity window.
pub const MAX_TOKEN_TTL_DAYS: i64 = 365;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `None` selects the in-memory store. May embed credentials.
    pub database_url: Option<SecretString>,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub token_secret: SecretString,
    pub token_ttl_days: i64,
    pub environment: Environment,
    pub cors_allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server and Database Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .map(SecretString::from);

        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse::<u32>().map_err(|e| {
                ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".to_string(), e.to_string())
            })?,
            None => 5,
        };

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Token Settings ---
        let raw_secret = lookup("AUTH_TOKEN_SECRET")
            .ok_or_else(|| ConfigError::MissingVar("AUTH_TOKEN_SECRET".to_string()))?;
        if raw_secret.len() < MIN_TOKEN_SECRET_LEN {
            return Err(ConfigError::InvalidValue(
                "AUTH_TOKEN_SECRET".to_string(),
                format!("must be at least {} bytes", MIN_TOKEN_SECRET_LEN),
            ));
        }
        let token_secret = SecretString::from(raw_secret);

        let token_ttl_days = match lookup("AUTH_TOKEN_TTL_DAYS") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(days) if (1..=MAX_TOKEN_TTL_DAYS).contains(&days) => days,
                _ => {
                    return Err(ConfigError::InvalidValue(
                        "AUTH_TOKEN_TTL_DAYS".to_string(),
                        format!("'{}' is not a number of days between 1 and {}", raw, MAX_TOKEN_TTL_DAYS),
                    ))
                }
            },
            None => mentorship_core::DEFAULT_TOKEN_TTL_DAYS,
        };

        // --- Deployment Settings ---
        let environment_str = lookup("APP_ENV").map(|v| v.trim().to_lowercase());
        let environment = match environment_str.as_deref() {
            None | Some("development") | Some("dev") | Some("test") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "APP_ENV".to_string(),
                    format!("unknown environment '{}'", other),
                ))
            }
        };

        let cors_allowed_origin = lookup("CORS_ALLOWED_ORIGIN")
            .unwrap_or_else(|| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            log_level,
            token_secret,
            token_ttl_days,
            environment,
            cors_allowed_origin,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}
