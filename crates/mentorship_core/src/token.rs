//! crates/mentorship_core/src/token.rs
//!
//! Issues and verifies signed identity tokens.
//!
//! Tokens are HS256 JWTs. Signature, algorithm and claim shape are checked by
//! `jsonwebtoken`; expiry is checked against the injected `Clock`, so
//! verification is a pure function of the key, the token and "now".

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::SystemClock;
use crate::domain::{Principal, Role};
use crate::ports::Clock;

/// Default token validity window in days.
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

/// Every verification failure collapses into `InvalidToken`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

/// Claims embedded in every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenClaims {
    /// Subject - identity ID.
    sub: Uuid,
    email: String,
    role: Role,
    /// Issued at (unix timestamp).
    iat: i64,
    /// Expiry (unix timestamp).
    exp: i64,
}

pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(secret: &SecretString) -> Self {
        let key = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // `exp` must be present, but is compared against `self.clock` in `verify`.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(key),
            decoding_key: DecodingKey::from_secret(key),
            validation,
            ttl: Duration::days(DEFAULT_TOKEN_TTL_DAYS),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Produces a token for `principal`, valid for the configured window.
    pub fn issue(&self, principal: &Principal) -> Result<String, TokenError> {
        let now = self.clock.now().timestamp();
        let claims = TokenClaims {
            sub: principal.id,
            email: principal.email.clone(),
            role: principal.role,
            iat: now,
            exp: now + self.ttl.num_seconds(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Checks signature and expiry and returns the embedded identity.
    pub fn verify(&self, token: &str) -> Result<Principal, TokenError> {
        let claims = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::InvalidToken)?
            .claims;

        if claims.exp <= self.clock.now().timestamp() {
            return Err(TokenError::InvalidToken);
        }

        Ok(Principal {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};
    use data_encoding::BASE64URL_NOPAD;

    const SECRET: &str = "a-test-secret-that-is-long-enough-for-hmac";

    fn service() -> TokenService {
        TokenService::new(&SecretString::from(SECRET))
    }

    fn principal(role: Role) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            role,
        }
    }

    fn pinned_service() -> (Arc<FixedClock>, TokenService) {
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()));
        let service = service().with_clock(clock.clone());
        (clock, service)
    }

    #[test]
    fn test_round_trip_returns_same_identity() {
        let service = service();
        let who = principal(Role::Mentor);
        let token = service.issue(&who).unwrap();
        assert_eq!(service.verify(&token).unwrap(), who);
    }

    #[test]
    fn test_header_is_hs256() {
        let token = service().issue(&principal(Role::Student)).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(jsonwebtoken::decode_header(&token).unwrap().alg, Algorithm::HS256);
    }

    #[test]
    fn test_expires_after_seven_days() {
        let (clock, service) = pinned_service();
        let token = service.issue(&principal(Role::Student)).unwrap();

        clock.advance(Duration::days(7) - Duration::seconds(1));
        assert!(service.verify(&token).is_ok());

        clock.advance(Duration::seconds(1));
        assert_eq!(service.verify(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let token = service().issue(&principal(Role::Mentor)).unwrap();
        let other = TokenService::new(&SecretString::from("a-completely-different-signing-secret!!"));
        assert_eq!(other.verify(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_other_algorithm_is_rejected() {
        let who = principal(Role::Mentor);
        let claims = TokenClaims {
            sub: who.id,
            email: who.email,
            role: who.role,
            iat: Utc::now().timestamp(),
            exp: Utc::now().timestamp() + 3600,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert_eq!(service().verify(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_malformed_tokens_are_rejected() {
        let service = service();
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.??.**"] {
            assert_eq!(service.verify(token), Err(TokenError::InvalidToken), "{token}");
        }
    }

    #[test]
    fn test_forged_role_is_rejected() {
        let service = service();
        let token = service.issue(&principal(Role::Student)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let mut claims: serde_json::Value =
            serde_json::from_slice(&BASE64URL_NOPAD.decode(parts[1].as_bytes()).unwrap()).unwrap();
        claims["role"] = serde_json::Value::String("MENTOR".to_string());
        let forged_claims = BASE64URL_NOPAD.encode(&serde_json::to_vec(&claims).unwrap());

        let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);
        assert_eq!(service.verify(&forged), Err(TokenError::InvalidToken));
    }
}
