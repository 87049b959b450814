//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for signup, login, logout and the current identity.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use mentorship_core::{CoreError, Identity, PortError, Principal, Role};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{HttpError, HttpResult};
use crate::web::extract::AppJson;
use crate::web::middleware::{auth_cookie, clear_auth_cookie};
use crate::web::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    /// `STUDENT` or `MENTOR`.
    pub role: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub has_profile: bool,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            email: identity.email,
            role: identity.role.as_str().to_string(),
            has_profile: identity.has_profile,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub identity: IdentityResponse,
    /// The same token that is set in the `auth-token` cookie.
    pub token: String,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn normalize_email(raw: &str) -> Result<String, CoreError> {
    let email = raw.trim().to_lowercase();
    if email.len() < 3 || !email.contains('@') {
        return Err(CoreError::Validation("a valid email address is required".to_string()));
    }
    Ok(email)
}

fn hash_password(password: &str) -> Result<String, CoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            CoreError::Internal("failed to hash password".to_string())
        })
}

fn password_matches(password: &str, stored_hash: &str) -> Result<bool, CoreError> {
    let parsed_hash = PasswordHash::new(stored_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        CoreError::Internal("stored password hash is unreadable".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// A hash no submitted password matches, verified against for unknown emails.
fn placeholder_hash() -> &'static str {
    static PLACEHOLDER: OnceLock<String> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        hash_password(&Uuid::new_v4().to_string()).unwrap_or_default()
    })
}

/// Issues a token for `identity` and packs cookie plus body.
fn signed_in(
    state: &AppState,
    status: StatusCode,
    identity: Identity,
) -> HttpResult<impl IntoResponse> {
    let token = state.tokens.issue(&identity.principal()).map_err(|e| {
        error!("Failed to issue token: {}", e);
        HttpError(CoreError::Internal("failed to issue token".to_string()))
    })?;
    let cookie = auth_cookie(&token, &state.tokens, state.config.is_production());
    let body = AuthResponse {
        identity: identity.into(),
        token,
    };
    Ok((status, [(header::SET_COOKIE, cookie)], Json(body)))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorBody),
        (status = 409, description = "Email already registered", body = crate::error::ErrorBody)
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SignupRequest>,
) -> HttpResult<impl IntoResponse> {
    // 1. Validate input
    let email = normalize_email(&req.email)?;
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        ))
        .into());
    }
    let role: Role = req.role.parse()?;

    // 2. Hash the password
    let password_hash = hash_password(&req.password)?;

    // 3. Create the identity; the store enforces email uniqueness
    let identity = state
        .db
        .create_identity(&email, &password_hash, role)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => CoreError::EmailTaken,
            other => {
                error!("Failed to create identity: {}", other);
                CoreError::Internal("failed to create identity".to_string())
            }
        })?;
    info!(identity_id = %identity.id, role = %identity.role, "Identity registered");

    // 4. Issue token and set cookie
    signed_in(&state, StatusCode::CREATED, identity)
}

/// POST /auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> HttpResult<impl IntoResponse> {
    let email = req.email.trim().to_lowercase();

    // 1. Look up credentials
    let credentials = match state.db.get_credentials_by_email(&email).await {
        Ok(credentials) => credentials,
        Err(PortError::NotFound(_)) => {
            // Unknown emails pay the same argon2 cost as a wrong password.
            let _ = password_matches(&req.password, placeholder_hash());
            return Err(CoreError::InvalidCredentials.into());
        }
        Err(other) => {
            error!("Failed to load credentials: {}", other);
            return Err(CoreError::Internal("failed to load credentials".to_string()).into());
        }
    };

    // 2. Verify password
    if !password_matches(&req.password, &credentials.password_hash)? {
        return Err(CoreError::InvalidCredentials.into());
    }

    // 3. Issue a fresh token
    signed_in(&state, StatusCode::OK, credentials.identity)
}

/// POST /auth/logout - Clear the auth cookie
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Cookie cleared")
    )
)]
pub async fn logout_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Tokens are stateless; dropping the cookie is all logout does.
    let cookie = clear_auth_cookie(state.config.is_production());
    (StatusCode::NO_CONTENT, [(header::SET_COOKIE, cookie)])
}

/// GET /auth/me - The identity behind the current token
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current identity", body = IdentityResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorBody)
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> HttpResult<Json<IdentityResponse>> {
    let identity = state
        .db
        .get_identity_by_id(principal.id)
        .await
        .map_err(|e| match e {
            // A valid token for a vanished identity is treated as no identity at all.
            PortError::NotFound(_) => CoreError::Unauthenticated,
            other => {
                error!("Failed to load identity: {}", other);
                CoreError::Internal("failed to load identity".to_string())
            }
        })?;
    Ok(Json(identity.into()))
}
