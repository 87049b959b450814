//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.
//!
//! Each guard reads the token, runs it through the `AccessGateway` and, on
//! success, inserts the caller's `Principal` into the request extensions for
//! handlers to use.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use mentorship_core::{Role, TokenService};
use std::sync::Arc;

use crate::error::HttpError;
use crate::web::state::AppState;

/// Name of the cookie carrying the bearer token.
pub const AUTH_COOKIE: &str = "auth-token";

/// Any authenticated identity.
pub async fn require_auth(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    guard(&state, None, req, next).await
}

/// Authenticated identities holding the MENTOR role.
pub async fn require_mentor(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    guard(&state, Some(Role::Mentor), req, next).await
}

/// Authenticated identities holding the STUDENT role.
pub async fn require_student(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    guard(&state, Some(Role::Student), req, next).await
}

async fn guard(state: &AppState, role: Option<Role>, mut req: Request, next: Next) -> Response {
    let token = extract_token(&req);
    match state.gateway.authorize(token.as_deref(), role) {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Err(e) => HttpError(e).into_response(),
    }
}

/// Reads the token from `Authorization: Bearer` or, failing that, the auth cookie.
pub fn extract_token(req: &Request) -> Option<String> {
    let headers = req.headers();
    if let Some(bearer) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        return Some(bearer.trim().to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| c.trim().strip_prefix(AUTH_COOKIE)?.strip_prefix('='))
        .map(|t| t.to_string())
}

/// `Set-Cookie` value carrying a freshly issued token.
pub fn auth_cookie(token: &str, tokens: &TokenService, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        AUTH_COOKIE,
        token,
        tokens.ttl().num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the token.
pub fn clear_auth_cookie(secure: bool) -> String {
    let mut cookie = format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", AUTH_COOKIE);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
