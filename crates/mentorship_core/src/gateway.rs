//! crates/mentorship_core/src/gateway.rs
//!
//! Request-level guard composing token verification with a role predicate.

use std::sync::Arc;
use tracing::debug;

use crate::domain::{Principal, Role};
use crate::error::{CoreError, CoreResult};
use crate::token::TokenService;

#[derive(Clone)]
pub struct AccessGateway {
    tokens: Arc<TokenService>,
}

impl AccessGateway {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }

    /// Verifies `token` and, when `required_role` is given, checks the caller holds it.
    ///
    /// A missing or unverifiable token is `Unauthenticated`; a valid token with
    /// the wrong role is `Forbidden`. Never touches storage.
    pub fn authorize(&self, token: Option<&str>, required_role: Option<Role>) -> CoreResult<Principal> {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => {
                debug!("Rejected request without a token");
                return Err(CoreError::Unauthenticated);
            }
        };

        let principal = self.tokens.verify(token).map_err(|_| {
            debug!("Rejected request with an invalid token");
            CoreError::Unauthenticated
        })?;

        match required_role {
            Some(role) if principal.role != role => {
                debug!(
                    identity = %principal.id,
                    have = %principal.role,
                    need = %role,
                    "Rejected request with the wrong role"
                );
                Err(CoreError::Forbidden)
            }
            _ => Ok(principal),
        }
    }
}
