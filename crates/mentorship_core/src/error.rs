//! crates/mentorship_core/src/error.rs
//!
//! The failure taxonomy every core operation reports to its caller.

/// A stable error kind plus a human-readable message.
///
/// Storage details never reach this type: adapters report `PortError`, and
/// the core decides which `CoreError` a caller sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("You do not have permission to perform this action")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session is no longer available")]
    SessionUnavailable,

    #[error("Session has already taken place")]
    SessionExpired,

    #[error("You have already booked this session")]
    AlreadyBooked,

    #[error("Session is fully booked")]
    SessionFull,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The message is for logs only; callers see `kind()` and the display text.
    #[error("An internal error occurred")]
    Internal(String),
}

impl CoreError {
    /// Machine-readable code, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Unauthenticated => "UNAUTHENTICATED",
            CoreError::Forbidden => "FORBIDDEN",
            CoreError::Validation(_) => "VALIDATION_ERROR",
            CoreError::SessionNotFound => "SESSION_NOT_FOUND",
            CoreError::SessionUnavailable => "SESSION_UNAVAILABLE",
            CoreError::SessionExpired => "SESSION_EXPIRED",
            CoreError::AlreadyBooked => "ALREADY_BOOKED",
            CoreError::SessionFull => "SESSION_FULL",
            CoreError::EmailTaken => "EMAIL_TAKEN",
            CoreError::InvalidCredentials => "INVALID_CREDENTIALS",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// A convenience type alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;
