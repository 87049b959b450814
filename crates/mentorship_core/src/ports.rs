//! crates/mentorship_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the marketplace core.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete storage engine and of wall-clock time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Booking, Credentials, Identity, NewBooking, NewSession, Profile, Role, Session,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),
    /// The session already holds as many bookings as it allows.
    #[error("Capacity reached")]
    CapacityReached,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Storage contract for identities, profiles, sessions and bookings.
///
/// Implementations must enforce, at the storage level:
/// - unique `email` across identities (`Conflict` on violation),
/// - unique `(session_id, student_id)` across bookings (`Conflict` on violation),
/// - `insert_booking` never exceeding the session's `max_students`
///   (`CapacityReached`), checked in the same atomic step as the insert.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Identity Management ---
    async fn create_identity(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> PortResult<Identity>;

    async fn get_identity_by_id(&self, id: Uuid) -> PortResult<Identity>;

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<Credentials>;

    // --- Profiles ---
    /// Stores the display fields and sets `has_profile` on the identity.
    async fn upsert_profile(&self, identity_id: Uuid, profile: &Profile) -> PortResult<()>;

    async fn get_profile(&self, identity_id: Uuid) -> PortResult<Option<Profile>>;

    // --- Sessions ---
    async fn insert_session(&self, session: NewSession) -> PortResult<Session>;

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session>;

    async fn set_session_active(&self, session_id: Uuid, active: bool) -> PortResult<Session>;

    /// Sessions owned by `owner_id`, newest first.
    async fn list_sessions_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Session>>;

    /// Active sessions scheduled strictly after `now`, soonest first.
    async fn list_active_sessions_after(&self, now: DateTime<Utc>) -> PortResult<Vec<Session>>;

    // --- Bookings ---
    async fn find_booking(&self, session_id: Uuid, student_id: Uuid)
        -> PortResult<Option<Booking>>;

    async fn insert_booking(&self, booking: NewBooking) -> PortResult<Booking>;

    /// Bookings for one session, newest first.
    async fn list_bookings_for_session(&self, session_id: Uuid) -> PortResult<Vec<Booking>>;

    /// Bookings held by one student, newest first.
    async fn list_bookings_by_student(&self, student_id: Uuid) -> PortResult<Vec<Booking>>;
}

/// Source of "now" for every temporal check in the core.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
