//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Uniqueness is delegated to the schema: `identities.email` and
//! `bookings (session_id, student_id)` carry unique constraints, and a violation
//! is reported as `PortError::Conflict`. Capacity checks on a session are
//! serialised by locking its row for the duration of the booking transaction.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mentorship_core::domain::{
    Booking, BookingStatus, Credentials, Identity, NewBooking, NewSession, Profile, Role, Session,
};
use mentorship_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const IDENTITY_COLUMNS: &str = "id, email, role, has_profile, created_at";
const SESSION_COLUMNS: &str = "id, owner_id, title, description, subject, duration_minutes, \
     price, scheduled_at, max_students, is_active, created_at";
const BOOKING_COLUMNS: &str =
    "id, session_id, student_id, status, booked_date, booked_time, created_at";

#[derive(FromRow)]
struct IdentityRecord {
    id: Uuid,
    email: String,
    role: String,
    has_profile: bool,
    created_at: DateTime<Utc>,
}
impl IdentityRecord {
    fn to_domain(self) -> PortResult<Identity> {
        let role = self
            .role
            .parse::<Role>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Identity {
            id: self.id,
            email: self.email,
            role,
            has_profile: self.has_profile,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    #[sqlx(flatten)]
    identity: IdentityRecord,
    password_hash: String,
}

#[derive(FromRow)]
struct ProfileRecord {
    display_name: String,
    preferred_language: String,
}
impl ProfileRecord {
    fn to_domain(self) -> Profile {
        Profile {
            display_name: self.display_name,
            preferred_language: self.preferred_language,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    description: String,
    subject: String,
    duration_minutes: i32,
    price: f64,
    scheduled_at: DateTime<Utc>,
    max_students: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> Session {
        Session {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            subject: self.subject,
            duration_minutes: self.duration_minutes as u32,
            price: self.price,
            scheduled_at: self.scheduled_at,
            max_students: self.max_students as u32,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct BookingRecord {
    id: Uuid,
    session_id: Uuid,
    student_id: Uuid,
    status: String,
    booked_date: NaiveDate,
    booked_time: NaiveTime,
    created_at: DateTime<Utc>,
}
impl BookingRecord {
    fn to_domain(self) -> PortResult<Booking> {
        let status = self
            .status
            .parse::<BookingStatus>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Booking {
            id: self.id,
            session_id: self.session_id,
            student_id: self.student_id,
            status,
            booked_date: self.booked_date,
            booked_time: self.booked_time,
            created_at: self.created_at,
        })
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_identity(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> PortResult<Identity> {
        let sql = format!(
            "INSERT INTO identities (id, email, password_hash, role) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            IDENTITY_COLUMNS
        );
        let record = sqlx::query_as::<_, IdentityRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(email)
            .bind(password_hash)
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    PortError::Conflict(format!("email {} already registered", email))
                } else {
                    unexpected(e)
                }
            })?;
        record.to_domain()
    }

    async fn get_identity_by_id(&self, id: Uuid) -> PortResult<Identity> {
        let sql = format!("SELECT {} FROM identities WHERE id = $1", IDENTITY_COLUMNS);
        let record = sqlx::query_as::<_, IdentityRecord>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::NotFound(format!("Identity {} not found", id)),
                _ => unexpected(e),
            })?;
        record.to_domain()
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<Credentials> {
        let sql = format!(
            "SELECT {}, password_hash FROM identities WHERE email = $1",
            IDENTITY_COLUMNS
        );
        let record = sqlx::query_as::<_, CredentialsRecord>(&sql)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::NotFound("Identity not found".to_string()),
                _ => unexpected(e),
            })?;
        Ok(Credentials {
            identity: record.identity.to_domain()?,
            password_hash: record.password_hash,
        })
    }

    async fn upsert_profile(&self, identity_id: Uuid, profile: &Profile) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let updated = sqlx::query("UPDATE identities SET has_profile = TRUE WHERE id = $1")
            .bind(identity_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        if updated.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Identity {} not found", identity_id)));
        }

        sqlx::query(
            "INSERT INTO profiles (identity_id, display_name, preferred_language) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (identity_id) DO UPDATE \
             SET display_name = EXCLUDED.display_name, \
                 preferred_language = EXCLUDED.preferred_language, \
                 updated_at = NOW()",
        )
        .bind(identity_id)
        .bind(&profile.display_name)
        .bind(&profile.preferred_language)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn get_profile(&self, identity_id: Uuid) -> PortResult<Option<Profile>> {
        let record = sqlx::query_as::<_, ProfileRecord>(
            "SELECT display_name, preferred_language FROM profiles WHERE identity_id = $1",
        )
        .bind(identity_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.map(ProfileRecord::to_domain))
    }

    async fn insert_session(&self, session: NewSession) -> PortResult<Session> {
        let sql = format!(
            "INSERT INTO sessions \
             (id, owner_id, title, description, subject, duration_minutes, price, scheduled_at, max_students) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            SESSION_COLUMNS
        );
        let record = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(session.owner_id)
            .bind(&session.title)
            .bind(&session.description)
            .bind(&session.subject)
            .bind(session.duration_minutes as i32)
            .bind(session.price)
            .bind(session.scheduled_at)
            .bind(session.max_students as i32)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session> {
        let sql = format!("SELECT {} FROM sessions WHERE id = $1", SESSION_COLUMNS);
        let record = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(session_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    PortError::NotFound(format!("Session {} not found", session_id))
                }
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn set_session_active(&self, session_id: Uuid, active: bool) -> PortResult<Session> {
        let sql = format!(
            "UPDATE sessions SET is_active = $1 WHERE id = $2 RETURNING {}",
            SESSION_COLUMNS
        );
        let record = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(active)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?;
        Ok(record.to_domain())
    }

    async fn list_sessions_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Session>> {
        let sql = format!(
            "SELECT {} FROM sessions WHERE owner_id = $1 ORDER BY created_at DESC",
            SESSION_COLUMNS
        );
        let records = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(SessionRecord::to_domain).collect())
    }

    async fn list_active_sessions_after(&self, now: DateTime<Utc>) -> PortResult<Vec<Session>> {
        let sql = format!(
            "SELECT {} FROM sessions WHERE is_active AND scheduled_at > $1 ORDER BY scheduled_at ASC",
            SESSION_COLUMNS
        );
        let records = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(SessionRecord::to_domain).collect())
    }

    async fn find_booking(
        &self,
        session_id: Uuid,
        student_id: Uuid,
    ) -> PortResult<Option<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE session_id = $1 AND student_id = $2",
            BOOKING_COLUMNS
        );
        let record = sqlx::query_as::<_, BookingRecord>(&sql)
            .bind(session_id)
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        record.map(BookingRecord::to_domain).transpose()
    }

    async fn insert_booking(&self, booking: NewBooking) -> PortResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Serialises concurrent bookings for the same session.
        let max_students: Option<i32> =
            sqlx::query_scalar("SELECT max_students FROM sessions WHERE id = $1 FOR UPDATE")
                .bind(booking.session_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(unexpected)?;
        let max_students = max_students.ok_or_else(|| {
            PortError::NotFound(format!("Session {} not found", booking.session_id))
        })?;

        let (held, already_booked): (i64, bool) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(BOOL_OR(student_id = $2), FALSE) \
             FROM bookings WHERE session_id = $1",
        )
        .bind(booking.session_id)
        .bind(booking.student_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        let conflict = || {
            PortError::Conflict(format!(
                "booking ({}, {}) already exists",
                booking.session_id, booking.student_id
            ))
        };
        if already_booked {
            return Err(conflict());
        }
        if held >= i64::from(max_students) {
            return Err(PortError::CapacityReached);
        }

        let sql = format!(
            "INSERT INTO bookings (id, session_id, student_id, status, booked_date, booked_time) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            BOOKING_COLUMNS
        );
        let record = sqlx::query_as::<_, BookingRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(booking.session_id)
            .bind(booking.student_id)
            .bind(BookingStatus::Pending.as_str())
            .bind(booking.booked_date)
            .bind(booking.booked_time)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| if is_unique_violation(&e) { conflict() } else { unexpected(e) })?;

        tx.commit().await.map_err(|e| {
            if is_unique_violation(&e) {
                conflict()
            } else {
                unexpected(e)
            }
        })?;
        record.to_domain()
    }

    async fn list_bookings_for_session(&self, session_id: Uuid) -> PortResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE session_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        );
        let records = sqlx::query_as::<_, BookingRecord>(&sql)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(BookingRecord::to_domain).collect()
    }

    async fn list_bookings_by_student(&self, student_id: Uuid) -> PortResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE student_id = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        );
        let records = sqlx::query_as::<_, BookingRecord>(&sql)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(BookingRecord::to_domain).collect()
    }
}
