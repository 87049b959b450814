//! crates/mentorship_core/src/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port.
//!
//! Every table lives behind one async `RwLock`; each write is a single
//! critical section, so the uniqueness and capacity checks of
//! `insert_booking` commit together with the insert, the same way a unique
//! index and a row lock do in PostgreSQL. State is lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    Booking, BookingStatus, Credentials, Identity, NewBooking, NewSession, Profile, Role, Session,
};
use crate::ports::{DatabaseService, PortError, PortResult};

#[derive(Default)]
struct Tables {
    identities: HashMap<Uuid, Credentials>,
    email_index: HashMap<String, Uuid>,
    profiles: HashMap<Uuid, Profile>,
    sessions: HashMap<Uuid, Session>,
    bookings: HashMap<Uuid, Booking>,
    /// Unique index on (session_id, student_id).
    booking_index: HashMap<(Uuid, Uuid), Uuid>,
}

#[derive(Default)]
pub struct InMemoryDatabase {
    tables: RwLock<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bookings currently stored for a session.
    pub async fn booking_count(&self, session_id: Uuid) -> usize {
        let tables = self.tables.read().await;
        tables
            .bookings
            .values()
            .filter(|b| b.session_id == session_id)
            .count()
    }
}

fn newest_first<T, F>(items: &mut [T], created_at: F)
where
    F: Fn(&T) -> DateTime<Utc>,
{
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn create_identity(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> PortResult<Identity> {
        let mut tables = self.tables.write().await;
        if tables.email_index.contains_key(email) {
            return Err(PortError::Conflict(format!("email {} already registered", email)));
        }

        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role,
            has_profile: false,
            created_at: Utc::now(),
        };
        tables.email_index.insert(email.to_string(), identity.id);
        tables.identities.insert(
            identity.id,
            Credentials {
                identity: identity.clone(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(identity)
    }

    async fn get_identity_by_id(&self, id: Uuid) -> PortResult<Identity> {
        let tables = self.tables.read().await;
        tables
            .identities
            .get(&id)
            .map(|c| c.identity.clone())
            .ok_or_else(|| PortError::NotFound(format!("Identity {} not found", id)))
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<Credentials> {
        let tables = self.tables.read().await;
        tables
            .email_index
            .get(email)
            .and_then(|id| tables.identities.get(id))
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Identity {} not found", email)))
    }

    async fn upsert_profile(&self, identity_id: Uuid, profile: &Profile) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        let credentials = tables
            .identities
            .get_mut(&identity_id)
            .ok_or_else(|| PortError::NotFound(format!("Identity {} not found", identity_id)))?;
        credentials.identity.has_profile = true;
        tables.profiles.insert(identity_id, profile.clone());
        Ok(())
    }

    async fn get_profile(&self, identity_id: Uuid) -> PortResult<Option<Profile>> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.get(&identity_id).cloned())
    }

    async fn insert_session(&self, session: NewSession) -> PortResult<Session> {
        let record = Session {
            id: Uuid::new_v4(),
            owner_id: session.owner_id,
            title: session.title,
            description: session.description,
            subject: session.subject,
            duration_minutes: session.duration_minutes,
            price: session.price,
            scheduled_at: session.scheduled_at,
            max_students: session.max_students,
            is_active: true,
            created_at: Utc::now(),
        };
        let mut tables = self.tables.write().await;
        tables.sessions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_session(&self, session_id: Uuid) -> PortResult<Session> {
        let tables = self.tables.read().await;
        tables
            .sessions
            .get(&session_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))
    }

    async fn set_session_active(&self, session_id: Uuid, active: bool) -> PortResult<Session> {
        let mut tables = self.tables.write().await;
        let session = tables
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", session_id)))?;
        session.is_active = active;
        Ok(session.clone())
    }

    async fn list_sessions_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Session>> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<Session> = tables
            .sessions
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        newest_first(&mut sessions, |s| s.created_at);
        Ok(sessions)
    }

    async fn list_active_sessions_after(&self, now: DateTime<Utc>) -> PortResult<Vec<Session>> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<Session> = tables
            .sessions
            .values()
            .filter(|s| s.is_bookable_at(now))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.scheduled_at);
        Ok(sessions)
    }

    async fn find_booking(
        &self,
        session_id: Uuid,
        student_id: Uuid,
    ) -> PortResult<Option<Booking>> {
        let tables = self.tables.read().await;
        Ok(tables
            .booking_index
            .get(&(session_id, student_id))
            .and_then(|id| tables.bookings.get(id))
            .cloned())
    }

    async fn insert_booking(&self, booking: NewBooking) -> PortResult<Booking> {
        let mut tables = self.tables.write().await;

        let max_students = tables
            .sessions
            .get(&booking.session_id)
            .map(|s| s.max_students as usize)
            .ok_or_else(|| PortError::NotFound(format!("Session {} not found", booking.session_id)))?;

        let key = (booking.session_id, booking.student_id);
        if tables.booking_index.contains_key(&key) {
            return Err(PortError::Conflict(format!(
                "booking ({}, {}) already exists",
                booking.session_id, booking.student_id
            )));
        }

        let held = tables
            .bookings
            .values()
            .filter(|b| b.session_id == booking.session_id)
            .count();
        if held >= max_students {
            return Err(PortError::CapacityReached);
        }

        let record = Booking {
            id: Uuid::new_v4(),
            session_id: booking.session_id,
            student_id: booking.student_id,
            status: BookingStatus::Pending,
            booked_date: booking.booked_date,
            booked_time: booking.booked_time,
            created_at: Utc::now(),
        };
        tables.booking_index.insert(key, record.id);
        tables.bookings.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_bookings_for_session(&self, session_id: Uuid) -> PortResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| b.session_id == session_id)
            .cloned()
            .collect();
        newest_first(&mut bookings, |b| b.created_at);
        Ok(bookings)
    }

    async fn list_bookings_by_student(&self, student_id: Uuid) -> PortResult<Vec<Booking>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| b.student_id == student_id)
            .cloned()
            .collect();
        newest_first(&mut bookings, |b| b.created_at);
        Ok(bookings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveTime};

    fn new_session(owner_id: Uuid, max_students: u32) -> NewSession {
        NewSession {
            owner_id,
            title: "Algebra".to_string(),
            description: "Linear equations".to_string(),
            subject: "Maths".to_string(),
            duration_minutes: 45,
            price: 10.0,
            scheduled_at: Utc::now() + Duration::days(3),
            max_students,
        }
    }

    fn new_booking(session_id: Uuid, student_id: Uuid) -> NewBooking {
        NewBooking {
            session_id,
            student_id,
            booked_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            booked_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let db = InMemoryDatabase::new();
        db.create_identity("a@b.io", "hash", Role::Student).await.unwrap();
        let result = db.create_identity("a@b.io", "hash", Role::Mentor).await;
        assert!(matches!(result, Err(PortError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_lookup_by_id_and_email() {
        let db = InMemoryDatabase::new();
        let created = db.create_identity("m@b.io", "hash", Role::Mentor).await.unwrap();
        assert_eq!(db.get_identity_by_id(created.id).await.unwrap(), created);
        let creds = db.get_credentials_by_email("m@b.io").await.unwrap();
        assert_eq!(creds.identity.id, created.id);
        assert_eq!(creds.password_hash, "hash");
        assert!(matches!(
            db.get_credentials_by_email("nobody@b.io").await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_flips_has_profile() {
        let db = InMemoryDatabase::new();
        let created = db.create_identity("m@b.io", "hash", Role::Mentor).await.unwrap();
        assert!(!created.has_profile);

        let profile = Profile {
            display_name: "Grace".to_string(),
            preferred_language: "French".to_string(),
        };
        db.upsert_profile(created.id, &profile).await.unwrap();

        assert!(db.get_identity_by_id(created.id).await.unwrap().has_profile);
        assert_eq!(db.get_profile(created.id).await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn test_duplicate_booking_conflicts() {
        let db = InMemoryDatabase::new();
        let session = db.insert_session(new_session(Uuid::new_v4(), 5)).await.unwrap();
        let student = Uuid::new_v4();

        db.insert_booking(new_booking(session.id, student)).await.unwrap();
        let again = db.insert_booking(new_booking(session.id, student)).await;
        assert!(matches!(again, Err(PortError::Conflict(_))));
        assert_eq!(db.booking_count(session.id).await, 1);
    }

    #[tokio::test]
    async fn test_capacity_is_enforced() {
        let db = InMemoryDatabase::new();
        let session = db.insert_session(new_session(Uuid::new_v4(), 1)).await.unwrap();

        db.insert_booking(new_booking(session.id, Uuid::new_v4())).await.unwrap();
        let second = db.insert_booking(new_booking(session.id, Uuid::new_v4())).await;
        assert!(matches!(second, Err(PortError::CapacityReached)));
    }

    #[tokio::test]
    async fn test_active_listing_excludes_past_and_inactive() {
        let db = InMemoryDatabase::new();
        let owner = Uuid::new_v4();
        let now = Utc::now();

        let mut past = new_session(owner, 1);
        past.scheduled_at = now - Duration::hours(1);
        db.insert_session(past).await.unwrap();

        let hidden = db.insert_session(new_session(owner, 1)).await.unwrap();
        db.set_session_active(hidden.id, false).await.unwrap();

        let mut later = new_session(owner, 1);
        later.scheduled_at = now + Duration::days(10);
        let later = db.insert_session(later).await.unwrap();

        let mut sooner = new_session(owner, 1);
        sooner.scheduled_at = now + Duration::days(1);
        let sooner = db.insert_session(sooner).await.unwrap();

        let listed: Vec<Uuid> = db
            .list_active_sessions_after(now)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(listed, vec![sooner.id, later.id]);
    }
}
