//! crates/mentorship_core/src/domain.rs
//!
//! Defines the pure, core data structures for the marketplace.
//! Apart from `Role` (which travels inside signed tokens) these structs are
//! independent of any database or wire format.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

/// Shown in place of a mentor's name when no profile exists.
pub const UNKNOWN_MENTOR: &str = "Unknown Mentor";
/// Shown in place of a mentor's language when no profile exists.
pub const DEFAULT_LANGUAGE: &str = "English";

pub const MIN_DURATION_MINUTES: i64 = 15;
pub const MAX_DURATION_MINUTES: i64 = 240;
pub const MIN_STUDENTS: i64 = 1;
pub const MAX_STUDENTS: i64 = 20;

//=========================================================================================
// Identities
//=========================================================================================

/// The closed set of roles an identity can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Mentor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "STUDENT",
            Role::Mentor => "MENTOR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STUDENT" => Ok(Role::Student),
            "MENTOR" => Ok(Role::Mentor),
            other => Err(CoreError::Validation(format!("unknown role '{}'", other))),
        }
    }
}

/// A registered actor, as held by the identity store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub has_profile: bool,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Only used internally for login - contains sensitive data.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub identity: Identity,
    pub password_hash: String,
}

/// The caller identity carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Public display fields written by onboarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub display_name: String,
    pub preferred_language: String,
}

/// How a mentor is rendered next to a session or booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentorCard {
    pub mentor_id: Uuid,
    pub display_name: String,
    pub preferred_language: String,
}

impl MentorCard {
    pub fn from_profile(mentor_id: Uuid, profile: Option<Profile>) -> Self {
        match profile {
            Some(p) => Self {
                mentor_id,
                display_name: p.display_name,
                preferred_language: p.preferred_language,
            },
            None => Self::placeholder(mentor_id),
        }
    }

    pub fn placeholder(mentor_id: Uuid) -> Self {
        Self {
            mentor_id,
            display_name: UNKNOWN_MENTOR.to_string(),
            preferred_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

//=========================================================================================
// Sessions
//=========================================================================================

/// A mentor-published, fixed-time offering.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub duration_minutes: u32,
    pub price: f64,
    pub scheduled_at: DateTime<Utc>,
    pub max_students: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// A session can be reserved only while active and strictly in the future.
    pub fn is_bookable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.scheduled_at > now
    }
}

/// Raw session creation input, exactly as a mentor submits it.
#[derive(Debug, Clone)]
pub struct SessionDraft {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub duration: i64,
    pub price: f64,
    pub date: String,
    pub time: String,
    pub max_students: i64,
}

/// A validated session, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub duration_minutes: u32,
    pub price: f64,
    pub scheduled_at: DateTime<Utc>,
    pub max_students: u32,
}

impl SessionDraft {
    /// Checks every field and folds `date` + `time` into a single UTC instant.
    pub fn validate(self, owner_id: Uuid) -> Result<NewSession, CoreError> {
        let title = required_text("title", &self.title)?;
        let description = required_text("description", &self.description)?;
        let subject = required_text("subject", &self.subject)?;

        if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&self.duration) {
            return Err(CoreError::Validation(format!(
                "duration must be between {} and {} minutes",
                MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
            )));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CoreError::Validation(
                "price must be a non-negative number".to_string(),
            ));
        }
        if !(MIN_STUDENTS..=MAX_STUDENTS).contains(&self.max_students) {
            return Err(CoreError::Validation(format!(
                "maxStudents must be between {} and {}",
                MIN_STUDENTS, MAX_STUDENTS
            )));
        }

        let scheduled_at = parse_schedule(&self.date, &self.time)?;

        Ok(NewSession {
            owner_id,
            title,
            description,
            subject,
            duration_minutes: self.duration as u32,
            price: self.price,
            scheduled_at,
            max_students: self.max_students as u32,
        })
    }
}

fn required_text(field: &str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CoreError::Validation(format!("'{}' is not a valid date (YYYY-MM-DD)", raw)))
}

/// Parses an `HH:MM` or `HH:MM:SS` wall-clock time.
pub fn parse_time(raw: &str) -> Result<NaiveTime, CoreError> {
    let raw_trimmed = raw.trim();
    NaiveTime::parse_from_str(raw_trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw_trimmed, "%H:%M:%S"))
        .map_err(|_| CoreError::Validation(format!("'{}' is not a valid time (HH:MM)", raw)))
}

/// Date and time are interpreted as UTC.
pub fn parse_schedule(date: &str, time: &str) -> Result<DateTime<Utc>, CoreError> {
    let date = parse_date(date)?;
    let time = parse_time(time)?;
    Ok(NaiveDateTime::new(date, time).and_utc())
}

//=========================================================================================
// Bookings
//=========================================================================================

/// Bookings are created `Pending`; no transitions are defined yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    Pending,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
        }
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            other => Err(CoreError::Internal(format!("unknown booking status '{}'", other))),
        }
    }
}

/// A student's reservation against a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub status: BookingStatus,
    pub booked_date: NaiveDate,
    pub booked_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

/// Raw booking input from a student.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub session_id: Uuid,
    pub booked_date: String,
    pub booked_time: String,
}

/// A validated booking, ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub booked_date: NaiveDate,
    pub booked_time: NaiveTime,
}

//=========================================================================================
// Read views
//=========================================================================================

/// A booking as seen by the mentor owning its session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionBooking {
    pub booking: Booking,
    pub student_email: Option<String>,
}

/// A mentor's session together with its current bookings.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedSession {
    pub session: Session,
    pub bookings: Vec<SessionBooking>,
}

/// A bookable session annotated with who runs it.
#[derive(Debug, Clone, PartialEq)]
pub struct BookableSession {
    pub session: Session,
    pub mentor: MentorCard,
}

/// A student's booking joined with its session and mentor.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentBooking {
    pub booking: Booking,
    pub session: Session,
    pub mentor: MentorCard,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> SessionDraft {
        SessionDraft {
            title: "Intro to Rust".to_string(),
            description: "Ownership and borrowing".to_string(),
            subject: "Programming".to_string(),
            duration: 60,
            price: 25.0,
            date: "2025-01-10".to_string(),
            time: "09:00".to_string(),
            max_students: 4,
        }
    }

    #[test]
    fn test_role_parses_case_insensitively() {
        assert_eq!("mentor".parse::<Role>().unwrap(), Role::Mentor);
        assert_eq!("STUDENT".parse::<Role>().unwrap(), Role::Student);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Role::Mentor).unwrap(), "\"MENTOR\"");
    }

    #[test]
    fn test_draft_folds_date_and_time() {
        let owner = Uuid::new_v4();
        let session = draft().validate(owner).unwrap();
        assert_eq!(session.owner_id, owner);
        assert_eq!(session.scheduled_at.to_rfc3339(), "2025-01-10T09:00:00+00:00");
        assert_eq!(session.duration_minutes, 60);
        assert_eq!(session.max_students, 4);
    }

    #[test]
    fn test_draft_rejects_blank_title() {
        let mut d = draft();
        d.title = "   ".to_string();
        assert!(matches!(d.validate(Uuid::new_v4()), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_draft_rejects_negative_or_nan_price() {
        let mut d = draft();
        d.price = -0.01;
        assert!(d.clone().validate(Uuid::new_v4()).is_err());
        d.price = f64::NAN;
        assert!(d.validate(Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_draft_accepts_free_session() {
        let mut d = draft();
        d.price = 0.0;
        assert!(d.validate(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_draft_rejects_unparseable_schedule() {
        let mut d = draft();
        d.date = "10/01/2025".to_string();
        assert!(d.validate(Uuid::new_v4()).is_err());

        let mut d = draft();
        d.time = "9am".to_string();
        assert!(d.validate(Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_time_accepts_seconds() {
        assert_eq!(parse_time("09:30:15").unwrap(), NaiveTime::from_hms_opt(9, 30, 15).unwrap());
    }

    #[test]
    fn test_bookable_requires_active_and_future() {
        let owner = Uuid::new_v4();
        let new = draft().validate(owner).unwrap();
        let mut session = Session {
            id: Uuid::new_v4(),
            owner_id: owner,
            title: new.title,
            description: new.description,
            subject: new.subject,
            duration_minutes: new.duration_minutes,
            price: new.price,
            scheduled_at: new.scheduled_at,
            max_students: new.max_students,
            is_active: true,
            created_at: Utc::now(),
        };
        let before = session.scheduled_at - chrono::Duration::minutes(1);
        assert!(session.is_bookable_at(before));
        assert!(!session.is_bookable_at(session.scheduled_at));
        session.is_active = false;
        assert!(!session.is_bookable_at(before));
    }

    #[test]
    fn test_mentor_card_placeholder() {
        let id = Uuid::new_v4();
        let card = MentorCard::from_profile(id, None);
        assert_eq!(card.display_name, UNKNOWN_MENTOR);
        assert_eq!(card.preferred_language, DEFAULT_LANGUAGE);
    }
}
