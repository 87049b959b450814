//! crates/mentorship_core/src/booking.rs
//!
//! The booking engine: validates a reservation against session state and
//! time, and persists it.
//!
//! The existing-booking lookup before the insert only short-circuits the
//! common case. The storage layer's unique (session, student) constraint is
//! what guarantees a student never holds two bookings for one session, and
//! a `Conflict` from the insert is reported as `AlreadyBooked`.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    parse_date, parse_time, Booking, BookingRequest, MentorCard, NewBooking, Principal,
    StudentBooking,
};
use crate::error::{CoreError, CoreResult};
use crate::ports::{Clock, DatabaseService, PortError};
use crate::registry::{internal, mentor_card};

pub struct BookingEngine {
    db: Arc<dyn DatabaseService>,
    clock: Arc<dyn Clock>,
}

impl BookingEngine {
    pub fn new(db: Arc<dyn DatabaseService>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Reserves a place on a session for `student`.
    ///
    /// Checks run in order and the first failure wins: input format, session
    /// exists, session active, session in the future, no existing booking,
    /// capacity left.
    pub async fn book(&self, student: &Principal, request: BookingRequest) -> CoreResult<Booking> {
        let booked_date = parse_date(&request.booked_date)?;
        let booked_time = parse_time(&request.booked_time)?;

        let session = match self.db.get_session(request.session_id).await {
            Ok(s) => s,
            Err(PortError::NotFound(_)) => return Err(CoreError::SessionNotFound),
            Err(e) => return Err(internal("load session", e)),
        };

        if !session.is_active {
            return Err(self.rejected(student, session.id, CoreError::SessionUnavailable));
        }
        if session.scheduled_at <= self.clock.now() {
            return Err(self.rejected(student, session.id, CoreError::SessionExpired));
        }

        match self.db.find_booking(session.id, student.id).await {
            Ok(Some(_)) => return Err(self.rejected(student, session.id, CoreError::AlreadyBooked)),
            Ok(None) => {}
            Err(e) => return Err(internal("look up existing booking", e)),
        }

        let new_booking = NewBooking {
            session_id: session.id,
            student_id: student.id,
            booked_date,
            booked_time,
        };
        let booking = self.db.insert_booking(new_booking).await.map_err(|e| match e {
            PortError::Conflict(_) => self.rejected(student, session.id, CoreError::AlreadyBooked),
            PortError::CapacityReached => self.rejected(student, session.id, CoreError::SessionFull),
            PortError::NotFound(_) => CoreError::SessionNotFound,
            other => internal("insert booking", other),
        })?;

        info!(
            booking_id = %booking.id,
            session_id = %session.id,
            student_id = %student.id,
            "Booking created"
        );
        Ok(booking)
    }

    /// The student's bookings, newest first, joined with session and mentor.
    pub async fn list_my_bookings(&self, student: &Principal) -> CoreResult<Vec<StudentBooking>> {
        let bookings = self
            .db
            .list_bookings_by_student(student.id)
            .await
            .map_err(|e| internal("list student bookings", e))?;

        let mut cards: HashMap<Uuid, MentorCard> = HashMap::new();
        let mut joined = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let session = match self.db.get_session(booking.session_id).await {
                Ok(s) => s,
                Err(PortError::NotFound(_)) => {
                    warn!(booking_id = %booking.id, "Booking references a missing session");
                    continue;
                }
                Err(e) => return Err(internal("load booked session", e)),
            };
            let mentor = match cards.get(&session.owner_id) {
                Some(card) => card.clone(),
                None => {
                    let card = mentor_card(self.db.as_ref(), session.owner_id).await;
                    cards.insert(session.owner_id, card.clone());
                    card
                }
            };
            joined.push(StudentBooking {
                booking,
                session,
                mentor,
            });
        }
        Ok(joined)
    }

    fn rejected(&self, student: &Principal, session_id: Uuid, err: CoreError) -> CoreError {
        warn!(
            session_id = %session_id,
            student_id = %student.id,
            reason = err.kind(),
            "Booking rejected"
        );
        err
    }
}
