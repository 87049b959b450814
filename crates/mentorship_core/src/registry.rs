//! crates/mentorship_core/src/registry.rs
//!
//! The mentor-authored catalog of offered sessions.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{
    BookableSession, MentorCard, OwnedSession, Principal, Session, SessionBooking, SessionDraft,
};
use crate::error::{CoreError, CoreResult};
use crate::ports::{Clock, DatabaseService, PortError};

pub struct SessionRegistry {
    db: Arc<dyn DatabaseService>,
    clock: Arc<dyn Clock>,
}

impl SessionRegistry {
    pub fn new(db: Arc<dyn DatabaseService>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Validates `draft` and persists it as an active session owned by `owner`.
    ///
    /// The caller's role is checked by the gateway, not here.
    pub async fn create_session(&self, owner: &Principal, draft: SessionDraft) -> CoreResult<Session> {
        let new_session = draft.validate(owner.id)?;
        let session = self
            .db
            .insert_session(new_session)
            .await
            .map_err(|e| internal("insert session", e))?;

        info!(
            session_id = %session.id,
            owner_id = %owner.id,
            scheduled_at = %session.scheduled_at,
            "Session created"
        );
        Ok(session)
    }

    /// Every session `owner` created, newest first, each with its current bookings.
    pub async fn list_owned_sessions(&self, owner: &Principal) -> CoreResult<Vec<OwnedSession>> {
        let sessions = self
            .db
            .list_sessions_by_owner(owner.id)
            .await
            .map_err(|e| internal("list owned sessions", e))?;

        let mut emails: HashMap<Uuid, Option<String>> = HashMap::new();
        let mut owned = Vec::with_capacity(sessions.len());
        for session in sessions {
            let bookings = self
                .db
                .list_bookings_for_session(session.id)
                .await
                .map_err(|e| internal("list session bookings", e))?;

            let mut annotated = Vec::with_capacity(bookings.len());
            for booking in bookings {
                let student_email = match emails.get(&booking.student_id) {
                    Some(cached) => cached.clone(),
                    None => {
                        let email = self.student_email(booking.student_id).await;
                        emails.insert(booking.student_id, email.clone());
                        email
                    }
                };
                annotated.push(SessionBooking {
                    booking,
                    student_email,
                });
            }
            owned.push(OwnedSession {
                session,
                bookings: annotated,
            });
        }
        Ok(owned)
    }

    /// Active sessions scheduled after now, soonest first, with their mentor's card.
    pub async fn list_bookable(&self) -> CoreResult<Vec<BookableSession>> {
        let now = self.clock.now();
        let mut sessions = self
            .db
            .list_active_sessions_after(now)
            .await
            .map_err(|e| internal("list bookable sessions", e))?;
        sessions.retain(|s| s.is_bookable_at(now));
        sessions.sort_by_key(|s| s.scheduled_at);

        let mut cards: HashMap<Uuid, MentorCard> = HashMap::new();
        let mut bookable = Vec::with_capacity(sessions.len());
        for session in sessions {
            let mentor = match cards.get(&session.owner_id) {
                Some(card) => card.clone(),
                None => {
                    let card = mentor_card(self.db.as_ref(), session.owner_id).await;
                    cards.insert(session.owner_id, card.clone());
                    card
                }
            };
            bookable.push(BookableSession { session, mentor });
        }
        Ok(bookable)
    }

    /// Soft-(de)activates a session. Only its owner may do so.
    pub async fn set_session_active(
        &self,
        owner: &Principal,
        session_id: Uuid,
        active: bool,
    ) -> CoreResult<Session> {
        let session = match self.db.get_session(session_id).await {
            Ok(s) => s,
            Err(PortError::NotFound(_)) => return Err(CoreError::SessionNotFound),
            Err(e) => return Err(internal("load session", e)),
        };
        if session.owner_id != owner.id {
            warn!(session_id = %session_id, caller = %owner.id, "Activation change by non-owner rejected");
            return Err(CoreError::Forbidden);
        }
        if session.is_active == active {
            return Ok(session);
        }

        let updated = self
            .db
            .set_session_active(session_id, active)
            .await
            .map_err(|e| match e {
                PortError::NotFound(_) => CoreError::SessionNotFound,
                other => internal("update session activation", other),
            })?;
        info!(session_id = %session_id, active, "Session activation changed");
        Ok(updated)
    }

    async fn student_email(&self, student_id: Uuid) -> Option<String> {
        match self.db.get_identity_by_id(student_id).await {
            Ok(identity) => Some(identity.email),
            Err(e) => {
                warn!(student_id = %student_id, "Could not resolve student identity: {}", e);
                None
            }
        }
    }
}

/// Resolves a mentor's public card; a missing or unreadable profile degrades to placeholders.
pub(crate) async fn mentor_card(db: &dyn DatabaseService, mentor_id: Uuid) -> MentorCard {
    match db.get_profile(mentor_id).await {
        Ok(profile) => MentorCard::from_profile(mentor_id, profile),
        Err(e) => {
            warn!(mentor_id = %mentor_id, "Falling back to placeholder mentor card: {}", e);
            MentorCard::placeholder(mentor_id)
        }
    }
}

/// Logs the storage fault and returns an opaque error.
pub(crate) fn internal(action: &str, err: PortError) -> CoreError {
    error!("Failed to {}: {}", action, err);
    CoreError::Internal(format!("failed to {}", action))
}
