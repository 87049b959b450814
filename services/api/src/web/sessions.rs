//! services/api/src/web/sessions.rs
//!
//! REST handlers for the session catalog.

use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mentorship_core::{
    BookableSession, MentorCard, OwnedSession, Principal, Session, SessionBooking, SessionDraft,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpResult;
use crate::web::extract::{AppJson, AppPath};
use crate::web::state::AppState;

//=========================================================================================
// API Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub title: String,
    pub description: String,
    pub subject: String,
    /// Minutes, 15 to 240.
    pub duration: i64,
    pub price: f64,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub max_students: i64,
}

impl From<CreateSessionRequest> for SessionDraft {
    fn from(req: CreateSessionRequest) -> Self {
        SessionDraft {
            title: req.title,
            description: req.description,
            subject: req.subject,
            duration: req.duration,
            price: req.price,
            date: req.date,
            time: req.time,
            max_students: req.max_students,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
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

impl From<Session> for SessionResponse {
    fn from(s: Session) -> Self {
        Self {
            id: s.id,
            owner_id: s.owner_id,
            title: s.title,
            description: s.description,
            subject: s.subject,
            duration_minutes: s.duration_minutes,
            price: s.price,
            scheduled_at: s.scheduled_at,
            max_students: s.max_students,
            is_active: s.is_active,
            created_at: s.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MentorResponse {
    pub id: Uuid,
    pub display_name: String,
    pub preferred_language: String,
}

impl From<MentorCard> for MentorResponse {
    fn from(card: MentorCard) -> Self {
        Self {
            id: card.mentor_id,
            display_name: card.display_name,
            preferred_language: card.preferred_language,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookableSessionResponse {
    #[serde(flatten)]
    pub session: SessionResponse,
    pub mentor: MentorResponse,
}

impl From<BookableSession> for BookableSessionResponse {
    fn from(b: BookableSession) -> Self {
        Self {
            session: b.session.into(),
            mentor: b.mentor.into(),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionBookingResponse {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_email: Option<String>,
    pub status: String,
    pub booked_date: NaiveDate,
    pub booked_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

impl From<SessionBooking> for SessionBookingResponse {
    fn from(sb: SessionBooking) -> Self {
        Self {
            id: sb.booking.id,
            student_id: sb.booking.student_id,
            student_email: sb.student_email,
            status: sb.booking.status.as_str().to_string(),
            booked_date: sb.booking.booked_date,
            booked_time: sb.booking.booked_time,
            created_at: sb.booking.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnedSessionResponse {
    #[serde(flatten)]
    pub session: SessionResponse,
    pub bookings: Vec<SessionBookingResponse>,
}

impl From<OwnedSession> for OwnedSessionResponse {
    fn from(o: OwnedSession) -> Self {
        Self {
            session: o.session.into(),
            bookings: o.bookings.into_iter().map(Into::into).collect(),
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Publish a new session. Mentors only.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
        (status = 400, description = "Invalid session data", body = crate::error::ErrorBody),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not a mentor", body = crate::error::ErrorBody)
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    AppJson(req): AppJson<CreateSessionRequest>,
) -> HttpResult<(StatusCode, Json<SessionResponse>)> {
    let session = state.registry.create_session(&principal, req.into()).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// The caller's own sessions with their bookings, newest first. Mentors only.
#[utoipa::path(
    get,
    path = "/sessions/mine",
    responses(
        (status = 200, description = "Owned sessions", body = [OwnedSessionResponse]),
        (status = 403, description = "Caller is not a mentor", body = crate::error::ErrorBody)
    )
)]
pub async fn list_owned_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> HttpResult<Json<Vec<OwnedSessionResponse>>> {
    let owned = state.registry.list_owned_sessions(&principal).await?;
    Ok(Json(owned.into_iter().map(Into::into).collect()))
}

/// Every bookable session, soonest first.
#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "Bookable sessions", body = [BookableSessionResponse]),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorBody)
    )
)]
pub async fn list_bookable_sessions_handler(
    State(state): State<Arc<AppState>>,
) -> HttpResult<Json<Vec<BookableSessionResponse>>> {
    let bookable = state.registry.list_bookable().await?;
    Ok(Json(bookable.into_iter().map(Into::into).collect()))
}

/// Activate or deactivate one of the caller's sessions. Mentors only.
#[utoipa::path(
    patch,
    path = "/sessions/{id}/active",
    request_body = SetActiveRequest,
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session updated", body = SessionResponse),
        (status = 403, description = "Caller does not own the session", body = crate::error::ErrorBody),
        (status = 404, description = "Session not found", body = crate::error::ErrorBody)
    )
)]
pub async fn set_session_active_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    AppPath(session_id): AppPath<Uuid>,
    AppJson(req): AppJson<SetActiveRequest>,
) -> HttpResult<Json<SessionResponse>> {
    let session = state
        .registry
        .set_session_active(&principal, session_id, req.is_active)
        .await?;
    Ok(Json(session.into()))
}
