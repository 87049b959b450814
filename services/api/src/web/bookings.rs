//! services/api/src/web/bookings.rs
//!
//! REST handlers for student bookings.

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mentorship_core::{Booking, BookingRequest, CoreError, Principal, StudentBooking};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpResult;
use crate::web::extract::AppJson;
use crate::web::sessions::{MentorResponse, SessionResponse};
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub session_id: String,
    /// `YYYY-MM-DD`
    pub booked_date: String,
    /// `HH:MM`
    pub booked_time: String,
}

impl TryFrom<CreateBookingRequest> for BookingRequest {
    type Error = CoreError;

    fn try_from(req: CreateBookingRequest) -> Result<Self, Self::Error> {
        let session_id = Uuid::parse_str(req.session_id.trim())
            .map_err(|_| CoreError::Validation("sessionId must be a UUID".to_string()))?;
        Ok(BookingRequest {
            session_id,
            booked_date: req.booked_date,
            booked_time: req.booked_time,
        })
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_id: Uuid,
    pub status: String,
    pub booked_date: NaiveDate,
    pub booked_time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            session_id: b.session_id,
            student_id: b.student_id,
            status: b.status.as_str().to_string(),
            booked_date: b.booked_date,
            booked_time: b.booked_time,
            created_at: b.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentBookingResponse {
    #[serde(flatten)]
    pub booking: BookingResponse,
    pub session: SessionResponse,
    pub mentor: MentorResponse,
}

impl From<StudentBooking> for StudentBookingResponse {
    fn from(sb: StudentBooking) -> Self {
        Self {
            booking: sb.booking.into(),
            session: sb.session.into(),
            mentor: sb.mentor.into(),
        }
    }
}

/// Book a place on a session. Students only.
#[utoipa::path(
    post,
    path = "/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingResponse),
        (status = 400, description = "Malformed booking input", body = crate::error::ErrorBody),
        (status = 403, description = "Caller is not a student", body = crate::error::ErrorBody),
        (status = 404, description = "Session not found", body = crate::error::ErrorBody),
        (status = 409, description = "Session unavailable, expired, full, or already booked", body = crate::error::ErrorBody)
    )
)]
pub async fn create_booking_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    AppJson(req): AppJson<CreateBookingRequest>,
) -> HttpResult<(StatusCode, Json<BookingResponse>)> {
    let request = BookingRequest::try_from(req)?;
    let booking = state.bookings.book(&principal, request).await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

/// The caller's bookings, newest first. Students only.
#[utoipa::path(
    get,
    path = "/bookings/mine",
    responses(
        (status = 200, description = "Student bookings", body = [StudentBookingResponse]),
        (status = 403, description = "Caller is not a student", body = crate::error::ErrorBody)
    )
)]
pub async fn list_my_bookings_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> HttpResult<Json<Vec<StudentBookingResponse>>> {
    let bookings = state.bookings.list_my_bookings(&principal).await?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}
