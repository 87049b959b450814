//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, plus the liveness probe.

use axum::Json;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::error::{ErrorBody, ErrorDetail};
use crate::web::{auth, bookings, profile, sessions};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        profile::upsert_profile_handler,
        sessions::create_session_handler,
        sessions::list_owned_sessions_handler,
        sessions::list_bookable_sessions_handler,
        sessions::set_session_active_handler,
        bookings::create_booking_handler,
        bookings::list_my_bookings_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorBody,
            ErrorDetail,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::IdentityResponse,
            auth::AuthResponse,
            profile::ProfileRequest,
            profile::ProfileResponse,
            sessions::CreateSessionRequest,
            sessions::SetActiveRequest,
            sessions::SessionResponse,
            sessions::MentorResponse,
            sessions::BookableSessionResponse,
            sessions::SessionBookingResponse,
            sessions::OwnedSessionResponse,
            bookings::CreateBookingRequest,
            bookings::BookingResponse,
            bookings::StudentBookingResponse,
        )
    ),
    tags(
        (name = "Mentorship API", description = "Session publishing and booking for the mentorship marketplace.")
    )
)]
pub struct ApiDoc;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
