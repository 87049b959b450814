pub mod auth;
pub mod bookings;
pub mod extract;
pub mod middleware;
pub mod profile;
pub mod rest;
pub mod sessions;
pub mod state;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use rest::ApiDoc;
use state::AppState;

pub use middleware::{require_auth, require_mentor, require_student};

/// Builds the complete application router: API routes, guards, CORS and Swagger UI.
pub fn router(app_state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = app_state
        .config
        .cors_allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ALLOWED_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Any authenticated identity
    let authenticated_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route("/profile", put(profile::upsert_profile_handler))
        .route("/sessions", get(sessions::list_bookable_sessions_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Mentors only
    let mentor_routes = Router::new()
        .route("/sessions", post(sessions::create_session_handler))
        .route("/sessions/mine", get(sessions::list_owned_sessions_handler))
        .route(
            "/sessions/{id}/active",
            patch(sessions::set_session_active_handler),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_mentor,
        ));

    // Students only
    let student_routes = Router::new()
        .route("/bookings", post(bookings::create_booking_handler))
        .route("/bookings/mine", get(bookings::list_my_bookings_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_student,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .merge(mentor_routes)
        .merge(student_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    Ok(Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())))
}
