//! services/api/src/web/profile.rs
//!
//! Stores the public display fields shown next to a mentor's sessions.

use axum::{extract::State, Extension, Json};
use mentorship_core::{CoreError, PortError, Principal, Profile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::error::HttpResult;
use crate::web::extract::AppJson;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub display_name: String,
    pub preferred_language: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub display_name: String,
    pub preferred_language: String,
    pub has_profile: bool,
}

/// PUT /profile - Complete or update the caller's profile
#[utoipa::path(
    put,
    path = "/profile",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Profile stored", body = ProfileResponse),
        (status = 400, description = "Missing fields", body = crate::error::ErrorBody),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorBody)
    )
)]
pub async fn upsert_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    AppJson(req): AppJson<ProfileRequest>,
) -> HttpResult<Json<ProfileResponse>> {
    let display_name = req.display_name.trim();
    let preferred_language = req.preferred_language.trim();
    if display_name.is_empty() || preferred_language.is_empty() {
        return Err(CoreError::Validation(
            "displayName and preferredLanguage are required".to_string(),
        )
        .into());
    }

    let profile = Profile {
        display_name: display_name.to_string(),
        preferred_language: preferred_language.to_string(),
    };
    state
        .db
        .upsert_profile(principal.id, &profile)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => CoreError::Unauthenticated,
            other => {
                error!("Failed to store profile: {}", other);
                CoreError::Internal("failed to store profile".to_string())
            }
        })?;
    info!(identity_id = %principal.id, "Profile stored");

    Ok(Json(ProfileResponse {
        display_name: profile.display_name,
        preferred_language: profile.preferred_language,
        has_profile: true,
    }))
}
