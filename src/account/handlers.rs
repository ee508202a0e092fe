use axum::{extract::State, Extension, Json};
use tracing::{info, instrument};

use super::types::{ProfileResponse, UpdateProfileRequest};
use crate::session::types::{SessionClaims, UserResponse};
use crate::shared::{AppError, AppState};

/// HTTP handler for reading the authenticated user's profile
///
/// GET /api/v1/profile
#[instrument(name = "get_profile", skip(state, claims))]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state.profile_service.get_profile(&claims.sub).await?;

    Ok(Json(profile))
}

/// HTTP handler for updating the authenticated user's profile
///
/// PUT /api/v1/profile
/// Accepts a partial payload; omitted fields keep their current values
#[instrument(name = "update_profile", skip(state, claims, request))]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let updated = state
        .profile_service
        .update_profile(&claims.sub, request)
        .await?;

    info!(user_id = %updated.id, "Profile update completed");
    Ok(Json(updated))
}

/// HTTP handler for deleting the authenticated user's profile
///
/// DELETE /api/v1/profile
/// Returns the removed record; outstanding tokens stay un-revoked
#[instrument(name = "delete_profile", skip(state, claims))]
pub async fn delete_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<UserResponse>, AppError> {
    let deleted = state.profile_service.delete_profile(&claims.sub).await?;

    info!(user_id = %deleted.id, "Profile deletion completed");
    Ok(Json(deleted))
}
