//! User profile endpoints.

use axum::{extract::State, Json};

use nudge_core::{ContextStore, UserProfile};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /profile
pub async fn get_profile(State(state): State<AppState>) -> ApiResult<Json<UserProfile>> {
    state
        .store
        .user_profile()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No user profile saved yet"))
}

/// Create or replace the profile.
/// PUT /profile
pub async fn put_profile(
    State(state): State<AppState>,
    Json(profile): Json<UserProfile>,
) -> ApiResult<Json<UserProfile>> {
    if profile.name.trim().is_empty() {
        return Err(ApiError::validation("Profile name must not be empty"));
    }
    state.store.save_user_profile(&profile)?;
    Ok(Json(profile))
}
