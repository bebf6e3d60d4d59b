//! Personality mode endpoints.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use nudge_core::Mode;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ModeResponse {
    pub mode: Mode,
    pub available: Vec<&'static str>,
}

impl ModeResponse {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            available: Mode::all_names(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetModeRequest {
    pub mode: String,
}

/// GET /mode
pub async fn get_mode(State(state): State<AppState>) -> Json<ModeResponse> {
    Json(ModeResponse::new(state.engine.current_mode()))
}

/// Switch mode. Unknown names are rejected and leave the mode unchanged.
/// PUT /mode
pub async fn set_mode(
    State(state): State<AppState>,
    Json(request): Json<SetModeRequest>,
) -> ApiResult<Json<ModeResponse>> {
    let mode = state.engine.set_mode(&request.mode)?;
    Ok(Json(ModeResponse::new(mode)))
}
