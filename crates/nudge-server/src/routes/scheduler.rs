//! Scheduler status endpoint.

use axum::{extract::State, Json};

use nudge_core::SchedulerStatus;

use crate::state::AppState;

/// GET /scheduler
pub async fn scheduler_status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(state.scheduler.status().await)
}
