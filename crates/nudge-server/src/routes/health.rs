//! Service info, health and stats endpoints.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use nudge_core::{Mode, StoreStats};

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub endpoints: Vec<&'static str>,
}

/// Service info.
/// GET /
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        service: "nudge",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        endpoints: vec![
            "GET /health",
            "GET /stats",
            "POST /trigger/checkin",
            "GET /messages",
            "POST /messages",
            "GET /mode",
            "PUT /mode",
            "GET /goals",
            "POST /goals",
            "PATCH /goals/:id",
            "GET /profile",
            "PUT /profile",
            "GET /scheduler",
        ],
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub scheduler_running: bool,
    pub llm_configured: bool,
    pub version: String,
}

/// Health check endpoint.
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.store.stats() {
        Ok(stats) => stats.health,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the store");
            "disconnected".to_string()
        }
    };
    let status = if database == "healthy" { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        database,
        scheduler_running: state.scheduler.is_running().await,
        llm_configured: state.engine.has_llm(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub store: StoreStats,
    pub mode: Mode,
    pub transport: String,
    pub scheduler_running: bool,
    pub started_at: DateTime<Utc>,
}

/// Store counters and runtime state.
/// GET /stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    Ok(Json(StatsResponse {
        store: state.store.stats()?,
        mode: state.engine.current_mode(),
        transport: state.engine.transport_name().to_string(),
        scheduler_running: state.scheduler.is_running().await,
        started_at: state.started_at,
    }))
}
