//! Goal management endpoints.

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use nudge_core::{Goal, GoalStatus, NewGoal};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

fn parse_status(raw: &str) -> ApiResult<GoalStatus> {
    GoalStatus::from_str(&raw.trim().to_lowercase()).map_err(|_| {
        ApiError::validation(format!(
            "Unknown goal status '{}'. Use active, completed, paused or cancelled.",
            raw
        ))
    })
}

#[derive(Debug, Deserialize)]
pub struct ListGoalsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GoalsResponse {
    pub goals: Vec<Goal>,
    pub count: usize,
}

/// GET /goals
pub async fn list_goals(
    State(state): State<AppState>,
    Query(query): Query<ListGoalsQuery>,
) -> ApiResult<Json<GoalsResponse>> {
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let goals = state.store.list_goals(status)?;
    Ok(Json(GoalsResponse {
        count: goals.len(),
        goals,
    }))
}

/// POST /goals
pub async fn add_goal(
    State(state): State<AppState>,
    Json(goal): Json<NewGoal>,
) -> ApiResult<(StatusCode, Json<Goal>)> {
    let goal = state.store.add_goal(&goal)?;
    tracing::info!(goal_id = goal.id, title = %goal.title, "Goal added");
    Ok((StatusCode::CREATED, Json(goal)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateGoalRequest {
    pub status: String,
}

/// PATCH /goals/:id
pub async fn update_goal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateGoalRequest>,
) -> ApiResult<Json<Goal>> {
    let status = parse_status(&request.status)?;
    let goal = state.store.update_goal_status(id, status)?;
    Ok(Json(goal))
}
