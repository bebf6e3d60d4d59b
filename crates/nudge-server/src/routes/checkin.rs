//! Manual check-in endpoint.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use nudge_core::{Message, SkipReason, TriggerCategory, TriggerOutcome};

use crate::error::ApiResult;
use crate::state::AppState;

/// Optional body for a manual check-in.
#[derive(Debug, Default, Deserialize)]
pub struct CheckinRequest {
    /// Trigger category; omitted means pick by time of day.
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckinResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
}

impl From<TriggerOutcome> for CheckinResponse {
    fn from(outcome: TriggerOutcome) -> Self {
        match outcome {
            TriggerOutcome::Sent(message) => Self {
                status: "sent",
                message: Some(message),
                reason: None,
            },
            TriggerOutcome::Skipped(reason) => Self {
                status: "skipped",
                message: None,
                reason: Some(reason),
            },
        }
    }
}

/// Fire a check-in now.
/// POST /trigger/checkin
pub async fn trigger_checkin(
    State(state): State<AppState>,
    body: Option<Json<CheckinRequest>>,
) -> ApiResult<Json<CheckinResponse>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    let outcome = match request.category {
        Some(ref name) => {
            let category = TriggerCategory::parse(name)?;
            state.scheduler.trigger_now(category).await?
        }
        None => state.engine.trigger_checkin().await?,
    };

    Ok(Json(outcome.into()))
}
