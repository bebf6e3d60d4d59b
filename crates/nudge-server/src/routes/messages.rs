//! Conversation endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use nudge_core::{ContextStore, Message};

use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 500;

/// Request body for an inbound message.
#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub text: String,
    /// Defaults to `api`.
    pub channel: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostMessageResponse {
    pub reply: Message,
}

/// Handle an inbound user message and return the reply that was sent.
/// POST /messages
pub async fn post_message(
    State(state): State<AppState>,
    Json(request): Json<PostMessageRequest>,
) -> ApiResult<Json<PostMessageResponse>> {
    let channel = request.channel.as_deref().unwrap_or("api");
    let reply = state.engine.handle_incoming(&request.text, channel).await?;
    Ok(Json(PostMessageResponse { reply }))
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<Message>,
    pub count: usize,
}

/// Recent messages, newest first.
/// GET /messages
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<ListMessagesQuery>,
) -> ApiResult<Json<ListMessagesResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let messages = state.store.recent_messages(limit).await?;
    Ok(Json(ListMessagesResponse {
        count: messages.len(),
        messages,
    }))
}
