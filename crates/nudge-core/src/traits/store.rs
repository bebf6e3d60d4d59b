//! Data-access trait consumed by the engine.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::NudgeResult;
use crate::types::{Goal, Message, UserProfile};

/// Narrow read/append interface over the conversation log, goals and profile.
///
/// Implementations must make `append_message` a single atomic insert; the
/// engine relies on that instead of its own locking.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Append one message to the log.
    async fn append_message(&self, message: &Message) -> NudgeResult<()>;

    /// Up to `limit` most recent messages by timestamp, newest first.
    async fn recent_messages(&self, limit: usize) -> NudgeResult<Vec<Message>>;

    /// Goals whose status is `active`, highest priority first.
    async fn active_goals(&self) -> NudgeResult<Vec<Goal>>;

    /// The singleton profile, if one was saved.
    async fn user_profile(&self) -> NudgeResult<Option<UserProfile>>;

    /// Timestamp of the newest message sent by the user.
    async fn last_user_message_time(&self) -> NudgeResult<Option<DateTime<Utc>>>;
}
