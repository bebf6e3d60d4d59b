//! Context assembly: a bounded, time-ordered view of history plus goals and profile.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::clock::Clock;
use crate::traits::ContextStore;
use crate::types::{Goal, Message, Sender, UserProfile};

/// Default number of recent messages fed into a prompt.
pub const DEFAULT_MAX_HISTORY: usize = 10;

/// Everything the composer needs to know about the user right now.
#[derive(Debug, Clone, Serialize)]
pub struct AssembledContext {
    pub profile: Option<UserProfile>,
    /// Active goals, highest priority first.
    pub active_goals: Vec<Goal>,
    /// Most recent messages, oldest first.
    pub recent_messages: Vec<Message>,
    pub assembled_at: DateTime<Utc>,
}

impl AssembledContext {
    /// An empty context, used when nothing could be loaded.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            profile: None,
            active_goals: Vec::new(),
            recent_messages: Vec::new(),
            assembled_at: now,
        }
    }

    /// The user's name, if a profile exists and has one.
    pub fn user_name(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .map(|p| p.name.trim())
            .filter(|name| !name.is_empty())
    }

    /// The last `n` messages as `Speaker: text` lines, oldest first.
    pub fn transcript(&self, n: usize) -> Vec<String> {
        let skip = self.recent_messages.len().saturating_sub(n);
        self.recent_messages
            .iter()
            .skip(skip)
            .map(|m| {
                let speaker = match m.sender {
                    Sender::User => "User",
                    Sender::Assistant => "Assistant",
                    Sender::SystemScraper => "Note",
                };
                format!("{}: {}", speaker, m.content)
            })
            .collect()
    }
}

/// Builds [`AssembledContext`] values from a store.
#[derive(Clone)]
pub struct ContextAssembler {
    store: Arc<dyn ContextStore>,
    clock: Arc<dyn Clock>,
}

impl ContextAssembler {
    pub fn new(store: Arc<dyn ContextStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Load up to `max_history` recent messages, active goals and the profile.
    ///
    /// Never fails: a failed sub-fetch is logged and contributes nothing.
    /// Message timestamps later than now are clamped to now before sorting.
    pub async fn assemble(&self, max_history: usize) -> AssembledContext {
        let now = self.clock.now();

        let (messages, goals, profile) = tokio::join!(
            self.store.recent_messages(max_history),
            self.store.active_goals(),
            self.store.user_profile(),
        );

        let mut recent_messages = messages.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load recent messages");
            Vec::new()
        });
        let active_goals = goals.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load active goals");
            Vec::new()
        });
        let profile = profile.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load user profile");
            None
        });

        for message in &mut recent_messages {
            if message.timestamp > now {
                warn!(message_id = %message.id, timestamp = %message.timestamp, "Clamping future message timestamp");
                message.timestamp = now;
            }
        }
        // Store order is newest first; reverse before the stable sort so ties
        // keep their arrival order.
        recent_messages.reverse();
        recent_messages.sort_by_key(|m| m.timestamp);
        let excess = recent_messages.len().saturating_sub(max_history);
        recent_messages.drain(..excess);

        AssembledContext {
            profile,
            active_goals,
            recent_messages,
            assembled_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::error::{NudgeError, NudgeResult};
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl ContextStore for BrokenStore {
        async fn append_message(&self, _message: &Message) -> NudgeResult<()> {
            Err(NudgeError::store("disk full"))
        }
        async fn recent_messages(&self, _limit: usize) -> NudgeResult<Vec<Message>> {
            Err(NudgeError::store("disk full"))
        }
        async fn active_goals(&self) -> NudgeResult<Vec<Goal>> {
            Err(NudgeError::store("disk full"))
        }
        async fn user_profile(&self) -> NudgeResult<Option<UserProfile>> {
            Err(NudgeError::store("disk full"))
        }
        async fn last_user_message_time(&self) -> NudgeResult<Option<DateTime<Utc>>> {
            Err(NudgeError::store("disk full"))
        }
    }

    #[tokio::test]
    async fn test_failing_store_yields_empty_context() {
        let assembler = ContextAssembler::new(Arc::new(BrokenStore), Arc::new(SystemClock));
        let ctx = assembler.assemble(10).await;
        assert!(ctx.profile.is_none());
        assert!(ctx.active_goals.is_empty());
        assert!(ctx.recent_messages.is_empty());
    }

    #[test]
    fn test_transcript_takes_last_lines() {
        let now = Utc::now();
        let mut ctx = AssembledContext::empty(now);
        ctx.recent_messages = vec![
            Message::from_user("one", now, "console"),
            Message::reply("two", now, "console"),
            Message::from_user("three", now, "console"),
        ];
        assert_eq!(ctx.transcript(2), vec!["Assistant: two", "User: three"]);
        assert_eq!(ctx.transcript(10).len(), 3);
    }

    #[test]
    fn test_user_name_ignores_blank() {
        let mut ctx = AssembledContext::empty(Utc::now());
        assert_eq!(ctx.user_name(), None);
        ctx.profile = Some(UserProfile::new("  "));
        assert_eq!(ctx.user_name(), None);
        ctx.profile = Some(UserProfile::new("Sam"));
        assert_eq!(ctx.user_name(), Some("Sam"));
    }
}
