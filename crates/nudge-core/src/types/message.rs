//! Conversation log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::triggers::TriggerCategory;

/// Who produced a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Sender {
    User,
    Assistant,
    SystemScraper,
}

/// What kind of message this is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MessageKind {
    Text,
    ProactiveMorning,
    ProactiveEvening,
    ProactiveHourly,
    ProactiveSilence,
    ProactiveWeekly,
    ScrapeResult,
}

impl MessageKind {
    /// The kind recorded for a proactive message of the given category.
    pub fn for_trigger(category: TriggerCategory) -> Self {
        match category {
            TriggerCategory::Morning => Self::ProactiveMorning,
            TriggerCategory::Evening => Self::ProactiveEvening,
            TriggerCategory::Hourly => Self::ProactiveHourly,
            TriggerCategory::Silence => Self::ProactiveSilence,
            TriggerCategory::Weekly => Self::ProactiveWeekly,
        }
    }

    /// Whether the message was sent without the user asking.
    pub fn is_proactive(&self) -> bool {
        !matches!(self, Self::Text | Self::ScrapeResult)
    }
}

/// Channel tag used for messages produced by the scheduler.
pub const SCHEDULER_CHANNEL: &str = "scheduler";

/// An immutable entry in the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub kind: MessageKind,
    pub channel: String,
}

impl Message {
    /// Create a message with a fresh id.
    pub fn new(
        sender: Sender,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
        kind: MessageKind,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            content: content.into(),
            timestamp,
            kind,
            channel: channel.into(),
        }
    }

    /// A plain text message from the user.
    pub fn from_user(
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
        channel: impl Into<String>,
    ) -> Self {
        Self::new(Sender::User, content, timestamp, MessageKind::Text, channel)
    }

    /// A plain text reply from the assistant.
    pub fn reply(
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
        channel: impl Into<String>,
    ) -> Self {
        Self::new(Sender::Assistant, content, timestamp, MessageKind::Text, channel)
    }

    /// A proactive message produced by a trigger.
    pub fn proactive(
        category: TriggerCategory,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(
            Sender::Assistant,
            content,
            timestamp,
            MessageKind::for_trigger(category),
            SCHEDULER_CHANNEL,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_kind_tags_are_kebab_case() {
        assert_eq!(MessageKind::ProactiveMorning.to_string(), "proactive-morning");
        assert_eq!(
            MessageKind::from_str("proactive-silence").unwrap(),
            MessageKind::ProactiveSilence
        );
        assert_eq!(Sender::SystemScraper.to_string(), "system-scraper");
    }

    #[test]
    fn test_proactive_message() {
        let msg = Message::proactive(TriggerCategory::Weekly, "Week review", Utc::now());
        assert_eq!(msg.sender, Sender::Assistant);
        assert_eq!(msg.kind, MessageKind::ProactiveWeekly);
        assert_eq!(msg.channel, SCHEDULER_CHANNEL);
        assert!(msg.kind.is_proactive());
        assert!(!MessageKind::Text.is_proactive());
    }
}
