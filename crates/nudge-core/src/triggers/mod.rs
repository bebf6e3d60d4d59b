//! Trigger categories, definitions and events.

mod cadence;
mod silence;

pub use cadence::Cadence;
pub use silence::{
    SilenceBand, SilenceDecision, SilenceTracker, LONG_SILENCE_HOURS, MEDIUM_SILENCE_HOURS,
    SHORT_SILENCE_HOURS,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::{ErrorCode, NudgeError, NudgeResult};

/// The kinds of proactive outreach.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TriggerCategory {
    Morning,
    Evening,
    Hourly,
    Silence,
    Weekly,
}

impl TriggerCategory {
    pub fn all_names() -> Vec<&'static str> {
        Self::iter().map(|c| c.into()).collect()
    }

    /// Parse a category name, reporting unknown names as validation errors.
    pub fn parse(name: &str) -> NudgeResult<Self> {
        name.trim().parse().map_err(|_| {
            NudgeError::validation_with_suggestion(
                ErrorCode::ValUnknownCategory,
                format!("unknown trigger category '{}'", name),
                format!("Expected one of: {}", Self::all_names().join(", ")),
            )
        })
    }
}

fn default_enabled() -> bool {
    true
}

/// A trigger as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDefinition {
    /// Category name: morning, evening, hourly, silence or weekly.
    pub name: String,
    /// Cadence string, see [`Cadence`].
    pub cadence: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl TriggerDefinition {
    pub fn new(name: impl Into<String>, cadence: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cadence: cadence.into(),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Built-in trigger set: morning 09:00, evening 21:00, hourly (off),
    /// silence every 4h, weekly review Sunday 20:00.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("morning", "daily 09:00"),
            Self::new("evening", "daily 21:00"),
            Self::new("hourly", "every 1h").disabled(),
            Self::new("silence", "every 4h"),
            Self::new("weekly", "weekly sun 20:00"),
        ]
    }

    /// Validate the name and cadence.
    ///
    /// Both checks run even for disabled triggers so a typo never hides until
    /// someone flips the switch. Errors are configuration errors.
    pub fn parse(&self) -> NudgeResult<ScheduledTrigger> {
        let category = TriggerCategory::parse(&self.name)
            .map_err(|e| NudgeError::configuration(format!("trigger '{}': {}", self.name, e)))?;
        let cadence: Cadence = self
            .cadence
            .parse()
            .map_err(|e: NudgeError| NudgeError::configuration(format!("trigger '{}': {}", self.name, e)))?;
        Ok(ScheduledTrigger {
            category,
            cadence,
            enabled: self.enabled,
        })
    }
}

/// A validated trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTrigger {
    pub category: TriggerCategory,
    pub cadence: Cadence,
    pub enabled: bool,
}

/// One firing of a trigger, handed to the composer.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEvent {
    pub category: TriggerCategory,
    pub fired_at: DateTime<Utc>,
    /// Set for silence firings.
    pub silence_band: Option<SilenceBand>,
    /// Hours since the last user message, when known.
    pub silence_hours: Option<f64>,
    /// True when an operator asked for it instead of the cadence.
    pub manual: bool,
}

impl TriggerEvent {
    pub fn new(category: TriggerCategory, fired_at: DateTime<Utc>) -> Self {
        Self {
            category,
            fired_at,
            silence_band: None,
            silence_hours: None,
            manual: false,
        }
    }

    pub fn with_silence(mut self, band: SilenceBand, hours: f64) -> Self {
        self.silence_band = Some(band);
        self.silence_hours = Some(hours);
        self
    }

    pub fn manual(mut self) -> Self {
        self.manual = true;
        self
    }

    /// One-line description used as the triggering input in prompts.
    pub fn describe(&self) -> String {
        match (self.category, self.silence_band) {
            (TriggerCategory::Morning, _) => {
                "It's morning. Send a short check-in asking what would make today a win.".to_string()
            }
            (TriggerCategory::Evening, _) => {
                "It's evening. Invite a short reflection on how the day went.".to_string()
            }
            (TriggerCategory::Hourly, _) => {
                "Send a brief mid-day check-in about focus and progress.".to_string()
            }
            (TriggerCategory::Weekly, _) => {
                "The week is ending. Ask for the biggest win, the hardest challenge and next week's focus."
                    .to_string()
            }
            (TriggerCategory::Silence, band) => {
                let hours = self.silence_hours.map(|h| h.round() as i64).unwrap_or(0);
                let tone = match band {
                    Some(SilenceBand::Long) => "gentle, no pressure, just letting them know you're here",
                    Some(SilenceBand::Medium) => "caring, asking whether everything is okay",
                    _ => "light and curious about how things went",
                };
                format!(
                    "The user has been quiet for about {} hours. Reach out; keep it {}.",
                    hours, tone
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!(TriggerCategory::parse("morning").unwrap(), TriggerCategory::Morning);
        assert_eq!(TriggerCategory::parse(" Weekly ").unwrap(), TriggerCategory::Weekly);
        let err = TriggerCategory::parse("midnight").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValUnknownCategory);
    }

    #[test]
    fn test_defaults_parse() {
        let parsed: Vec<_> = TriggerDefinition::defaults()
            .iter()
            .map(|d| d.parse().unwrap())
            .collect();
        assert_eq!(parsed.len(), 5);
        let hourly = parsed.iter().find(|t| t.category == TriggerCategory::Hourly).unwrap();
        assert!(!hourly.enabled);
    }

    #[test]
    fn test_definition_errors_are_configuration_errors() {
        let err = TriggerDefinition::new("morning", "9am").parse().unwrap_err();
        assert!(matches!(err, NudgeError::Configuration(_)));

        let err = TriggerDefinition::new("lunch", "12:00").parse().unwrap_err();
        assert!(matches!(err, NudgeError::Configuration(_)));

        // Disabled definitions are still validated.
        let err = TriggerDefinition::new("hourly", "every").disabled().parse().unwrap_err();
        assert!(matches!(err, NudgeError::Configuration(_)));

        // Oversized intervals fail at load instead of inside the scheduler.
        let err = TriggerDefinition::new("silence", "every 3000000000000h").parse().unwrap_err();
        assert!(matches!(err, NudgeError::Configuration(_)));
    }

    #[test]
    fn test_definition_deserialize_defaults_enabled() {
        let def: TriggerDefinition = toml::from_str("name = \"weekly\"\ncadence = \"weekly sun 20:00\"").unwrap();
        assert!(def.enabled);
    }

    #[test]
    fn test_silence_event_description() {
        let event = TriggerEvent::new(TriggerCategory::Silence, Utc::now()).with_silence(SilenceBand::Medium, 49.6);
        let text = event.describe();
        assert!(text.contains("50 hours"));
        assert!(text.contains("okay"));
    }
}
