//! Personality modes.

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use tracing::info;

use crate::error::{ErrorCode, NudgeError, NudgeResult};

/// Conversational stance of the assistant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    #[default]
    Friend,
    Mentor,
    Tutor,
    Accountability,
}

impl Mode {
    pub fn all_names() -> Vec<&'static str> {
        Self::iter().map(|m| m.into()).collect()
    }

    /// Parse a mode name. Unknown names are validation errors.
    pub fn parse(name: &str) -> NudgeResult<Self> {
        name.trim().to_lowercase().parse().map_err(|_| {
            NudgeError::validation_with_suggestion(
                ErrorCode::ValUnknownMode,
                format!("unknown mode '{}'", name),
                format!("Expected one of: {}", Self::all_names().join(", ")),
            )
        })
    }
}

/// Static guidance appended to prompts for a mode.
pub fn guidance_for(mode: Mode) -> &'static str {
    match mode {
        Mode::Friend => {
            "FRIEND MODE GUIDELINES:\n\
             - Be emotionally supportive and understanding\n\
             - Share in celebrations and disappointments\n\
             - Offer encouragement and perspective\n\
             - Sometimes just listen without trying to fix"
        }
        Mode::Mentor => {
            "MENTOR MODE GUIDELINES:\n\
             - Focus on long-term growth and wisdom\n\
             - Share insights and perspectives\n\
             - Ask thought-provoking questions\n\
             - Help connect current actions to future outcomes"
        }
        Mode::Tutor => {
            "TUTOR MODE GUIDELINES:\n\
             - Break down complex topics into simple steps\n\
             - Provide explanations and examples\n\
             - Quiz and test understanding\n\
             - Encourage learning and skill development"
        }
        Mode::Accountability => {
            "ACCOUNTABILITY MODE GUIDELINES:\n\
             - Be direct about progress and commitments\n\
             - Point out patterns and inconsistencies\n\
             - Push harder when needed\n\
             - Don't accept vague answers about progress"
        }
    }
}

/// Holds the current mode for one engine instance.
#[derive(Debug, Default)]
pub struct ModeSelector {
    current: RwLock<Mode>,
}

impl ModeSelector {
    pub fn new(initial: Mode) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    pub fn current(&self) -> Mode {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch to the named mode. On error the current mode is unchanged.
    pub fn set_mode(&self, name: &str) -> NudgeResult<Mode> {
        let mode = Mode::parse(name)?;
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *current, mode);
        if previous != mode {
            info!(from = %previous, to = %mode, "Mode switched");
        }
        Ok(mode)
    }

    /// Guidance for the current mode.
    pub fn guidance(&self) -> &'static str {
        guidance_for(self.current())
    }
}
