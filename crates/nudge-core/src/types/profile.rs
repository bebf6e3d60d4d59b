//! The single user profile.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::triggers::TriggerCategory;

/// Preferences stored on the profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Trigger categories the user wants. `None` means all configured triggers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_triggers: Option<Vec<TriggerCategory>>,
    /// IANA timezone name the user lives in, informational only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Preferences {
    /// Whether the given trigger category is allowed to fire.
    pub fn allows(&self, category: TriggerCategory) -> bool {
        self.enabled_triggers
            .as_ref()
            .map_or(true, |enabled| enabled.contains(&category))
    }
}

/// The user this assistant talks to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    /// Phone number or other contact handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default)]
    pub preferences: Preferences,
    /// Social network name -> handle.
    #[serde(default)]
    pub social_handles: BTreeMap<String, String>,
}

impl UserProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    pub fn with_enabled_triggers(mut self, triggers: Vec<TriggerCategory>) -> Self {
        self.preferences.enabled_triggers = Some(triggers);
        self
    }
}
