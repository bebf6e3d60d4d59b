//! Configuration system for nudge.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;

use crate::compose::{DEFAULT_COMPLETION_TIMEOUT, DEFAULT_USER_NAME};
use crate::context::DEFAULT_MAX_HISTORY;
use crate::error::{NudgeError, NudgeResult};
use crate::mode::Mode;
use crate::traits::LlmConfig;
use crate::triggers::{Cadence, TriggerDefinition};

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAI,
    Anthropic,
}

impl std::str::FromStr for LlmProvider {
    type Err = NudgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAI),
            "anthropic" => Ok(LlmProvider::Anthropic),
            other => Err(NudgeError::UnsupportedProvider {
                provider: other.to_string(),
            }),
        }
    }
}

/// Provider configuration with type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Provider type.
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: LlmConfig,
}

impl LlmProviderConfig {
    pub fn new(provider: LlmProvider) -> Self {
        let model = match provider {
            LlmProvider::OpenAI => "gpt-3.5-turbo",
            LlmProvider::Anthropic => "claude-3-haiku-20240307",
        };
        Self {
            provider,
            config: LlmConfig {
                model: model.to_string(),
                ..Default::default()
            },
        }
    }
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self::new(LlmProvider::OpenAI)
    }
}

fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".nudge"))
        .unwrap_or_else(|| PathBuf::from(".nudge"))
        .join("nudge.db")
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name used in prompts when no profile is stored.
    pub user_name: String,
    /// IANA timezone triggers are evaluated in.
    pub timezone: String,
    /// Personality mode at startup.
    pub mode: String,
    /// Recent messages fed into context.
    pub max_history: usize,
    /// Bound on one completion request, in milliseconds.
    pub completion_timeout_ms: u64,
    /// Trigger definitions.
    pub triggers: Vec<TriggerDefinition>,
    /// Completion provider. `None` means local fallback only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmProviderConfig>,
    /// SQLite database path.
    pub db_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            user_name: DEFAULT_USER_NAME.to_string(),
            timezone: "UTC".to_string(),
            mode: Mode::default().to_string(),
            max_history: DEFAULT_MAX_HISTORY,
            completion_timeout_ms: DEFAULT_COMPLETION_TIMEOUT.as_millis() as u64,
            triggers: TriggerDefinition::defaults(),
            llm: None,
            db_path: default_db_path(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> NudgeResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => toml::from_str(&content).map_err(|e| NudgeError::Configuration(e.to_string())),
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| NudgeError::Configuration(e.to_string()))
            }
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&content).map_err(|e| NudgeError::Configuration(e.to_string()))
            }
            _ => Err(NudgeError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from the process environment.
    ///
    /// Starts from `NUDGE_CONFIG` when set, otherwise from defaults, then
    /// applies the individual variables on top.
    pub fn from_env() -> NudgeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> NudgeResult<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut config = match var("NUDGE_CONFIG") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(name) = var("USER_NAME") {
            config.user_name = name;
        }
        if let Some(tz) = var("NUDGE_TIMEZONE") {
            config.timezone = tz;
        }
        if let Some(mode) = var("NUDGE_MODE") {
            config.mode = mode;
        }
        if let Some(limit) = var("NUDGE_HISTORY_LIMIT") {
            config.max_history = limit.parse().map_err(|_| {
                NudgeError::configuration(format!("NUDGE_HISTORY_LIMIT must be a number, got '{}'", limit))
            })?;
        }
        if let Some(path) = var("NUDGE_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        // Triggers
        if let Some(time) = var("MORNING_CHECKIN_TIME") {
            config.set_trigger_cadence("morning", daily_cadence(&time));
        }
        if let Some(time) = var("EVENING_CHECKIN_TIME") {
            config.set_trigger_cadence("evening", daily_cadence(&time));
        }
        if let Some(flag) = var("HOURLY_CHECKINS_ENABLED") {
            let enabled = matches!(flag.to_lowercase().as_str(), "true" | "1" | "yes" | "on");
            config.set_trigger_enabled("hourly", enabled);
        }
        if let Some(time) = var("WEEKLY_REVIEW_TIME") {
            let cadence = if time.to_lowercase().starts_with("weekly") {
                time
            } else {
                format!("weekly sun {}", time)
            };
            config.set_trigger_cadence("weekly", cadence);
        }
        if let Some(interval) = var("SILENCE_CHECK_INTERVAL") {
            let cadence = if interval.to_lowercase().starts_with("every") {
                interval
            } else {
                format!("every {}", interval)
            };
            config.set_trigger_cadence("silence", cadence);
        }

        // LLM
        let openai_key = var("OPENAI_API_KEY");
        let anthropic_key = var("ANTHROPIC_API_KEY");
        let provider = match var("NUDGE_LLM_PROVIDER") {
            Some(name) => Some(name.parse::<LlmProvider>()?),
            None if openai_key.is_some() => Some(LlmProvider::OpenAI),
            None if anthropic_key.is_some() => Some(LlmProvider::Anthropic),
            None => config.llm.as_ref().map(|l| l.provider),
        };
        if let Some(provider) = provider {
            let mut llm = match config.llm.take() {
                Some(existing) if existing.provider == provider => existing,
                _ => LlmProviderConfig::new(provider),
            };
            let key = match provider {
                LlmProvider::OpenAI => openai_key,
                LlmProvider::Anthropic => anthropic_key,
            };
            if key.is_some() {
                llm.config.api_key = key;
            }
            if let Some(model) = var("AI_MODEL") {
                llm.config.model = model;
            }
            config.llm = Some(llm);
        }

        Ok(config)
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Check every field that can be wrong. Errors are configuration errors.
    pub fn validate(&self) -> NudgeResult<()> {
        self.tz()?;
        self.initial_mode()?;
        if self.completion_timeout_ms == 0 {
            return Err(NudgeError::configuration("completion_timeout_ms must be positive"));
        }
        for definition in &self.triggers {
            definition.parse()?;
        }
        Ok(())
    }

    /// Parsed timezone.
    pub fn tz(&self) -> NudgeResult<Tz> {
        self.timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| NudgeError::configuration(format!("unknown timezone '{}'", self.timezone)))
    }

    /// Parsed startup mode.
    pub fn initial_mode(&self) -> NudgeResult<Mode> {
        Mode::parse(&self.mode).map_err(|e| NudgeError::configuration(e.to_string()))
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_millis(self.completion_timeout_ms)
    }

    fn set_trigger_cadence(&mut self, name: &str, cadence: String) {
        match self.triggers.iter_mut().find(|t| t.name.eq_ignore_ascii_case(name)) {
            Some(existing) => existing.cadence = cadence,
            None => self.triggers.push(TriggerDefinition::new(name, cadence)),
        }
    }

    fn set_trigger_enabled(&mut self, name: &str, enabled: bool) {
        if let Some(existing) = self.triggers.iter_mut().find(|t| t.name.eq_ignore_ascii_case(name)) {
            existing.enabled = enabled;
        }
    }
}

/// `09:00` becomes `daily 09:00`; anything already carrying a keyword is kept.
fn daily_cadence(value: &str) -> String {
    match value.parse::<Cadence>() {
        Ok(Cadence::Daily { .. }) if !value.to_lowercase().starts_with("daily") => {
            format!("daily {}", value)
        }
        _ => value.to_string(),
    }
}

/// Builder for EngineConfig.
#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn user_name(mut self, name: impl Into<String>) -> Self {
        self.config.user_name = name.into();
        self
    }

    pub fn timezone(mut self, tz: impl Into<String>) -> Self {
        self.config.timezone = tz.into();
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode.to_string();
        self
    }

    pub fn max_history(mut self, max_history: usize) -> Self {
        self.config.max_history = max_history;
        self
    }

    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.config.completion_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Replace the whole trigger list.
    pub fn triggers(mut self, triggers: Vec<TriggerDefinition>) -> Self {
        self.config.triggers = triggers;
        self
    }

    pub fn llm(mut self, config: LlmProviderConfig) -> Self {
        self.config.llm = Some(config);
        self
    }

    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn cadence_of<'a>(config: &'a EngineConfig, name: &str) -> &'a TriggerDefinition {
        config.triggers.iter().find(|t| t.name == name).unwrap()
    }

    #[test]
    fn test_defaults_validate() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.max_history, 10);
        assert_eq!(config.completion_timeout(), Duration::from_secs(8));
        assert!(config.db_path.ends_with(".nudge/nudge.db"));
        assert!(config.llm.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("MORNING_CHECKIN_TIME", "07:30"),
            ("EVENING_CHECKIN_TIME", "daily 22:15"),
            ("HOURLY_CHECKINS_ENABLED", "true"),
            ("WEEKLY_REVIEW_TIME", "19:00"),
            ("SILENCE_CHECK_INTERVAL", "6h"),
            ("NUDGE_TIMEZONE", "Europe/Berlin"),
            ("NUDGE_MODE", "mentor"),
            ("USER_NAME", "Sam"),
            ("NUDGE_HISTORY_LIMIT", "20"),
        ]))
        .unwrap();

        config.validate().unwrap();
        assert_eq!(cadence_of(&config, "morning").cadence, "daily 07:30");
        assert_eq!(cadence_of(&config, "evening").cadence, "daily 22:15");
        assert!(cadence_of(&config, "hourly").enabled);
        assert_eq!(cadence_of(&config, "weekly").cadence, "weekly sun 19:00");
        assert_eq!(cadence_of(&config, "silence").cadence, "every 6h");
        assert_eq!(config.tz().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(config.initial_mode().unwrap(), Mode::Mentor);
        assert_eq!(config.user_name, "Sam");
        assert_eq!(config.max_history, 20);
    }

    #[test]
    fn test_llm_from_env() {
        let config = EngineConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        let llm = config.llm.unwrap();
        assert_eq!(llm.provider, LlmProvider::OpenAI);
        assert_eq!(llm.config.model, "gpt-3.5-turbo");
        assert_eq!(llm.config.api_key.as_deref(), Some("sk-test"));

        let config = EngineConfig::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "key"),
            ("AI_MODEL", "claude-3-5-sonnet-latest"),
        ]))
        .unwrap();
        let llm = config.llm.unwrap();
        assert_eq!(llm.provider, LlmProvider::Anthropic);
        assert_eq!(llm.config.model, "claude-3-5-sonnet-latest");

        assert!(EngineConfig::from_lookup(lookup(&[("NUDGE_LLM_PROVIDER", "bard")])).is_err());
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let bad_cadence = EngineConfig::from_lookup(lookup(&[("MORNING_CHECKIN_TIME", "9am")])).unwrap();
        assert!(matches!(bad_cadence.validate(), Err(NudgeError::Configuration(_))));

        let bad_tz = EngineConfig::builder().timezone("Mars/Olympus").build();
        assert!(matches!(bad_tz.validate(), Err(NudgeError::Configuration(_))));

        let bad_mode = EngineConfig {
            mode: "coach".to_string(),
            ..Default::default()
        };
        assert!(matches!(bad_mode.validate(), Err(NudgeError::Configuration(_))));

        assert!(EngineConfig::from_lookup(lookup(&[("NUDGE_HISTORY_LIMIT", "lots")])).is_err());
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nudge.toml");
        std::fs::write(
            &path,
            r#"
            user_name = "Alex"
            timezone = "America/New_York"
            mode = "accountability"

            [[triggers]]
            name = "morning"
            cadence = "daily 08:00"

            [[triggers]]
            name = "silence"
            cadence = "every 2h"
            enabled = false

            [llm]
            provider = "anthropic"
            model = "claude-3-haiku-20240307"
            "#,
        )
        .unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        config.validate().unwrap();
        assert_eq!(config.user_name, "Alex");
        assert_eq!(config.triggers.len(), 2);
        assert!(!cadence_of(&config, "silence").enabled);
        assert_eq!(config.llm.unwrap().provider, LlmProvider::Anthropic);
        assert_eq!(config.max_history, 10);

        let env_config = EngineConfig::from_lookup(lookup(&[
            ("NUDGE_CONFIG", path.to_str().unwrap()),
            ("MORNING_CHECKIN_TIME", "06:45"),
        ]))
        .unwrap();
        assert_eq!(cadence_of(&env_config, "morning").cadence, "daily 06:45");
        assert_eq!(env_config.user_name, "Alex");
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nudge.ini");
        std::fs::write(&path, "x=1").unwrap();
        assert!(matches!(EngineConfig::from_file(&path), Err(NudgeError::Configuration(_))));
    }
}
