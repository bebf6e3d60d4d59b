//! The engagement engine: guards, composition, delivery and recording.
//!
//! Proactive path: guard → assemble → compose → send → append.
//! Reactive path: append → assemble → compose → send → append.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use strum::{Display, IntoStaticStr};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::compose::{ComposeInput, FallbackResponder, ResponseComposer, DEFAULT_COMPLETION_TIMEOUT};
use crate::context::{AssembledContext, ContextAssembler, DEFAULT_MAX_HISTORY};
use crate::error::{ErrorCode, NudgeError, NudgeResult};
use crate::mode::{Mode, ModeSelector};
use crate::traits::{ContextStore, Llm, Transport};
use crate::triggers::{SilenceDecision, SilenceTracker, TriggerCategory, TriggerEvent};
use crate::types::Message;

/// Hourly check-ins are skipped when the user wrote within this many hours.
pub const HOURLY_RECENT_ACTIVITY_HOURS: i64 = 2;

/// Why a firing produced no message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// The profile's preferences exclude this category.
    DisabledByProfile,
    /// Local time is inside the hourly quiet window.
    QuietHours,
    /// The user wrote recently.
    RecentlyActive,
    /// The user has never written.
    NoHistory,
    /// Silence has not reached the first band.
    BelowThreshold,
    /// The current band was already announced in this streak.
    AlreadyNotified,
}

/// Result of one trigger firing.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    Sent(Message),
    Skipped(SkipReason),
}

impl TriggerOutcome {
    pub fn message(&self) -> Option<&Message> {
        match self {
            TriggerOutcome::Sent(message) => Some(message),
            TriggerOutcome::Skipped(_) => None,
        }
    }
}

/// Whether `local_hour` falls in the hourly quiet window (23:00 through 07:59).
pub fn is_quiet_hour(local_hour: u32) -> bool {
    local_hour >= 23 || local_hour <= 7
}

/// Category chosen for an operator check-in at `local_hour`.
pub fn checkin_category_for_hour(local_hour: u32) -> TriggerCategory {
    if local_hour < 12 {
        TriggerCategory::Morning
    } else if local_hour < 18 {
        TriggerCategory::Hourly
    } else {
        TriggerCategory::Evening
    }
}

/// Owns the collaborators and per-instance state shared by the scheduler and
/// the inbound path.
pub struct Engine {
    store: Arc<dyn ContextStore>,
    transport: Arc<dyn Transport>,
    assembler: ContextAssembler,
    composer: ResponseComposer,
    modes: Arc<ModeSelector>,
    silence: SilenceTracker,
    // Serializes silence evaluation with the delivery it leads to.
    silence_gate: tokio::sync::Mutex<()>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    max_history: usize,
}

impl Engine {
    pub fn builder(store: Arc<dyn ContextStore>, transport: Arc<dyn Transport>) -> EngineBuilder {
        EngineBuilder::new(store, transport)
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn store(&self) -> Arc<dyn ContextStore> {
        self.store.clone()
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn has_llm(&self) -> bool {
        self.composer.has_llm()
    }

    pub fn current_mode(&self) -> Mode {
        self.modes.current()
    }

    /// Switch personality mode. Unknown names leave the mode unchanged.
    pub fn set_mode(&self, name: &str) -> NudgeResult<Mode> {
        self.modes.set_mode(name)
    }

    /// Assemble context with the configured history size.
    pub async fn assemble(&self) -> AssembledContext {
        self.assembler.assemble(self.max_history).await
    }

    /// Run one trigger: guards, compose, send, append.
    ///
    /// `manual` only marks the event; guards apply either way. Send errors are
    /// returned; a failed append after a successful send is logged.
    pub async fn fire(&self, category: TriggerCategory, manual: bool) -> NudgeResult<TriggerOutcome> {
        let now = self.clock.now();

        match self.store.user_profile().await {
            Ok(Some(profile)) if !profile.preferences.allows(category) => {
                debug!(category = %category, "Trigger disabled by profile preferences");
                return Ok(TriggerOutcome::Skipped(SkipReason::DisabledByProfile));
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to load profile for trigger gate"),
        }

        let mut event = TriggerEvent::new(category, now);
        if manual {
            event = event.manual();
        }

        match category {
            TriggerCategory::Hourly => {
                if let Some(reason) = self.hourly_guard(now).await? {
                    debug!(reason = %reason, "Skipping hourly check-in");
                    return Ok(TriggerOutcome::Skipped(reason));
                }
                self.deliver(event).await.map(TriggerOutcome::Sent)
            }
            TriggerCategory::Silence => self.fire_silence(event).await,
            _ => self.deliver(event).await.map(TriggerOutcome::Sent),
        }
    }

    /// Operator check-in: morning before noon, hourly until 18:00, evening after.
    pub async fn trigger_checkin(&self) -> NudgeResult<TriggerOutcome> {
        let hour = self.clock.now().with_timezone(&self.timezone).hour();
        let category = checkin_category_for_hour(hour);
        info!(category = %category, local_hour = hour, "Manual check-in");
        self.fire(category, true).await
    }

    /// Handle inbound text and return the reply that was sent.
    ///
    /// Store failures are logged and handling continues; a transport failure
    /// is returned to the caller.
    pub async fn handle_incoming(&self, text: &str, channel: &str) -> NudgeResult<Message> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NudgeError::Validation {
                message: "message text must not be empty".to_string(),
                code: ErrorCode::ValEmptyMessage,
                suggestion: None,
            });
        }

        let received = Message::from_user(text, self.clock.now(), channel);
        if let Err(e) = self.store.append_message(&received).await {
            warn!(error = %e, "Failed to store inbound message");
        }

        let context = self.assemble().await;
        let reply_text = self
            .composer
            .compose(&ComposeInput::Reply(text.to_string()), &context)
            .await;

        self.transport.send(&reply_text).await?;

        let reply = Message::reply(reply_text, self.clock.now(), channel);
        if let Err(e) = self.store.append_message(&reply).await {
            warn!(error = %e, "Failed to store reply");
        }
        info!(channel = %channel, "Replied to inbound message");
        Ok(reply)
    }

    async fn hourly_guard(&self, now: DateTime<Utc>) -> NudgeResult<Option<SkipReason>> {
        if is_quiet_hour(now.with_timezone(&self.timezone).hour()) {
            return Ok(Some(SkipReason::QuietHours));
        }
        let last = self.store.last_user_message_time().await?;
        if last.map_or(false, |t| now - t < ChronoDuration::hours(HOURLY_RECENT_ACTIVITY_HOURS)) {
            return Ok(Some(SkipReason::RecentlyActive));
        }
        Ok(None)
    }

    async fn fire_silence(&self, event: TriggerEvent) -> NudgeResult<TriggerOutcome> {
        let _gate = self.silence_gate.lock().await;

        let last = self.store.last_user_message_time().await?;
        match self.silence.evaluate(last, event.fired_at) {
            SilenceDecision::NoHistory => Ok(TriggerOutcome::Skipped(SkipReason::NoHistory)),
            SilenceDecision::Quiet { hours } => {
                debug!(hours, "Silence below threshold");
                Ok(TriggerOutcome::Skipped(SkipReason::BelowThreshold))
            }
            SilenceDecision::AlreadyNotified { band, hours } => {
                debug!(band = %band, hours, "Silence band already announced");
                Ok(TriggerOutcome::Skipped(SkipReason::AlreadyNotified))
            }
            SilenceDecision::Notify {
                band,
                hours,
                streak_start,
            } => {
                info!(band = %band, hours = hours.round(), "Silence detected, checking in");
                let message = self.deliver(event.with_silence(band, hours)).await?;
                self.silence.record_notified(streak_start, band);
                Ok(TriggerOutcome::Sent(message))
            }
        }
    }

    async fn deliver(&self, event: TriggerEvent) -> NudgeResult<Message> {
        let category = event.category;
        let context = self.assemble().await;
        let text = self.composer.compose(&ComposeInput::Trigger(event), &context).await;

        self.transport.send(&text).await?;

        let message = Message::proactive(category, text, self.clock.now());
        if let Err(e) = self.store.append_message(&message).await {
            warn!(category = %category, error = %e, "Sent proactive message but failed to store it");
        }
        info!(category = %category, transport = self.transport.name(), "Proactive message sent");
        Ok(message)
    }
}

/// Builder for [`Engine`].
pub struct EngineBuilder {
    store: Arc<dyn ContextStore>,
    transport: Arc<dyn Transport>,
    llm: Option<Arc<dyn Llm>>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    mode: Mode,
    max_history: usize,
    completion_timeout: Duration,
    fallback: Option<FallbackResponder>,
    user_name: Option<String>,
}

impl EngineBuilder {
    fn new(store: Arc<dyn ContextStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            store,
            transport,
            llm: None,
            clock: Arc::new(SystemClock),
            timezone: chrono_tz::UTC,
            mode: Mode::default(),
            max_history: DEFAULT_MAX_HISTORY,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
            fallback: None,
            user_name: None,
        }
    }

    pub fn llm(mut self, llm: Arc<dyn Llm>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn maybe_llm(mut self, llm: Option<Arc<dyn Llm>>) -> Self {
        self.llm = llm;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    /// Use a specific fallback responder, e.g. one with a fixed seed.
    pub fn fallback(mut self, fallback: FallbackResponder) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }

    pub fn build(self) -> Engine {
        let modes = Arc::new(ModeSelector::new(self.mode));
        let mut composer = ResponseComposer::new(self.llm, modes.clone())
            .with_timeout(self.completion_timeout)
            .with_timezone(self.timezone);
        if let Some(fallback) = self.fallback {
            composer = composer.with_fallback(fallback);
        }
        if let Some(name) = self.user_name {
            composer = composer.with_user_name(name);
        }

        Engine {
            assembler: ContextAssembler::new(self.store.clone(), self.clock.clone()),
            store: self.store,
            transport: self.transport,
            composer,
            modes,
            silence: SilenceTracker::new(),
            silence_gate: tokio::sync::Mutex::new(()),
            clock: self.clock,
            timezone: self.timezone,
            max_history: self.max_history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_hours() {
        let quiet: Vec<u32> = (0..24).filter(|h| is_quiet_hour(*h)).collect();
        assert_eq!(quiet, vec![0, 1, 2, 3, 4, 5, 6, 7, 23]);
    }

    #[test]
    fn test_checkin_category_by_hour() {
        assert_eq!(checkin_category_for_hour(0), TriggerCategory::Morning);
        assert_eq!(checkin_category_for_hour(11), TriggerCategory::Morning);
        assert_eq!(checkin_category_for_hour(12), TriggerCategory::Hourly);
        assert_eq!(checkin_category_for_hour(17), TriggerCategory::Hourly);
        assert_eq!(checkin_category_for_hour(18), TriggerCategory::Evening);
        assert_eq!(checkin_category_for_hour(23), TriggerCategory::Evening);
    }

    #[test]
    fn test_skip_reason_names() {
        assert_eq!(SkipReason::DisabledByProfile.to_string(), "disabled_by_profile");
        assert_eq!(SkipReason::QuietHours.to_string(), "quiet_hours");
    }
}
