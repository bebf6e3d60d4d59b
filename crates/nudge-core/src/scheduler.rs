//! Trigger scheduler: one task per enabled trigger, each sleeping until its
//! next occurrence.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::engine::{Engine, TriggerOutcome};
use crate::error::{NudgeError, NudgeResult};
use crate::triggers::{ScheduledTrigger, TriggerCategory, TriggerDefinition};

/// One registered trigger as reported by [`TriggerScheduler::status`].
#[derive(Debug, Clone, Serialize)]
pub struct TriggerStatus {
    pub category: TriggerCategory,
    pub cadence: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_run: Option<DateTime<Utc>>,
}

/// Scheduler snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub timezone: String,
    pub triggers: Vec<TriggerStatus>,
}

struct Running {
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

/// Fires triggers on their cadence through an [`Engine`].
pub struct TriggerScheduler {
    engine: Arc<Engine>,
    triggers: Vec<ScheduledTrigger>,
    running: Mutex<Option<Running>>,
}

impl TriggerScheduler {
    /// Validate and register trigger definitions.
    ///
    /// Unknown names, malformed cadences and duplicate names are
    /// configuration errors. Disabled triggers are kept for status reporting
    /// but never scheduled.
    pub fn configure(engine: Arc<Engine>, definitions: &[TriggerDefinition]) -> NudgeResult<Self> {
        let mut seen = HashSet::new();
        let mut triggers = Vec::with_capacity(definitions.len());
        for definition in definitions {
            let trigger = definition.parse()?;
            if !seen.insert(trigger.category) {
                return Err(NudgeError::configuration(format!(
                    "trigger '{}' is defined more than once",
                    trigger.category
                )));
            }
            triggers.push(trigger);
        }

        for trigger in triggers.iter().filter(|t| t.enabled) {
            info!(category = %trigger.category, cadence = %trigger.cadence, "Trigger registered");
        }

        Ok(Self {
            engine,
            triggers,
            running: Mutex::new(None),
        })
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn triggers(&self) -> &[ScheduledTrigger] {
        &self.triggers
    }

    /// Start one task per enabled trigger. No-op when already running.
    pub async fn start(&self) {
        let mut running = self.running.lock().await;
        if running.is_some() {
            debug!("Scheduler already running");
            return;
        }

        let token = CancellationToken::new();
        let tasks: Vec<_> = self
            .triggers
            .iter()
            .filter(|t| t.enabled)
            .map(|trigger| {
                tokio::spawn(run_trigger(
                    self.engine.clone(),
                    *trigger,
                    token.clone(),
                ))
            })
            .collect();

        info!(triggers = tasks.len(), "Scheduler started");
        *running = Some(Running { token, tasks });
    }

    /// Cancel all pending waits and wait for in-flight firings to finish.
    ///
    /// Once this returns no trigger fires until `start` is called again.
    pub async fn stop(&self) {
        let Some(Running { token, tasks }) = self.running.lock().await.take() else {
            return;
        };
        token.cancel();
        for result in join_all(tasks).await {
            if let Err(e) = result {
                warn!(error = %e, "Trigger task ended abnormally");
            }
        }
        info!("Scheduler stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Fire `category` immediately, through the same guards as a scheduled firing.
    pub async fn trigger_now(&self, category: TriggerCategory) -> NudgeResult<TriggerOutcome> {
        info!(category = %category, "Manual trigger");
        self.engine.fire(category, true).await
    }

    /// Running flag plus each trigger's next occurrence.
    pub async fn status(&self) -> SchedulerStatus {
        let running = self.is_running().await;
        let now = self.engine.clock().now();
        let tz = self.engine.timezone();
        SchedulerStatus {
            running,
            timezone: tz.name().to_string(),
            triggers: self
                .triggers
                .iter()
                .map(|t| TriggerStatus {
                    category: t.category,
                    cadence: t.cadence.to_string(),
                    enabled: t.enabled,
                    next_run: t.enabled.then(|| t.cadence.next_after(now, tz)),
                })
                .collect(),
        }
    }
}

impl Drop for TriggerScheduler {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            running.token.cancel();
        }
    }
}

async fn run_trigger(engine: Arc<Engine>, trigger: ScheduledTrigger, token: CancellationToken) {
    let clock: Arc<dyn Clock> = engine.clock();
    let tz: Tz = engine.timezone();
    let mut cursor = clock.now();

    loop {
        let next = trigger.cadence.next_after(cursor, tz);
        let wait = (next - clock.now()).to_std().unwrap_or(Duration::ZERO);
        debug!(category = %trigger.category, next = %next, "Waiting for next occurrence");

        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }
        if token.is_cancelled() {
            break;
        }

        // Run the handler in its own task so a panic cannot take the loop down.
        let handler = {
            let engine = engine.clone();
            let category = trigger.category;
            tokio::spawn(async move { engine.fire(category, false).await })
        };
        match handler.await {
            Ok(Ok(TriggerOutcome::Sent(_))) => {}
            Ok(Ok(TriggerOutcome::Skipped(reason))) => {
                debug!(category = %trigger.category, reason = %reason, "Trigger skipped");
            }
            Ok(Err(e)) => {
                error!(category = %trigger.category, code = e.code().as_str(), error = %e, "Trigger failed");
            }
            Err(e) => {
                error!(category = %trigger.category, error = %e, "Trigger handler panicked");
            }
        }

        cursor = next.max(clock.now());
    }

    debug!(category = %trigger.category, "Trigger task exiting");
}
