//! Silence bands and per-streak escalation.
//!
//! Silence is never stored: it is recomputed on every check as the time since
//! the newest user message. A *streak* is the silence that follows one
//! particular user message; it ends when a newer user message shows up.
//! Within a streak each band is announced at most once, and only an
//! escalation to a strictly higher band produces another message.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Band boundaries in hours.
pub const SHORT_SILENCE_HOURS: i64 = 24;
pub const MEDIUM_SILENCE_HOURS: i64 = 48;
pub const LONG_SILENCE_HOURS: i64 = 72;

/// Severity tier of detected user silence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SilenceBand {
    /// 24-48 hours.
    Short,
    /// 48-72 hours.
    Medium,
    /// 72+ hours.
    Long,
}

impl SilenceBand {
    /// Highest band crossed after `elapsed` silence, if any.
    ///
    /// Negative durations (a user timestamp in the future) count as zero.
    pub fn from_elapsed(elapsed: Duration) -> Option<Self> {
        let hours = elapsed.num_seconds().max(0) as f64 / 3600.0;
        Self::from_hours(hours)
    }

    /// Highest band crossed after `hours` of silence, if any.
    pub fn from_hours(hours: f64) -> Option<Self> {
        if hours >= LONG_SILENCE_HOURS as f64 {
            Some(SilenceBand::Long)
        } else if hours >= MEDIUM_SILENCE_HOURS as f64 {
            Some(SilenceBand::Medium)
        } else if hours >= SHORT_SILENCE_HOURS as f64 {
            Some(SilenceBand::Short)
        } else {
            None
        }
    }
}

/// Outcome of one silence evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SilenceDecision {
    /// The user has never written; nothing to measure.
    NoHistory,
    /// Silence is below the first band.
    Quiet { hours: f64 },
    /// The current band was already announced in this streak.
    AlreadyNotified { band: SilenceBand, hours: f64 },
    /// A new, higher band was crossed and should be announced.
    Notify {
        band: SilenceBand,
        hours: f64,
        /// Timestamp of the user message that started the streak.
        streak_start: DateTime<Utc>,
    },
}

#[derive(Debug, Default)]
struct Streak {
    started_at: Option<DateTime<Utc>>,
    notified: Option<SilenceBand>,
}

/// Tracks which band was last announced for the current silence streak.
#[derive(Debug, Default)]
pub struct SilenceTracker {
    streak: Mutex<Streak>,
}

impl SilenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a silence message is due.
    ///
    /// Does not mark anything as notified; call [`record_notified`] once the
    /// message was actually delivered.
    ///
    /// [`record_notified`]: SilenceTracker::record_notified
    pub fn evaluate(&self, last_user_message: Option<DateTime<Utc>>, now: DateTime<Utc>) -> SilenceDecision {
        let Some(last) = last_user_message else {
            return SilenceDecision::NoHistory;
        };

        let mut streak = self.streak.lock().unwrap_or_else(PoisonError::into_inner);
        if streak.started_at != Some(last) {
            *streak = Streak {
                started_at: Some(last),
                notified: None,
            };
        }

        let hours = (now - last).num_seconds().max(0) as f64 / 3600.0;
        match SilenceBand::from_hours(hours) {
            None => SilenceDecision::Quiet { hours },
            Some(band) if streak.notified.map_or(false, |done| band <= done) => {
                SilenceDecision::AlreadyNotified { band, hours }
            }
            Some(band) => SilenceDecision::Notify {
                band,
                hours,
                streak_start: last,
            },
        }
    }

    /// Mark `band` as announced for the streak that started at `streak_start`.
    ///
    /// Ignored when a newer user message has already started a new streak.
    pub fn record_notified(&self, streak_start: DateTime<Utc>, band: SilenceBand) {
        let mut streak = self.streak.lock().unwrap_or_else(PoisonError::into_inner);
        if streak.started_at == Some(streak_start) {
            streak.notified = Some(streak.notified.map_or(band, |done| done.max(band)));
        }
    }

    /// Band announced so far in the current streak.
    pub fn notified_band(&self) -> Option<SilenceBand> {
        self.streak.lock().unwrap_or_else(PoisonError::into_inner).notified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(SilenceBand::from_hours(0.0), None);
        assert_eq!(SilenceBand::from_hours(23.99), None);
        assert_eq!(SilenceBand::from_hours(24.0), Some(SilenceBand::Short));
        assert_eq!(SilenceBand::from_hours(47.9), Some(SilenceBand::Short));
        assert_eq!(SilenceBand::from_hours(48.0), Some(SilenceBand::Medium));
        assert_eq!(SilenceBand::from_hours(71.9), Some(SilenceBand::Medium));
        assert_eq!(SilenceBand::from_hours(72.0), Some(SilenceBand::Long));
        assert_eq!(SilenceBand::from_hours(500.0), Some(SilenceBand::Long));
    }

    #[test]
    fn test_band_for_every_hour() {
        for h in 0..200i64 {
            let expected = match h {
                0..=23 => None,
                24..=47 => Some(SilenceBand::Short),
                48..=71 => Some(SilenceBand::Medium),
                _ => Some(SilenceBand::Long),
            };
            assert_eq!(SilenceBand::from_elapsed(Duration::hours(h)), expected, "h = {h}");
        }
    }

    #[test]
    fn test_future_timestamp_counts_as_zero() {
        assert_eq!(SilenceBand::from_elapsed(Duration::hours(-100)), None);

        let tracker = SilenceTracker::new();
        let now = Utc::now();
        let decision = tracker.evaluate(Some(now + Duration::days(3)), now);
        assert_eq!(decision, SilenceDecision::Quiet { hours: 0.0 });
    }

    #[test]
    fn test_no_history_is_noop() {
        let tracker = SilenceTracker::new();
        assert_eq!(tracker.evaluate(None, Utc::now()), SilenceDecision::NoHistory);
    }

    #[test]
    fn test_one_message_per_band_per_streak() {
        let tracker = SilenceTracker::new();
        let last = Utc::now();
        let mut sent = Vec::new();

        // Simulate a check every 4 hours for 5 days.
        for step in 0..=30 {
            let now = last + Duration::hours(4 * step);
            if let SilenceDecision::Notify { band, streak_start, .. } = tracker.evaluate(Some(last), now) {
                tracker.record_notified(streak_start, band);
                sent.push(band);
            }
        }

        assert_eq!(sent, vec![SilenceBand::Short, SilenceBand::Medium, SilenceBand::Long]);
    }

    #[test]
    fn test_undelivered_band_is_retried() {
        let tracker = SilenceTracker::new();
        let last = Utc::now();
        let now = last + Duration::hours(30);

        assert!(matches!(tracker.evaluate(Some(last), now), SilenceDecision::Notify { .. }));
        // Not recorded, so the next check still wants to notify.
        assert!(matches!(
            tracker.evaluate(Some(last), now + Duration::hours(4)),
            SilenceDecision::Notify { band: SilenceBand::Short, .. }
        ));
    }

    #[test]
    fn test_new_user_message_resets_streak() {
        let tracker = SilenceTracker::new();
        let first = Utc::now();
        let now = first + Duration::hours(50);
        if let SilenceDecision::Notify { band, streak_start, .. } = tracker.evaluate(Some(first), now) {
            tracker.record_notified(streak_start, band);
        }
        assert_eq!(tracker.notified_band(), Some(SilenceBand::Medium));

        let second = now + Duration::hours(1);
        let later = second + Duration::hours(25);
        assert!(matches!(
            tracker.evaluate(Some(second), later),
            SilenceDecision::Notify { band: SilenceBand::Short, .. }
        ));
        assert_eq!(tracker.notified_band(), None);
    }

    #[test]
    fn test_stale_record_is_ignored() {
        let tracker = SilenceTracker::new();
        let first = Utc::now();
        let second = first + Duration::hours(2);
        tracker.evaluate(Some(second), second + Duration::hours(1));

        tracker.record_notified(first, SilenceBand::Long);
        assert_eq!(tracker.notified_band(), None);
    }
}
