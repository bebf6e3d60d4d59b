//! Wall-clock abstraction.
//!
//! Everything that needs "now" takes a [`Clock`], so scheduler tests can run
//! on tokio's paused time instead of the system clock.

use chrono::{DateTime, Utc};

/// Source of the current UTC time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall time derived from tokio's monotonic clock.
///
/// Reports `anchor + elapsed`, where elapsed is measured with
/// [`tokio::time::Instant`]. Under `start_paused` tests the time only moves
/// when the runtime auto-advances or `tokio::time::advance` is called.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    anchor: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl TokioClock {
    pub fn starting_at(anchor: DateTime<Utc>) -> Self {
        Self {
            anchor,
            started: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.started.elapsed();
        self.anchor + chrono::Duration::from_std(elapsed).unwrap_or(chrono::Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_clock_follows_paused_time() {
        let anchor = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let clock = TokioClock::starting_at(anchor);
        assert_eq!(clock.now(), anchor);

        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(clock.now(), anchor + chrono::Duration::hours(1));
    }
}
