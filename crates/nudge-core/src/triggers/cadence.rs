//! Next-occurrence calculation for trigger cadences.
//!
//! Three cadence kinds are supported, written as short strings in config:
//!
//! - `09:00` or `daily 09:00`: every day at a local time of day
//! - `weekly sun 20:00`: once a week at a local day and time
//! - `every 4h` / `every 30m` / `every 45s`: fixed interval, at most a week
//!
//! Fixed intervals that divide a day evenly are aligned to local midnight, so
//! `every 4h` wakes at 00:00, 04:00, 08:00 and so on, and `every 1h` wakes on
//! the hour. Other intervals are aligned to the Unix epoch.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{
    DateTime, Datelike, Days, LocalResult, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;

use crate::error::{ErrorCode, NudgeError};

const SECONDS_PER_DAY: u64 = 86_400;

/// Longest accepted fixed interval.
pub const MAX_INTERVAL_SECS: u64 = 7 * SECONDS_PER_DAY;

/// When a trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Every day at a local time.
    Daily { at: NaiveTime },
    /// Every week on a local weekday and time.
    Weekly { day: Weekday, at: NaiveTime },
    /// Fixed interval.
    Every { interval: Duration },
}

impl Cadence {
    pub fn daily(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(|at| Self::Daily { at })
    }

    pub fn weekly(day: Weekday, hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(|at| Self::Weekly { day, at })
    }

    pub fn every(interval: Duration) -> Self {
        Self::Every { interval }
    }

    /// The first occurrence strictly after `after`, evaluated in `tz`.
    pub fn next_after(&self, after: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
        match *self {
            Cadence::Daily { at } => next_matching_day(after, tz, at, |_| true),
            Cadence::Weekly { day, at } => next_matching_day(after, tz, at, |d| d == day),
            Cadence::Every { interval } => next_interval(after, tz, interval),
        }
    }
}

/// Scan forward day by day for the first local `date at time` after `after`.
fn next_matching_day(
    after: DateTime<Utc>,
    tz: Tz,
    at: NaiveTime,
    day_matches: impl Fn(Weekday) -> bool,
) -> DateTime<Utc> {
    let start = after.with_timezone(&tz).date_naive();
    // Two weeks covers a weekly cadence even when a DST gap swallows one slot.
    for offset in 0..15 {
        let Some(date) = start.checked_add_days(Days::new(offset)) else {
            break;
        };
        if !day_matches(date.weekday()) {
            continue;
        }
        if let Some(candidate) = resolve_local(tz, date.and_time(at)) {
            if candidate > after {
                return candidate;
            }
        }
    }
    after + chrono::Duration::days(1)
}

fn next_interval(after: DateTime<Utc>, tz: Tz, interval: Duration) -> DateTime<Utc> {
    // Parsing caps intervals; `Cadence::every` does not, so clamp here too.
    let step = interval.as_secs().clamp(1, MAX_INTERVAL_SECS);
    let fallback = || {
        TimeDelta::try_seconds(step as i64)
            .and_then(|delta| after.checked_add_signed(delta))
            .unwrap_or(after)
    };

    if SECONDS_PER_DAY % step == 0 {
        let local_midnight = after
            .with_timezone(&tz)
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| resolve_local(tz, midnight));
        if let Some(midnight) = local_midnight {
            let elapsed = (after - midnight).num_seconds().max(0) as u64;
            let offset = (elapsed / step + 1) * step;
            return TimeDelta::try_seconds(offset as i64)
                .and_then(|delta| midnight.checked_add_signed(delta))
                .unwrap_or_else(fallback);
        }
    }

    let now = after.timestamp().max(0) as u64;
    let next = (now / step + 1) * step;
    DateTime::from_timestamp(next as i64, 0).unwrap_or_else(fallback)
}

/// Map a local wall-clock time to UTC. Ambiguous times take the earlier
/// instant; times inside a DST gap move forward by an hour.
fn resolve_local(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => Some(t.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => tz
            .from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest()
            .map(|t| t.with_timezone(&Utc)),
    }
}

fn invalid(input: &str, reason: &str) -> NudgeError {
    NudgeError::Validation {
        message: format!("invalid cadence '{}': {}", input, reason),
        code: ErrorCode::CfgInvalidCadence,
        suggestion: Some("Use 'HH:MM', 'daily HH:MM', 'weekly <day> HH:MM' or 'every <N><s|m|h>'".to_string()),
    }
}

fn parse_time(input: &str, raw: &str) -> Result<NaiveTime, NudgeError> {
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| invalid(input, "time must be HH:MM"))
}

fn parse_interval(input: &str, raw: &str) -> Result<Duration, NudgeError> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| invalid(input, "interval needs a unit (s, m or h)"))?;
    let (amount, unit) = raw.split_at(split);
    let amount: u64 = amount
        .parse()
        .map_err(|_| invalid(input, "interval must start with a number"))?;
    if amount == 0 {
        return Err(invalid(input, "interval must be positive"));
    }
    let per_unit: u64 = match unit.trim() {
        "s" | "sec" | "secs" => 1,
        "m" | "min" | "mins" => 60,
        "h" | "hr" | "hrs" => 3600,
        _ => return Err(invalid(input, "unknown interval unit")),
    };
    let seconds = amount
        .checked_mul(per_unit)
        .filter(|s| *s <= MAX_INTERVAL_SECS)
        .ok_or_else(|| invalid(input, "interval must be at most 7 days (168h)"))?;
    Ok(Duration::from_secs(seconds))
}

impl FromStr for Cadence {
    type Err = NudgeError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalized = input.trim().to_lowercase();
        let parts: Vec<&str> = normalized.split_whitespace().collect();

        match parts.as_slice() {
            [time] => Ok(Cadence::Daily {
                at: parse_time(input, time)?,
            }),
            ["daily", time] => Ok(Cadence::Daily {
                at: parse_time(input, time)?,
            }),
            ["weekly", day, time] => {
                let day = Weekday::from_str(day).map_err(|_| invalid(input, "unknown weekday"))?;
                Ok(Cadence::Weekly {
                    day,
                    at: parse_time(input, time)?,
                })
            }
            ["every", rest @ ..] if !rest.is_empty() => Ok(Cadence::Every {
                interval: parse_interval(input, &rest.concat())?,
            }),
            _ => Err(invalid(input, "unrecognized format")),
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Daily { at } => write!(f, "daily {}", at.format("%H:%M")),
            Cadence::Weekly { day, at } => write!(
                f,
                "weekly {} {}",
                day.to_string().to_lowercase(),
                at.format("%H:%M")
            ),
            Cadence::Every { interval } => {
                let secs = interval.as_secs();
                if secs % 3600 == 0 {
                    write!(f, "every {}h", secs / 3600)
                } else if secs % 60 == 0 {
                    write!(f, "every {}m", secs / 60)
                } else {
                    write!(f, "every {}s", secs)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_parse_forms() {
        assert_eq!("09:00".parse::<Cadence>().unwrap(), Cadence::daily(9, 0).unwrap());
        assert_eq!("daily 21:30".parse::<Cadence>().unwrap(), Cadence::daily(21, 30).unwrap());
        assert_eq!(
            "weekly Sun 20:00".parse::<Cadence>().unwrap(),
            Cadence::weekly(Weekday::Sun, 20, 0).unwrap()
        );
        assert_eq!(
            "every 4h".parse::<Cadence>().unwrap(),
            Cadence::every(Duration::from_secs(4 * 3600))
        );
        assert_eq!(
            "every 30 m".parse::<Cadence>().unwrap(),
            Cadence::every(Duration::from_secs(1800))
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in [
            "",
            "25:00",
            "daily",
            "weekly funday 10:00",
            "every 0h",
            "every 3d",
            "every h",
            "0 */4 * * *",
            "every 18446744073709551615h",
            "every 99999999999999999999s",
            "every 3000000000000h",
            "every 169h",
        ] {
            let err = bad.parse::<Cadence>().unwrap_err();
            assert_eq!(err.code(), ErrorCode::CfgInvalidCadence, "input: {bad:?}");
        }
    }

    #[test]
    fn test_interval_cap_is_inclusive() {
        assert_eq!(
            "every 168h".parse::<Cadence>().unwrap(),
            Cadence::every(Duration::from_secs(MAX_INTERVAL_SECS))
        );
    }

    #[test]
    fn test_oversized_interval_never_panics() {
        let after = utc(2024, 3, 4, 10, 0);
        for secs in [u64::MAX, 10_800_000_000_000_000, MAX_INTERVAL_SECS + 1] {
            let next = Cadence::every(Duration::from_secs(secs)).next_after(after, Tz::UTC);
            assert!(next > after);
            assert!((next - after).num_seconds() <= MAX_INTERVAL_SECS as i64);
        }
    }

    #[test]
    fn test_display_round_trips() {
        for text in ["daily 09:00", "weekly sun 20:00", "every 4h", "every 90m", "every 45s"] {
            let cadence: Cadence = text.parse().unwrap();
            assert_eq!(cadence.to_string(), text);
        }
    }

    #[test]
    fn test_daily_same_day_and_rollover() {
        let cadence = Cadence::daily(9, 0).unwrap();
        assert_eq!(cadence.next_after(utc(2024, 3, 4, 8, 0), Tz::UTC), utc(2024, 3, 4, 9, 0));
        // Exactly at the slot moves to tomorrow.
        assert_eq!(cadence.next_after(utc(2024, 3, 4, 9, 0), Tz::UTC), utc(2024, 3, 5, 9, 0));
        assert_eq!(cadence.next_after(utc(2024, 3, 4, 22, 0), Tz::UTC), utc(2024, 3, 5, 9, 0));
    }

    #[test]
    fn test_daily_respects_timezone() {
        let cadence = Cadence::daily(9, 0).unwrap();
        // 09:00 in New York during EST is 14:00 UTC.
        let next = cadence.next_after(utc(2024, 1, 10, 12, 0), chrono_tz::America::New_York);
        assert_eq!(next, utc(2024, 1, 10, 14, 0));
    }

    #[test]
    fn test_daily_inside_dst_gap_moves_forward() {
        // 02:30 does not exist in New York on 2024-03-10.
        let cadence = Cadence::daily(2, 30).unwrap();
        let next = cadence.next_after(utc(2024, 3, 10, 5, 0), chrono_tz::America::New_York);
        // 03:30 EDT = 07:30 UTC
        assert_eq!(next, utc(2024, 3, 10, 7, 30));
    }

    #[test]
    fn test_weekly() {
        let cadence = Cadence::weekly(Weekday::Sun, 20, 0).unwrap();
        // 2024-03-06 is a Wednesday.
        assert_eq!(cadence.next_after(utc(2024, 3, 6, 10, 0), Tz::UTC), utc(2024, 3, 10, 20, 0));
        // Sunday after the slot goes a full week out.
        assert_eq!(cadence.next_after(utc(2024, 3, 10, 21, 0), Tz::UTC), utc(2024, 3, 17, 20, 0));
    }

    #[test]
    fn test_every_aligns_to_local_midnight() {
        let cadence = Cadence::every(Duration::from_secs(4 * 3600));
        assert_eq!(cadence.next_after(utc(2024, 3, 4, 5, 17), Tz::UTC), utc(2024, 3, 4, 8, 0));
        assert_eq!(cadence.next_after(utc(2024, 3, 4, 8, 0), Tz::UTC), utc(2024, 3, 4, 12, 0));
        assert_eq!(cadence.next_after(utc(2024, 3, 4, 22, 1), Tz::UTC), utc(2024, 3, 5, 0, 0));

        let hourly = Cadence::every(Duration::from_secs(3600));
        assert_eq!(hourly.next_after(utc(2024, 3, 4, 10, 59), Tz::UTC), utc(2024, 3, 4, 11, 0));
    }

    #[test]
    fn test_every_uneven_interval_is_epoch_aligned() {
        let cadence = Cadence::every(Duration::from_secs(7 * 60));
        let after = utc(2024, 3, 4, 10, 0);
        let next = cadence.next_after(after, Tz::UTC);
        assert!(next > after);
        assert_eq!(next.timestamp() % 420, 0);
        assert!((next - after).num_seconds() <= 420);
    }
}
