//! Wall-clock stamping for acquired samples
//!
//! Every line read from the link is stamped with the local wall clock at
//! read time. The stamp is rendered as `[YYYY-MM-DD HH:MM:SS.ffffff]`, which
//! the cleaner later splits into a date token and a time-of-day token.

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Format used for sample stamps
pub const STAMP_FORMAT: &str = "[%Y-%m-%d %H:%M:%S%.6f]";

/// Seconds in one day, used to unwrap midnight rollover
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Source of wall-clock time for sample stamping
pub trait Clock {
    /// Current wall-clock time
    fn now(&mut self) -> NaiveDateTime;
}

/// Clock backed by the system's local time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Deterministic clock that advances a fixed step on every reading
///
/// Used for simulated acquisition and tests, where the stamp of sample `i`
/// must be `start + i * step`.
#[derive(Debug, Clone)]
pub struct SteppedClock {
    current: NaiveDateTime,
    step: Duration,
}

impl SteppedClock {
    /// Create a clock starting at `start` and advancing `step` per reading
    pub fn new(start: NaiveDateTime, step: Duration) -> Self {
        Self { current: start, step }
    }

    /// Clock ticking once per sample at the given sampling rate
    pub fn at_rate(start: NaiveDateTime, sampling_rate: f64) -> Self {
        let step_us = (1_000_000.0 / sampling_rate).round() as i64;
        Self::new(start, Duration::microseconds(step_us))
    }
}

impl Clock for SteppedClock {
    fn now(&mut self) -> NaiveDateTime {
        let now = self.current;
        self.current += self.step;
        now
    }
}

/// Render a wall-clock time as a sample stamp
pub fn format_stamp(time: &NaiveDateTime) -> String {
    time.format(STAMP_FORMAT).to_string()
}

/// Parse a time-of-day token into seconds since midnight
///
/// Accepts `HH:MM:SS`, `HH:MM:SS.ffffff` and plain decimal seconds. Bracket
/// decoration must already be stripped.
pub fn parse_time_of_day(token: &str) -> Option<f64> {
    if let Ok(time) = NaiveTime::parse_from_str(token, "%H:%M:%S%.f") {
        let whole = f64::from(time.num_seconds_from_midnight());
        let frac = f64::from(time.nanosecond()) / 1_000_000_000.0;
        return Some(whole + frac);
    }

    token.parse::<f64>().ok().filter(|secs| secs.is_finite())
}

/// Parse a `YYYY-MM-DD` date token into a day number
///
/// Day numbers count from the common era, so the difference of two of them
/// is a whole number of days.
pub fn parse_day(token: &str) -> Option<i64> {
    NaiveDate::parse_from_str(token, "%Y-%m-%d")
        .ok()
        .map(|date| i64::from(date.num_days_from_ce()))
}
