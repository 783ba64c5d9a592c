//! Signal cleaning: raw stamped lines to a re-based numeric signal
//!
//! A raw line looks like `[2024-03-14 10:15:30.250000] 512`. The date and
//! time-of-day tokens become seconds elapsed since the first parsed row, the
//! first whole second is dropped as acquisition warm-up, and the remaining
//! timestamps are shifted down by one second and rounded to milliseconds.
//! When the leading column is not a date, only the time of day is known and
//! a backward jump of more than half a day is read as midnight rollover.

use intent_core::signal::round_millis;
use intent_core::timestamp::{parse_day, parse_time_of_day, SECONDS_PER_DAY};
use intent_core::{CleanedSample, CleanedSignal, IntentError, IntentResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Length of the discarded warm-up, in whole seconds
const WARMUP_SECONDS: f64 = 1.0;

/// Backward step beyond which a time-of-day-only stamp has crossed midnight
const ROLLOVER_THRESHOLD: f64 = SECONDS_PER_DAY / 2.0;

/// Characters stripped from string fields
const DECORATION: [char; 2] = ['[', ']'];

/// When a row was read
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowStamp {
    /// Day number, when the leading column is a date
    pub day: Option<i64>,
    /// Seconds since midnight
    pub seconds: f64,
}

impl RowStamp {
    /// Seconds from `origin` to this stamp
    pub fn elapsed_since(&self, origin: &RowStamp) -> f64 {
        let elapsed = self.seconds - origin.seconds;
        match (origin.day, self.day) {
            (Some(start), Some(day)) => elapsed + (day - start) as f64 * SECONDS_PER_DAY,
            _ if elapsed < -ROLLOVER_THRESHOLD => elapsed + SECONDS_PER_DAY,
            _ => elapsed,
        }
    }
}

/// Row accounting for one cleaning pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    /// Lines seen
    pub total_rows: usize,
    /// Lines that failed to parse
    pub malformed_rows: usize,
    /// Rows inside the warm-up second
    pub warmup_rows: usize,
    /// Rows stamped before the first row or before an already kept row
    pub out_of_order_rows: usize,
}

impl CleaningReport {
    /// Rows that made it into the cleaned signal
    pub fn kept_rows(&self) -> usize {
        self.total_rows - self.malformed_rows - self.warmup_rows - self.out_of_order_rows
    }
}

/// Cleaned signal together with what was dropped on the way
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub signal: CleanedSignal,
    pub report: CleaningReport,
}

/// Parses and normalizes raw acquisition lines
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalCleaner;

impl SignalCleaner {
    pub fn new() -> Self {
        Self
    }

    /// Parse one raw line into its stamp and value
    ///
    /// `line_number` is 1-based and only used for error reporting.
    pub fn parse_row(&self, line_number: usize, line: &str) -> IntentResult<(RowStamp, f64)> {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        // First column is the date half of the stamp
        if tokens.len() < 3 {
            return Err(IntentError::MalformedRow {
                line: line_number,
                reason: format!(
                    "expected timestamp and value after the leading column, found {} token(s)",
                    tokens.len().saturating_sub(1)
                ),
            });
        }

        let date_token = tokens[0].trim_matches(DECORATION.as_slice());
        let time_token = tokens[1].trim_matches(DECORATION.as_slice());
        let value_token = tokens[2].trim_matches(DECORATION.as_slice());

        let seconds = parse_time_of_day(time_token).ok_or_else(|| IntentError::MalformedRow {
            line: line_number,
            reason: format!("unparseable timestamp '{}'", time_token),
        })?;

        let value = value_token
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| IntentError::MalformedRow {
                line: line_number,
                reason: format!("non-numeric value '{}'", value_token),
            })?;

        let stamp = RowStamp {
            day: parse_day(date_token),
            seconds,
        };
        Ok((stamp, value))
    }

    /// Clean a sequence of raw lines
    ///
    /// Malformed rows are dropped and counted; they never abort the pass.
    pub fn clean<I, S>(&self, lines: I) -> CleaningOutcome
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = CleaningReport::default();
        let mut samples = Vec::new();
        let mut origin: Option<RowStamp> = None;
        let mut last_kept = f64::NEG_INFINITY;

        for (idx, line) in lines.into_iter().enumerate() {
            report.total_rows += 1;

            let (stamp, value) = match self.parse_row(idx + 1, line.as_ref()) {
                Ok(row) => row,
                Err(e) => {
                    warn!("dropping row: {}", e);
                    report.malformed_rows += 1;
                    continue;
                }
            };

            let elapsed = stamp.elapsed_since(origin.get_or_insert(stamp));
            if elapsed < 0.0 {
                debug!(line = idx + 1, elapsed, "row stamped before the first row");
                report.out_of_order_rows += 1;
                continue;
            }

            if elapsed.trunc() < WARMUP_SECONDS {
                report.warmup_rows += 1;
                continue;
            }

            if elapsed < last_kept {
                report.out_of_order_rows += 1;
                continue;
            }
            last_kept = elapsed;

            samples.push(CleanedSample {
                timestamp: round_millis(elapsed - WARMUP_SECONDS),
                value,
            });
        }

        debug!(
            total = report.total_rows,
            kept = samples.len(),
            malformed = report.malformed_rows,
            warmup = report.warmup_rows,
            out_of_order = report.out_of_order_rows,
            "cleaning pass finished"
        );

        CleaningOutcome {
            signal: CleanedSignal::new(samples),
            report,
        }
    }
}
