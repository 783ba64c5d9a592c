//! Signal containers for one acquisition cycle
//!
//! `SampleBatch` holds what came off the link, `CleanedSignal` holds the
//! parsed and re-based samples, and `Window` is a borrowed view into the
//! cleaned signal used as the unit of feature extraction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line read from the link, stamped at read time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSample {
    /// Wall-clock stamp, e.g. `[2024-03-14 10:15:30.250000]`
    pub timestamp: String,
    /// Payload as received (normally a number, but not guaranteed)
    pub value: String,
}

impl RawSample {
    pub fn new(timestamp: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            value: value.into(),
        }
    }

    /// Render as a space separated line for the cleaner
    pub fn to_line(&self) -> String {
        format!("{} {}", self.timestamp, self.value)
    }

    /// Whether the payload carried nothing
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }
}

/// Fixed-size batch of raw samples collected during one cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleBatch {
    /// Cycle identifier, carried through log lines
    pub id: Uuid,
    /// Samples in acquisition order
    pub samples: Vec<RawSample>,
}

impl SampleBatch {
    /// Wrap a completed set of samples into a new batch
    pub fn new(samples: Vec<RawSample>) -> Self {
        Self {
            id: Uuid::new_v4(),
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Lines handed to the cleaner; samples with an empty payload are skipped
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.samples
            .iter()
            .filter(|sample| !sample.is_empty())
            .map(RawSample::to_line)
    }
}

/// A parsed sample on the relative time axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CleanedSample {
    /// Seconds since the end of the warm-up second, millisecond resolution
    pub timestamp: f64,
    pub value: f64,
}

/// Cleaned, ordered signal ready for segmentation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanedSignal {
    samples: Vec<CleanedSample>,
}

impl CleanedSignal {
    /// Build from samples already known to be ordered
    pub fn new(samples: Vec<CleanedSample>) -> Self {
        Self { samples }
    }

    /// Build an evenly spaced signal from values at the given sampling rate
    pub fn from_values(values: &[f64], sampling_rate: f64) -> Self {
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, &value)| CleanedSample {
                timestamp: round_millis(i as f64 / sampling_rate),
                value,
            })
            .collect();
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[CleanedSample] {
        &self.samples
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn timestamps(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }

    /// Time span covered, in seconds
    pub fn duration(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0.0,
        }
    }
}

/// Contiguous, fixed-length view into a cleaned signal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window<'a> {
    /// Position of this window in the segmentation sequence
    pub index: usize,
    /// Index of the first sample within the cleaned signal
    pub start_index: usize,
    samples: &'a [CleanedSample],
}

impl<'a> Window<'a> {
    pub fn new(index: usize, start_index: usize, samples: &'a [CleanedSample]) -> Self {
        Self {
            index,
            start_index,
            samples,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &'a [CleanedSample] {
        self.samples
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Timestamp of the first sample, 0.0 for an empty window
    pub fn start_timestamp(&self) -> f64 {
        self.samples.first().map_or(0.0, |s| s.timestamp)
    }

    /// Timestamp of the last sample, 0.0 for an empty window
    pub fn end_timestamp(&self) -> f64 {
        self.samples.last().map_or(0.0, |s| s.timestamp)
    }
}

/// Round seconds to millisecond resolution
pub fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_lines_skip_empty_payloads() {
        let batch = SampleBatch::new(vec![
            RawSample::new("[2024-03-14 10:15:30.000000]", "512"),
            RawSample::new("[2024-03-14 10:15:30.008000]", ""),
            RawSample::new("[2024-03-14 10:15:30.016000]", "498"),
        ]);

        let lines: Vec<String> = batch.lines().collect();
        assert_eq!(batch.len(), 3);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "[2024-03-14 10:15:30.016000] 498");
    }

    #[test]
    fn test_signal_from_values() {
        let signal = CleanedSignal::from_values(&[1.0, 2.0, 3.0, 4.0], 125.0);
        assert_eq!(signal.len(), 4);
        assert_eq!(signal.timestamps(), vec![0.0, 0.008, 0.016, 0.024]);
        assert!((signal.duration() - 0.024).abs() < 1e-12);
    }

    #[test]
    fn test_window_view() {
        let signal = CleanedSignal::from_values(&[5.0, 6.0, 7.0, 8.0, 9.0], 125.0);
        let window = Window::new(1, 2, &signal.samples()[2..5]);

        assert_eq!(window.len(), 3);
        assert_eq!(window.values(), vec![7.0, 8.0, 9.0]);
        assert_eq!(window.start_timestamp(), 0.016);
        assert_eq!(window.end_timestamp(), 0.032);
    }

    #[test]
    fn test_round_millis() {
        assert_eq!(round_millis(1.23456), 1.235);
        assert_eq!(round_millis(0.0004), 0.0);
    }
}
