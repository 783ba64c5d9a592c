//! Per-cycle stage timings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Pipeline stages that get timed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Acquisition,
    Cleaning,
    Extraction,
    Classification,
    Transmission,
}

/// Wall time spent in each stage of one cycle, in microseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleMetrics {
    pub acquisition_us: u64,
    pub cleaning_us: u64,
    /// Segmentation, feature extraction and tabulation
    pub extraction_us: u64,
    pub classification_us: u64,
    pub transmission_us: u64,
}

impl CycleMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing one stage
    pub fn start(stage: Stage) -> StageTimer {
        StageTimer {
            stage,
            start_time: Instant::now(),
        }
    }

    pub fn get(&self, stage: Stage) -> u64 {
        match stage {
            Stage::Acquisition => self.acquisition_us,
            Stage::Cleaning => self.cleaning_us,
            Stage::Extraction => self.extraction_us,
            Stage::Classification => self.classification_us,
            Stage::Transmission => self.transmission_us,
        }
    }

    pub fn record(&mut self, stage: Stage, micros: u64) {
        let slot = match stage {
            Stage::Acquisition => &mut self.acquisition_us,
            Stage::Cleaning => &mut self.cleaning_us,
            Stage::Extraction => &mut self.extraction_us,
            Stage::Classification => &mut self.classification_us,
            Stage::Transmission => &mut self.transmission_us,
        };
        *slot += micros;
    }

    /// Processing time excluding the blocking acquisition reads
    pub fn processing_us(&self) -> u64 {
        self.cleaning_us + self.extraction_us + self.classification_us + self.transmission_us
    }

    pub fn total_us(&self) -> u64 {
        self.acquisition_us + self.processing_us()
    }
}

impl fmt::Display for CycleMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "acquire {:.1} ms, clean {:.1} ms, extract {:.1} ms, classify {:.1} ms, transmit {:.1} ms",
            self.acquisition_us as f64 / 1000.0,
            self.cleaning_us as f64 / 1000.0,
            self.extraction_us as f64 / 1000.0,
            self.classification_us as f64 / 1000.0,
            self.transmission_us as f64 / 1000.0,
        )
    }
}

/// Helper for timing one stage
pub struct StageTimer {
    stage: Stage,
    start_time: Instant,
}

impl StageTimer {
    /// Stop timing and add the elapsed time to `metrics`
    pub fn finish(self, metrics: &mut CycleMetrics) {
        metrics.record(self.stage, self.start_time.elapsed().as_micros() as u64);
    }
}
