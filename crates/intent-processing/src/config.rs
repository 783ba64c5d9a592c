//! Pipeline configuration

use crate::features::feature_columns;
use crate::segmenter::WindowSegmenter;
use crate::table::ColumnSelection;
use intent_core::{config_error, DecisionEncoding, IntentError, IntentResult, LabelMap};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything that shapes one acquisition cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Configuration name/profile
    pub name: String,
    /// Board sampling rate (Hz)
    pub sampling_rate: f64,
    /// Analysis window length (seconds); windows overlap by half
    pub window_duration_secs: f64,
    /// Reads per acquisition cycle
    pub batch_size: usize,
    /// Classifier input columns, in order
    pub columns: ColumnSelection,
    /// Numeric label to intent state
    pub labels: LabelMap,
    /// Classify only the latest n windows; `None` votes over all
    pub vote_window: Option<usize>,
    /// What gets written back for a decision
    pub decision_encoding: DecisionEncoding,
}

impl PipelineConfig {
    /// Three-state deployment without a backward class
    pub fn three_class() -> Self {
        Self {
            name: "three-class".to_string(),
            labels: LabelMap::three_class(),
            ..Self::default()
        }
    }

    /// Samples per window
    pub fn window_size(&self) -> usize {
        (self.window_duration_secs * self.sampling_rate) as usize
    }

    /// Samples between consecutive window starts
    pub fn stride(&self) -> usize {
        self.window_size() / 2
    }

    pub fn segmenter(&self) -> IntentResult<WindowSegmenter> {
        WindowSegmenter::for_duration(self.window_duration_secs, self.sampling_rate)
    }

    /// Full feature schema for the configured window size
    pub fn schema(&self) -> Vec<String> {
        feature_columns(self.window_size())
    }

    /// Validate the configuration
    pub fn validate(&self) -> IntentResult<()> {
        if !(self.sampling_rate.is_finite() && self.sampling_rate > 0.0) {
            return Err(config_error!(
                "sampling rate must be positive, got {}",
                self.sampling_rate
            ));
        }

        if !(self.window_duration_secs.is_finite() && self.window_duration_secs > 0.0) {
            return Err(config_error!(
                "window duration must be positive, got {}",
                self.window_duration_secs
            ));
        }

        let window_size = self.window_size();
        if window_size < 2 {
            return Err(config_error!(
                "window of {} s at {} Hz holds {} sample(s), need at least 2",
                self.window_duration_secs,
                self.sampling_rate,
                window_size
            ));
        }

        if self.batch_size < window_size {
            return Err(config_error!(
                "batch size {} is smaller than one window ({} samples)",
                self.batch_size,
                window_size
            ));
        }

        if let Some(0) = self.vote_window {
            return Err(config_error!("vote window must cover at least one row"));
        }

        if self.labels.is_empty() {
            return Err(config_error!("label map is empty"));
        }

        self.columns.validate_against(&self.schema())
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> IntentResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| config_error!("failed to serialize configuration: {}", e))
    }

    /// Import configuration from JSON and validate it
    pub fn from_json(json: &str) -> IntentResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| config_error!("failed to deserialize configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> IntentResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| config_error!("cannot read {}: {}", path.display(), e))?;
        Self::from_json(&json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> IntentResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)
            .map_err(|e| config_error!("cannot write {}: {}", path.display(), e))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: "four-class".to_string(),
            sampling_rate: 125.0,
            window_duration_secs: 1.0,
            batch_size: 1000,
            columns: ColumnSelection::default(),
            labels: LabelMap::four_class(),
            vote_window: None,
            decision_encoding: DecisionEncoding::Code,
        }
    }
}
