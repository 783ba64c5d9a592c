//! Intent-Processing: signal-to-decision pipeline for single-channel EEG
//!
//! Acquisition batching, cleaning, sliding-window segmentation, feature
//! extraction, column projection and majority-vote classification.

pub mod acquisition;
pub mod cleaner;
pub mod segmenter;
pub mod spectrum;
pub mod features;
pub mod table;
pub mod classifier;
pub mod metrics;
pub mod config;
pub mod pipeline;

pub use acquisition::{SampleBuffer, Transport};
pub use cleaner::{CleaningOutcome, CleaningReport, RowStamp, SignalCleaner};
pub use segmenter::{WindowSegmenter, Windows};
pub use spectrum::{BandPowers, EegBand, SpectralAnalyzer, SpectralMoments};
pub use features::{feature_columns, FeatureExtractor, FeatureVector, TimeFeatures};
pub use table::{ColumnSelection, FeatureTable, FeatureTableBuilder, DEPLOYED_COLUMNS};
pub use classifier::{majority_vote, ClassificationGate, Classifier};
pub use metrics::{CycleMetrics, Stage};
pub use config::PipelineConfig;
pub use pipeline::{CycleReport, IntentPipeline};
