//! Per-cycle driver chaining every stage from raw lines to a decision

use crate::acquisition::{SampleBuffer, Transport};
use crate::classifier::{ClassificationGate, Classifier};
use crate::cleaner::{CleaningReport, SignalCleaner};
use crate::config::PipelineConfig;
use crate::features::FeatureExtractor;
use crate::metrics::{CycleMetrics, Stage};
use crate::segmenter::WindowSegmenter;
use crate::table::{FeatureTable, FeatureTableBuilder};
use intent_core::{
    CleanedSignal, Clock, Decision, ErrorScope, IntentError, IntentResult, SampleBatch,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything one cycle produced
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    /// Reads collected from the link (0 when processing bare lines)
    pub raw_samples: usize,
    pub cleaning: CleaningReport,
    /// Windows the segmenter produced
    pub windows: usize,
    /// Windows dropped during feature extraction
    pub skipped_windows: usize,
    /// Full-schema feature table, one row per extracted window
    pub features: FeatureTable,
    /// Feature table projected onto the classifier's columns
    pub table: FeatureTable,
    pub decision: Option<Decision>,
    /// Token written to the link, if any
    pub transmitted: Option<String>,
    pub metrics: CycleMetrics,
}

/// Owns the stages of the pipeline and the injected classifier
pub struct IntentPipeline {
    config: PipelineConfig,
    classifier: Box<dyn Classifier>,
    cleaner: SignalCleaner,
    segmenter: WindowSegmenter,
    extractor: FeatureExtractor,
    gate: ClassificationGate,
}

impl IntentPipeline {
    /// Validate `config` and the classifier's declared columns, then wire
    /// the stages
    pub fn new(config: PipelineConfig, classifier: Box<dyn Classifier>) -> IntentResult<Self> {
        config.validate()?;

        if let Some(expected) = classifier.expected_columns() {
            let selected = config.columns.columns();
            let missing: Vec<String> = expected
                .iter()
                .filter(|column| !selected.contains(column))
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(IntentError::SchemaMismatch { missing });
            }
        }

        let segmenter = config.segmenter()?;
        let extractor = FeatureExtractor::new(config.sampling_rate);
        let gate = ClassificationGate::new(config.labels.clone(), config.vote_window)?;

        info!(
            config = %config.name,
            classifier = classifier.name(),
            window_size = segmenter.window_size(),
            stride = segmenter.stride(),
            columns = config.columns.len(),
            "pipeline ready"
        );

        Ok(Self {
            config,
            classifier,
            cleaner: SignalCleaner::new(),
            segmenter,
            extractor,
            gate,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Buffer collecting one configured batch per cycle
    pub fn sample_buffer(&self, clock: Box<dyn Clock + Send>) -> SampleBuffer {
        SampleBuffer::new(self.config.batch_size, clock)
    }

    /// Extract one full-schema row per window; returns the table and the
    /// number of windows skipped
    pub fn feature_table(&mut self, signal: &CleanedSignal) -> IntentResult<(FeatureTable, usize)> {
        let mut builder = FeatureTableBuilder::new(self.segmenter.window_size());
        let mut skipped = 0;

        for window in self.segmenter.windows(signal) {
            match self.extractor.extract(&window) {
                Ok(features) => builder.push(&features)?,
                Err(e) if e.scope() == ErrorScope::Unit => {
                    warn!(window = window.index, "skipping window: {}", e);
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok((builder.finish(), skipped))
    }

    /// Clean, segment, extract, project and classify raw lines
    pub fn process_lines<I, S>(&mut self, lines: I) -> IntentResult<CycleReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.process(Uuid::new_v4(), 0, lines, CycleMetrics::new())
    }

    /// Process a batch collected by a `SampleBuffer`
    pub fn process_batch(&mut self, batch: &SampleBatch) -> IntentResult<CycleReport> {
        self.process(batch.id, batch.len(), batch.lines(), CycleMetrics::new())
    }

    /// Fill a batch from the link, process it and write the decision back
    ///
    /// Nothing is written when the cycle fails or yields no decision.
    pub fn run_cycle(
        &mut self,
        buffer: &mut SampleBuffer,
        transport: &mut dyn Transport,
    ) -> IntentResult<CycleReport> {
        let mut metrics = CycleMetrics::new();

        let timer = CycleMetrics::start(Stage::Acquisition);
        let batch = buffer.fill(transport)?;
        timer.finish(&mut metrics);

        let mut report = self.process(batch.id, batch.len(), batch.lines(), metrics)?;

        if let Some(decision) = &report.decision {
            let token = decision.encode(self.config.decision_encoding);
            let timer = CycleMetrics::start(Stage::Transmission);
            transport.write_token(&token)?;
            timer.finish(&mut report.metrics);

            info!(
                cycle = %report.cycle_id,
                %decision,
                agreement = decision.agreement(),
                token = %token,
                "decision sent"
            );
            report.transmitted = Some(token);
        } else {
            info!(cycle = %report.cycle_id, windows = report.windows, "no decision this cycle");
        }

        debug!(
            cycle = %report.cycle_id,
            timings = %report.metrics,
            total_us = report.metrics.total_us(),
            "cycle finished"
        );
        Ok(report)
    }

    fn process<I, S>(
        &mut self,
        cycle_id: Uuid,
        raw_samples: usize,
        lines: I,
        mut metrics: CycleMetrics,
    ) -> IntentResult<CycleReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let timer = CycleMetrics::start(Stage::Cleaning);
        let outcome = self.cleaner.clean(lines);
        timer.finish(&mut metrics);
        if outcome.report.malformed_rows > 0 {
            warn!(
                cycle = %cycle_id,
                dropped = outcome.report.malformed_rows,
                "malformed rows dropped"
            );
        }
        debug!(
            cycle = %cycle_id,
            kept = outcome.report.kept_rows(),
            warmup = outcome.report.warmup_rows,
            out_of_order = outcome.report.out_of_order_rows,
            "signal cleaned"
        );

        let timer = CycleMetrics::start(Stage::Extraction);
        let windows = self.segmenter.window_count(outcome.signal.len());
        let (features, skipped_windows) = self.feature_table(&outcome.signal)?;
        let table = features.project(&self.config.columns)?;
        timer.finish(&mut metrics);
        debug!(
            cycle = %cycle_id,
            samples = outcome.signal.len(),
            windows,
            rows = table.len(),
            "features extracted"
        );

        let timer = CycleMetrics::start(Stage::Classification);
        let decision = self.gate.decide(&table, self.classifier.as_ref())?;
        timer.finish(&mut metrics);

        Ok(CycleReport {
            cycle_id,
            raw_samples,
            cleaning: outcome.report,
            windows,
            skipped_windows,
            features,
            table,
            decision,
            transmitted: None,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnSelection;
    use intent_core::{Label, RawSample};

    struct ConstantClassifier {
        label: Label,
        columns: Option<Vec<String>>,
    }

    impl Classifier for ConstantClassifier {
        fn predict(&self, table: &FeatureTable) -> IntentResult<Vec<Label>> {
            Ok(vec![self.label; table.len()])
        }

        fn name(&self) -> &str {
            "constant"
        }

        fn expected_columns(&self) -> Option<&[String]> {
            self.columns.as_deref()
        }
    }

    fn lines(count: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                let micros = i as u64 * 8_000;
                let secs = micros / 1_000_000;
                format!(
                    "[2024-03-14 09:{:02}:{:02}.{:06}] {}",
                    secs / 60,
                    secs % 60,
                    micros % 1_000_000,
                    (i as f64 * 0.5).sin() * 100.0
                )
            })
            .collect()
    }

    fn pipeline(label: Label) -> IntentPipeline {
        let classifier = ConstantClassifier { label, columns: None };
        IntentPipeline::new(PipelineConfig::default(), Box::new(classifier)).unwrap()
    }

    #[test]
    fn test_process_lines() {
        let mut pipeline = pipeline(1);
        // One warm-up second plus 1000 kept samples
        let report = pipeline.process_lines(lines(1125)).unwrap();

        assert_eq!(report.cleaning.warmup_rows, 125);
        assert_eq!(report.windows, 15);
        assert_eq!(report.skipped_windows, 0);
        assert_eq!(report.features.width(), 146);
        assert_eq!(report.table.width(), 33);
        assert_eq!(report.table.len(), 15);

        let decision = report.decision.unwrap();
        assert_eq!(decision.state, "left");
        assert_eq!(decision.votes, 15);
    }

    #[test]
    fn test_process_batch() {
        let mut samples: Vec<RawSample> = lines(1125)
            .iter()
            .filter_map(|line| line.rsplit_once(' '))
            .map(|(stamp, value)| RawSample::new(stamp, value))
            .collect();
        // Empty reads count towards the batch but never reach the cleaner
        samples.insert(10, RawSample::new("[2024-03-14 09:00:00.080000]", ""));
        samples.push(RawSample::new("[2024-03-14 09:00:09.000000]", ""));
        let batch = SampleBatch::new(samples);

        let report = pipeline(2).process_batch(&batch).unwrap();

        assert_eq!(report.cycle_id, batch.id);
        assert_eq!(report.raw_samples, 1127);
        assert_eq!(report.cleaning.total_rows, 1125);
        assert_eq!(report.windows, 15);
        assert_eq!(report.decision.unwrap().state, "right");
        assert_eq!(report.transmitted, None);
    }

    #[test]
    fn test_short_input_yields_no_decision() {
        let mut pipeline = pipeline(1);
        let report = pipeline.process_lines(lines(200)).unwrap();

        assert_eq!(report.windows, 0);
        assert!(report.table.is_empty());
        assert!(report.decision.is_none());
    }

    #[test]
    fn test_classifier_columns_are_checked() {
        let classifier = ConstantClassifier {
            label: 0,
            columns: Some(vec!["Mean".to_string(), "RMS".to_string()]),
        };
        let result = IntentPipeline::new(PipelineConfig::default(), Box::new(classifier));
        assert_eq!(
            result.err(),
            Some(IntentError::SchemaMismatch {
                missing: vec!["Mean".to_string()]
            })
        );

        let mut config = PipelineConfig::default();
        config.columns = ColumnSelection::new(["Mean", "RMS"]);
        let classifier = ConstantClassifier {
            label: 0,
            columns: Some(vec!["RMS".to_string(), "Mean".to_string()]),
        };
        assert!(IntentPipeline::new(config, Box::new(classifier)).is_ok());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = PipelineConfig::default();
        config.batch_size = 10;
        let classifier = ConstantClassifier { label: 0, columns: None };
        assert!(IntentPipeline::new(config, Box::new(classifier)).is_err());
    }
}
