//! Transport backed by the simulator instead of a serial port

use crate::eeg_simulator::{EegConfig, EegSimulator};
use intent_core::{IntentError, IntentResult};
use intent_processing::Transport;
use std::time::Duration;
use tracing::{debug, trace};

/// Simulated acquisition board
///
/// Reads produce simulator lines; writes are recorded for inspection.
pub struct SimulatedLink {
    simulator: EegSimulator,
    written: Vec<String>,
    remaining: Option<usize>,
    pace: Option<Duration>,
}

impl SimulatedLink {
    pub fn new(config: EegConfig) -> IntentResult<Self> {
        Ok(Self {
            simulator: EegSimulator::new(config)?,
            written: Vec::new(),
            remaining: None,
            pace: None,
        })
    }

    /// Time out after `lines` more reads, as a board that stopped sending
    pub fn with_line_limit(mut self, lines: usize) -> Self {
        self.remaining = Some(lines);
        self
    }

    /// Sleep one sample period per read, as a real board would
    pub fn paced(mut self) -> Self {
        self.pace = Some(Duration::from_secs_f64(
            1.0 / self.simulator.config().sampling_rate,
        ));
        self
    }

    /// Tokens written so far, oldest first
    pub fn written(&self) -> &[String] {
        &self.written
    }
}

impl Transport for SimulatedLink {
    fn read_line(&mut self) -> IntentResult<String> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return Err(IntentError::TransportTimeout {
                    collected: 0,
                    expected: 1,
                });
            }
            *remaining -= 1;
        }

        if let Some(pace) = self.pace {
            std::thread::sleep(pace);
        }

        let line = self.simulator.next_line();
        trace!(line = %line, "simulated read");
        Ok(line)
    }

    fn write_token(&mut self, token: &str) -> IntentResult<()> {
        debug!(token, "simulated board received token");
        self.written.push(token.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "simulated board ({}, {} Hz)",
            self.simulator.config().pattern.description(),
            self.simulator.config().sampling_rate
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EegConfig {
        EegConfig {
            seed: Some(3),
            ..EegConfig::default()
        }
    }

    #[test]
    fn test_reads_numeric_lines() {
        let mut link = SimulatedLink::new(config()).unwrap();
        for _ in 0..50 {
            let line = link.read_line().unwrap();
            assert!(line.parse::<i64>().is_ok(), "{}", line);
        }
    }

    #[test]
    fn test_line_limit_times_out() {
        let mut link = SimulatedLink::new(config()).unwrap().with_line_limit(2);
        assert!(link.read_line().is_ok());
        assert!(link.read_line().is_ok());
        assert!(matches!(
            link.read_line(),
            Err(IntentError::TransportTimeout { .. })
        ));
    }

    #[test]
    fn test_records_written_tokens() {
        let mut link = SimulatedLink::new(config()).unwrap();
        link.write_token("2").unwrap();
        link.write_token("0").unwrap();
        assert_eq!(link.written(), &["2".to_string(), "0".to_string()]);
        assert!(link.describe().contains("125 Hz"));
    }

    /// Votes for whichever band carries the most power
    struct DominantBand;

    impl intent_processing::Classifier for DominantBand {
        fn predict(
            &self,
            table: &intent_processing::FeatureTable,
        ) -> IntentResult<Vec<intent_core::Label>> {
            // backward, left, right, forward
            let columns = ["Theta Power", "Alpha Power", "Gamma Power", "Beta Power"];
            let indices: Vec<usize> = columns
                .iter()
                .filter_map(|name| table.column_index(name))
                .collect();
            Ok(table
                .rows()
                .iter()
                .map(|row| {
                    let mut best = 0;
                    for (label, &i) in indices.iter().enumerate() {
                        if row[i] > row[indices[best]] {
                            best = label;
                        }
                    }
                    best as intent_core::Label
                })
                .collect())
        }

        fn name(&self) -> &str {
            "dominant-band"
        }
    }

    #[test]
    fn test_pipeline_decodes_simulated_intents() {
        use chrono::NaiveDate;
        use intent_core::SteppedClock;
        use intent_processing::{ColumnSelection, IntentPipeline, PipelineConfig};

        let start = NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        for state in ["backward", "left", "right", "forward"] {
            let config = PipelineConfig {
                batch_size: 1125,
                columns: ColumnSelection::new([
                    "Theta Power",
                    "Alpha Power",
                    "Gamma Power",
                    "Beta Power",
                ]),
                ..PipelineConfig::default()
            };
            let mut pipeline = IntentPipeline::new(config, Box::new(DominantBand)).unwrap();
            let mut buffer = pipeline.sample_buffer(Box::new(SteppedClock::at_rate(start, 125.0)));
            let mut link = SimulatedLink::new(EegConfig {
                seed: Some(11),
                ..EegConfig::for_intent(state).unwrap()
            })
            .unwrap();

            let report = pipeline.run_cycle(&mut buffer, &mut link).unwrap();
            assert_eq!(report.decision.unwrap().state, state);
            assert_eq!(link.written().len(), 1);
        }
    }
}
