//! Cycle service: drives the pipeline against a link until stopped

use anyhow::{Context, Result};
use intent_core::{IntentError, IntentResult};
use intent_processing::{
    Classifier, CycleReport, FeatureTable, IntentPipeline, SampleBuffer, Transport,
};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// How long the service runs and what it records
#[derive(Debug, Clone, Default)]
pub struct ServiceOptions {
    /// Stop after this many cycles
    pub max_cycles: Option<usize>,
    /// Treat a read timeout as the end of the input rather than a failed cycle
    pub stop_when_exhausted: bool,
    /// Append every cycle's full feature table to this CSV file
    pub dump_features: Option<PathBuf>,
}

/// Counts gathered over a service run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSummary {
    pub cycles: usize,
    pub decisions: usize,
    pub failed_cycles: usize,
    /// Decisions per intent state
    pub tally: BTreeMap<String, usize>,
}

impl ServiceSummary {
    fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        if let Some(decision) = &report.decision {
            self.decisions += 1;
            *self.tally.entry(decision.state.clone()).or_insert(0) += 1;
        }
    }
}

impl fmt::Display for ServiceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cycles, {} decisions, {} failed",
            self.cycles, self.decisions, self.failed_cycles
        )?;
        for (state, count) in &self.tally {
            write!(f, ", {}: {}", state, count)?;
        }
        Ok(())
    }
}

/// Transport wrapper whose reads fail once a stop has been requested
struct Interruptible<T> {
    inner: T,
    stop: Arc<AtomicBool>,
}

impl<T: Transport> Transport for Interruptible<T> {
    fn read_line(&mut self) -> IntentResult<String> {
        if self.stop.load(Ordering::Relaxed) {
            return Err(IntentError::TransportError {
                reason: "interrupted".to_string(),
            });
        }
        self.inner.read_line()
    }

    fn write_token(&mut self, token: &str) -> IntentResult<()> {
        if self.stop.load(Ordering::Relaxed) {
            return Err(IntentError::TransportError {
                reason: "interrupted".to_string(),
            });
        }
        self.inner.write_token(token)
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

/// CSV sink for full-schema feature rows
struct FeatureDump {
    writer: BufWriter<File>,
    header_written: bool,
}

impl FeatureDump {
    fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("creating feature dump {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
            header_written: false,
        })
    }

    fn append(&mut self, table: &FeatureTable) -> Result<()> {
        if table.is_empty() {
            return Ok(());
        }
        let csv = table.to_csv();
        let body = if self.header_written {
            csv.split_once('\n').map(|(_, rows)| rows).unwrap_or("")
        } else {
            csv.as_str()
        };
        self.writer.write_all(body.as_bytes())?;
        self.writer.flush()?;
        self.header_written = true;
        Ok(())
    }
}

/// Run cycles until the options say stop, the link fails or Ctrl-C arrives
///
/// Each cycle runs on a blocking task; an interrupt abandons it and nothing
/// further is written to the link.
pub async fn run_cycles<T>(
    mut pipeline: IntentPipeline,
    mut buffer: SampleBuffer,
    transport: T,
    options: ServiceOptions,
) -> Result<ServiceSummary>
where
    T: Transport + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let mut link = Interruptible {
        inner: transport,
        stop: Arc::clone(&stop),
    };
    let mut dump = options
        .dump_features
        .as_deref()
        .map(FeatureDump::create)
        .transpose()?;
    let mut summary = ServiceSummary::default();

    info!(
        link = %link.describe(),
        classifier = pipeline.classifier().name(),
        batch = buffer.batch_size(),
        "starting cycles"
    );

    loop {
        if options.max_cycles.is_some_and(|max| summary.cycles >= max) {
            break;
        }

        let task = tokio::task::spawn_blocking(move || {
            let result = pipeline.run_cycle(&mut buffer, &mut link);
            (pipeline, buffer, link, result)
        });

        let (returned_pipeline, returned_buffer, returned_link, result) = tokio::select! {
            joined = task => joined.context("cycle task failed")?,
            _ = tokio::signal::ctrl_c() => {
                stop.store(true, Ordering::Relaxed);
                warn!("interrupted, abandoning the current cycle");
                break;
            }
        };
        pipeline = returned_pipeline;
        buffer = returned_buffer;
        link = returned_link;

        match result {
            Ok(report) => {
                summary.record(&report);
                if let Some(dump) = dump.as_mut() {
                    dump.append(&report.features)?;
                }
            }
            Err(IntentError::TransportTimeout { collected, .. }) if options.stop_when_exhausted => {
                info!(discarded = collected, "input exhausted");
                break;
            }
            Err(e) if !e.is_transient() => {
                return Err(e).context("cycle failed, stopping");
            }
            Err(e) => {
                summary.failed_cycles += 1;
                error!(error = %e, "cycle aborted");
            }
        }
    }

    info!(%summary, "cycles finished");
    Ok(summary)
}
