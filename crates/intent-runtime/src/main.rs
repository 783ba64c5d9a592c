//! Intent runtime: EEG acquisition board to wheelchair commands

mod model;
mod processing_service;
mod replay_link;
mod serial_link;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use intent_core::{SteppedClock, SystemClock};
use intent_processing::{IntentPipeline, PipelineConfig};
use intent_simulation::{EegConfig, SimulatedLink};
use model::LinearClassifier;
use processing_service::{run_cycles, ServiceOptions};
use replay_link::ReplayLink;
use serial_link::{SerialConfig, SerialLink};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "intent-runtime")]
#[command(about = "Decode motor intent from a single-channel EEG stream")]
#[command(version)]
struct CliArgs {
    /// Log as JSON lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode live from the acquisition board
    Run {
        /// Serial port name (e.g. COM3 or /dev/ttyUSB0)
        #[arg(long)]
        port: String,
        #[arg(long, default_value_t = 115_200)]
        baud: u32,
        /// Per-read timeout in milliseconds
        #[arg(long, default_value_t = 1000)]
        read_timeout_ms: u64,
        /// Linear model JSON
        #[arg(long)]
        model: PathBuf,
        /// Pipeline configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,
        /// Append every cycle's features to this CSV file
        #[arg(long, value_name = "CSV")]
        dump_features: Option<PathBuf>,
    },

    /// Decode a simulated board producing one intent's rhythm
    Simulate {
        /// Intent state to simulate (e.g. left)
        #[arg(long)]
        intent: String,
        #[arg(long, default_value_t = 5)]
        cycles: usize,
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        /// Deliver samples at the real sampling rate
        #[arg(long)]
        paced: bool,
        #[arg(long, value_name = "CSV")]
        dump_features: Option<PathBuf>,
    },

    /// Decode a recorded capture (one raw value per line)
    Replay {
        file: PathBuf,
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_name = "CSV")]
        dump_features: Option<PathBuf>,
    },

    /// List available serial ports
    Ports,

    /// Print the feature schema, the classifier projection and the labels
    Schema {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading pipeline config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn build_pipeline(config: Option<&Path>, model: &Path) -> Result<IntentPipeline> {
    let config = load_config(config)?;
    let classifier = LinearClassifier::load(model)?;
    IntentPipeline::new(config, Box::new(classifier)).context("assembling pipeline")
}

fn start_stamp() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.json);

    match args.command {
        Command::Run {
            port,
            baud,
            read_timeout_ms,
            model,
            config,
            dump_features,
        } => {
            let pipeline = build_pipeline(config.as_deref(), &model)?;
            let serial = SerialConfig {
                port,
                baud_rate: baud,
                read_timeout_ms,
            };
            let link = SerialLink::open(&serial)?;
            let buffer = pipeline.sample_buffer(Box::new(SystemClock));
            let options = ServiceOptions {
                dump_features,
                ..ServiceOptions::default()
            };
            run_cycles(pipeline, buffer, link, options).await?;
        }

        Command::Simulate {
            intent,
            cycles,
            model,
            config,
            seed,
            paced,
            dump_features,
        } => {
            let pipeline = build_pipeline(config.as_deref(), &model)?;
            let sim_config = EegConfig {
                sampling_rate: pipeline.config().sampling_rate,
                seed,
                ..EegConfig::for_intent(&intent)?
            };
            let link = SimulatedLink::new(sim_config)?;
            let (link, buffer) = if paced {
                (link.paced(), pipeline.sample_buffer(Box::new(SystemClock)))
            } else {
                // Unpaced reads arrive instantly, so stamp them at the board rate
                let clock = SteppedClock::at_rate(start_stamp(), pipeline.config().sampling_rate);
                (link, pipeline.sample_buffer(Box::new(clock)))
            };
            match pipeline.config().labels.label_for(&intent) {
                Some(label) => info!(intent = %intent, label, cycles, "simulating"),
                None => warn!(intent = %intent, cycles, "simulating an intent the labels do not name"),
            }
            let options = ServiceOptions {
                max_cycles: Some(cycles),
                dump_features,
                ..ServiceOptions::default()
            };
            let summary = run_cycles(pipeline, buffer, link, options).await?;
            println!("{}", summary);
        }

        Command::Replay {
            file,
            model,
            config,
            dump_features,
        } => {
            let pipeline = build_pipeline(config.as_deref(), &model)?;
            let link = ReplayLink::open(&file)?;
            let clock = SteppedClock::at_rate(start_stamp(), pipeline.config().sampling_rate);
            let buffer = pipeline.sample_buffer(Box::new(clock));
            let options = ServiceOptions {
                stop_when_exhausted: true,
                dump_features,
                ..ServiceOptions::default()
            };
            let summary = run_cycles(pipeline, buffer, link, options).await?;
            println!("{}", summary);
        }

        Command::Ports => {
            let ports = SerialLink::list_ports()?;
            if ports.is_empty() {
                println!("no serial ports found");
            }
            for port in ports {
                println!("{}", port);
            }
        }

        Command::Schema { config } => {
            let config = load_config(config.as_deref())?;
            println!(
                "window: {} samples, stride {} ({} Hz)",
                config.window_size(),
                config.stride(),
                config.sampling_rate
            );
            println!("schema:");
            for (i, column) in config.schema().iter().enumerate() {
                println!("  {:>3}  {}", i, column);
            }
            println!("classifier input:");
            for (i, column) in config.columns.columns().iter().enumerate() {
                println!("  {:>3}  {}", i, column);
            }
            println!("labels ({:?} encoding):", config.decision_encoding);
            for (label, state) in config.labels.iter() {
                println!("  {:>3}  {}", label, state);
            }
        }
    }

    Ok(())
}
