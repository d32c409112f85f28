//! CAN Bus Reader CLI Application
//!
//! Opens a CAN interface with the can-bus-decoder library, polls the latest
//! signal values at a fixed interval and writes every known value to stdout.

use anyhow::{Context, Result};
use can_bus_decoder::{publish_snapshot, BusReader, ReaderState, SignalSink};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::thread;

mod config;
mod sink;

use config::{AppConfig, OutputFormat};
use sink::{JsonSink, TextSink};

/// CAN Bus Reader - Decode live vehicle signals from a CAN interface
#[derive(Parser, Debug)]
#[command(name = "can-bus-cli")]
#[command(about = "Decode live vehicle signals from a CAN interface", long_about = None)]
#[command(version)]
struct Args {
    /// CAN interface to read (default: vcan0)
    #[arg(value_name = "INTERFACE")]
    interface: Option<String>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Snapshot polling interval in milliseconds (default: 100)
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Output format for published readings
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Skip signals not updated within this many milliseconds
    #[arg(long, value_name = "MS")]
    max_age_ms: Option<u64>,

    /// Stop after this many polls (runs forever by default)
    #[arg(long, value_name = "COUNT")]
    iterations: Option<u64>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("CAN Bus Reader CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", can_bus_decoder::VERSION);

    let config = resolve_config(&args)?;
    log::debug!("Effective configuration: {:?}", config);

    run(&config, args.iterations)
}

/// Merge the config file (if any) with command line overrides
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(interface) = &args.interface {
        config.reader.interface = interface.clone();
    }
    if let Some(interval_ms) = args.interval_ms {
        anyhow::ensure!(interval_ms > 0, "--interval-ms must be greater than zero");
        config.publish.interval_ms = interval_ms;
    }
    if let Some(format) = args.format {
        config.publish.format = format;
    }
    if let Some(max_age_ms) = args.max_age_ms {
        config.publish.max_age_ms = Some(max_age_ms);
    }

    Ok(config)
}

/// Poll the reader and publish every known value until `iterations` runs out
fn run(config: &AppConfig, iterations: Option<u64>) -> Result<()> {
    let mut reader = BusReader::open_with_config(&config.reader)
        .with_context(|| format!("Cannot read from {}", config.reader.interface))?;

    let stdout = io::stdout().lock();
    let mut sink: Box<dyn SignalSink> = match config.publish.format {
        OutputFormat::Text => Box::new(TextSink::new(stdout)),
        OutputFormat::Json => Box::new(JsonSink::new(stdout)),
    };

    let interval = config.publish.interval();
    let max_age = config.publish.max_age();
    let mut polls = 0u64;
    let mut reported_stop = false;

    while iterations.map_or(true, |max| polls < max) {
        thread::sleep(interval);

        let values = reader.snapshot();
        let published = publish_snapshot(&values, &mut *sink, max_age, chrono::Utc::now())?;
        log::trace!("Published {} readings (sequence {})", published, values.last_sequence());
        polls += 1;

        if !reported_stop {
            if let state @ ReaderState::Stopped(_) = reader.state() {
                log::warn!(
                    "Reader on {} {}; publishing last known values",
                    reader.interface(),
                    state
                );
                reported_stop = true;
            }
        }
    }

    reader.close();
    log::info!(
        "Stopped after {} polls, {} frames received",
        polls,
        reader.frames_received()
    );

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
