//! Cadence Engine CLI
//!
//! Estimates step cadence from recorded or piped accelerometer streams.

use anyhow::{bail, Context, Result};
use cadence_engine::{
    collector::{Axis, InputStride, ReplayCollector, StreamFormat},
    config::Config,
    core::{CadenceSession, RecordOutcome},
    VERSION,
};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(version = VERSION)]
#[command(about = "Step cadence estimation from accelerometer streams", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (defaults to the config value)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Configuration file (defaults to the per-user config location)
    #[arg(long = "config", global = true)]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Clone)]
struct EngineArgs {
    /// Stream format (csv or jsonl); guessed from the file extension when omitted
    #[arg(long)]
    format: Option<String>,

    /// Keep only every Nth sample
    #[arg(long)]
    stride: Option<usize>,

    /// Samples per analysis window
    #[arg(long)]
    window_size: Option<usize>,

    /// Samples between analyses
    #[arg(long)]
    update_frequency: Option<usize>,

    /// Windows of storage kept before compaction
    #[arg(long)]
    history: Option<usize>,

    /// Print each estimate as a JSON line
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate cadence over a recorded sample file
    Replay {
        /// CSV (x,y,z[,timestamp_ms]) or JSON Lines file
        file: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Estimate cadence from samples piped on stdin until EOF or Ctrl+C
    Listen {
        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Write a synthetic sinusoidal stream as JSON Lines to stdout
    Synth {
        /// Frequency of the simulated motion in Hz
        #[arg(long, default_value = "2.0")]
        frequency_hz: f64,

        /// Sample rate in Hz
        #[arg(long, default_value = "50.0")]
        rate_hz: f64,

        /// Duration in seconds
        #[arg(long, default_value = "60.0")]
        seconds: f64,

        /// Axis carrying the motion (x, y or z)
        #[arg(long, default_value = "x")]
        axis: String,

        /// Peak amplitude of the motion
        #[arg(long, default_value = "1.0")]
        amplitude: f64,
    },

    /// Show configuration
    Config {
        /// Save the effective configuration to the config file
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config_file {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::load().unwrap_or_default(),
    };

    let log_level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::Replay { file, engine } => cmd_replay(config, file, engine),
        Commands::Listen { engine } => cmd_listen(config, engine),
        Commands::Synth {
            frequency_hz,
            rate_hz,
            seconds,
            axis,
            amplitude,
        } => cmd_synth(frequency_hz, rate_hz, seconds, &axis, amplitude),
        Commands::Config { write } => cmd_config(config, cli.config_file, write),
    }
}

/// Apply command-line overrides on top of the loaded configuration.
fn effective_config(mut config: Config, args: &EngineArgs) -> Result<Config> {
    if let Some(stride) = args.stride {
        config.input_stride = stride;
    }
    if let Some(window_size) = args.window_size {
        config.engine.window_size = window_size;
    }
    if let Some(update_frequency) = args.update_frequency {
        config.engine.update_frequency = update_frequency;
    }
    if let Some(history) = args.history {
        config.engine.history_count = history;
    }
    config.validate().context("invalid engine configuration")?;
    Ok(config)
}

fn cmd_replay(config: Config, file: PathBuf, args: EngineArgs) -> Result<()> {
    let config = effective_config(config, &args)?;
    let format = match &args.format {
        Some(f) => f.parse::<StreamFormat>()?,
        None => StreamFormat::from_path(&file),
    };

    let stride = InputStride::new(config.input_stride)?;
    let collector = ReplayCollector::from_file(&file, format, stride)?;

    println!("Cadence Engine v{VERSION}");
    println!("Replaying {}", file.display());
    println!();

    run(config, collector, args.json, None)
}

fn cmd_listen(config: Config, args: EngineArgs) -> Result<()> {
    let config = effective_config(config, &args)?;
    let format = match &args.format {
        Some(f) => f.parse::<StreamFormat>()?,
        None => StreamFormat::Csv,
    };

    let stdin = Box::new(std::io::BufReader::new(std::io::stdin()));
    let collector = ReplayCollector::new(stdin, format, InputStride::new(config.input_stride)?);

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("setting Ctrl+C handler")?;

    eprintln!("Listening on stdin, press Ctrl+C to stop");

    run(config, collector, args.json, Some(running))
}

/// Drain the collector through the engine until it disconnects or `running` clears.
fn run(
    config: Config,
    mut collector: ReplayCollector,
    json: bool,
    running: Option<Arc<AtomicBool>>,
) -> Result<()> {
    // The engine is seeded from the first sample's timestamp, so recorded
    // streams analyse from the first cycle.
    let mut session = CadenceSession::new(config.engine.clone())?;

    tracing::info!(
        session_id = %session.log().session_id(),
        window_size = config.engine.window_size,
        update_frequency = config.engine.update_frequency,
        history_count = config.engine.history_count,
        input_stride = config.input_stride,
        "session started"
    );

    collector.start()?;
    let receiver = collector.receiver().clone();
    let stdout = std::io::stdout();

    loop {
        if let Some(ref running) = running {
            if !running.load(Ordering::SeqCst) {
                break;
            }
        }

        let sample = match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(sample) => sample,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        };

        match session.record_sample(sample) {
            Ok(RecordOutcome::Estimate { estimate, .. }) => {
                let mut out = stdout.lock();
                if json {
                    writeln!(out, "{}", serde_json::to_string(&estimate)?)?;
                } else {
                    writeln!(
                        out,
                        "[{}] {:.3} Hz  {:.1} bpm  axis {}{}",
                        estimate.timestamp,
                        estimate.frequency_hz,
                        estimate.bpm(),
                        estimate.axis,
                        if estimate.refined { " (refined)" } else { "" }
                    )?;
                }
            }
            Ok(_) => {}
            Err(e) => eprintln!("Warning: {e}; engine was reset"),
        }
    }

    collector.stop();
    if collector.skipped_lines() > 0 {
        eprintln!("Skipped {} malformed line(s)", collector.skipped_lines());
    }

    eprintln!();
    eprintln!("{}", session.log().summary());
    if let Some(summary) = session.summary() {
        eprintln!();
        eprintln!("{}", summary.summary());
    }

    Ok(())
}

fn cmd_synth(
    frequency_hz: f64,
    rate_hz: f64,
    seconds: f64,
    axis: &str,
    amplitude: f64,
) -> Result<()> {
    let Some(axis) = Axis::from_label(axis) else {
        bail!("unknown axis '{axis}', expected x, y or z");
    };
    if !(rate_hz > 0.0 && seconds > 0.0) {
        bail!("rate and duration must be positive");
    }

    let count = (rate_hz * seconds).round() as usize;
    let step_ms = 1000.0 / rate_hz;
    let start = cadence_engine::collector::now_millis();
    let mut out = std::io::BufWriter::new(std::io::stdout().lock());

    for i in 0..count {
        let t = i as f64 / rate_hz;
        let value = (amplitude * (2.0 * std::f64::consts::PI * frequency_hz * t).sin()) as f32;
        let mut sample = cadence_engine::SampleRecord::at(
            0.0,
            0.0,
            0.0,
            start + (i as f64 * step_ms).round() as i64,
        );
        match axis {
            Axis::X => sample.x = value,
            Axis::Y => sample.y = value,
            Axis::Z => sample.z = value,
        }
        writeln!(out, "{}", serde_json::to_string(&sample)?)?;
    }

    tracing::debug!(samples = count, %axis, "synthetic stream written");
    Ok(())
}

fn cmd_config(config: Config, path: Option<PathBuf>, write: bool) -> Result<()> {
    let path = path.unwrap_or_else(Config::config_path);

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {path:?}");
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);

    if write {
        config.validate()?;
        config.save_to(&path)?;
        println!();
        println!("Saved to {path:?}");
    }

    Ok(())
}
