//! Command-line interface for event-datagen
//!
//! # Usage Examples
//!
//! ## Generate events
//! ```bash
//! # Default configuration, until Ctrl-C
//! event-datagen run
//!
//! # From a config file, for five minutes, with a day of startup history
//! event-datagen run \
//!   --config datagen.toml \
//!   --state-dir /var/lib/event-datagen \
//!   --poll-interval-ms 500 \
//!   --duration-secs 300 \
//!   --history --history-window 1d
//! ```
//!
//! Each event is written to stdout as one JSON line. Logs go to stderr and
//! are controlled with `RUST_LOG`.
//!
//! ## Inspect configuration
//! ```bash
//! event-datagen show-config --config datagen.toml
//! ```

use anyhow::Context;
use checkpoint::FilesystemStore;
use clap::{Parser, Subcommand};
use datagen_core::Event;
use event_datagen::{DatagenConfig, DatagenTask};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "event-datagen")]
#[command(about = "Generate synthetic events on independent cadences")]
#[command(version)]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start generating and write events to stdout as JSON lines
    Run {
        /// Path to a TOML configuration file (defaults are used when omitted)
        #[arg(long, env = "DATAGEN_CONFIG")]
        config: Option<PathBuf>,

        /// Directory holding task-state markers
        #[arg(long, default_value = ".event-datagen-state", env = "DATAGEN_STATE_DIR")]
        state_dir: PathBuf,

        /// How often to poll the task for new events
        #[arg(long, default_value = "1000", env = "DATAGEN_POLL_INTERVAL_MS")]
        poll_interval_ms: u64,

        /// Stop after this many seconds (runs until Ctrl-C when omitted)
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Generate startup history when this task has never run before
        #[arg(long)]
        history: bool,

        /// Override the history window (e.g. "2h", "7d")
        #[arg(long)]
        history_window: Option<String>,

        /// Override the RNG seed
        #[arg(long, env = "DATAGEN_SEED")]
        seed: Option<u64>,
    },

    /// Print the effective configuration as TOML
    ShowConfig {
        /// Path to a TOML configuration file (defaults are used when omitted)
        #[arg(long, env = "DATAGEN_CONFIG")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // stdout carries the events, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            state_dir,
            poll_interval_ms,
            duration_secs,
            history,
            history_window,
            seed,
        } => {
            let mut config = load_config(config.as_deref())?;
            if history {
                config.history.enabled = true;
            }
            if let Some(window) = history_window {
                config.history.window = window;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            if poll_interval_ms == 0 {
                anyhow::bail!("--poll-interval-ms must be positive");
            }

            run_generator(
                config,
                state_dir,
                Duration::from_millis(poll_interval_ms),
                duration_secs.map(Duration::from_secs),
            )
            .await?;
        }
        Commands::ShowConfig { config } => {
            let config = load_config(config.as_deref())?;
            config.validate().context("Invalid configuration")?;
            let rendered =
                toml::to_string_pretty(&config).context("Failed to render configuration")?;
            print!("{rendered}");
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<DatagenConfig> {
    match path {
        Some(path) => DatagenConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {path:?}")),
        None => Ok(DatagenConfig::default()),
    }
}

async fn run_generator(
    config: DatagenConfig,
    state_dir: PathBuf,
    poll_interval: Duration,
    duration: Option<Duration>,
) -> anyhow::Result<()> {
    let store = FilesystemStore::new(state_dir);
    let mut task = DatagenTask::new();

    if let Err(e) = task.start(&config, &store).await {
        task.stop().await;
        return Err(e);
    }

    let deadline = duration.map(|d| tokio::time::Instant::now() + d);
    let mut out = BufWriter::new(std::io::stdout());
    let mut delivered: u64 = 0;

    let result = loop {
        let events = task.poll();
        match write_events(&mut out, &events) {
            Ok(()) => delivered += events.len() as u64,
            Err(e) if is_broken_pipe(&e) => {
                info!("Output closed, shutting down");
                break Ok(());
            }
            Err(e) => break Err(e),
        }

        let sleep = tokio::time::sleep(poll_interval);
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break Ok(());
            }
            _ = wait_until(deadline) => {
                info!("Run duration reached, shutting down");
                break Ok(());
            }
            _ = sleep => {}
        }
    };

    task.stop().await;
    info!("Delivered {delivered} events");
    result
}

async fn wait_until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn write_events(out: &mut impl Write, events: &[Event]) -> anyhow::Result<()> {
    for event in events {
        let line = serde_json::to_string(&event.to_json())
            .with_context(|| format!("Failed to serialize event {}", event.key()))?;
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}

fn is_broken_pipe(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .is_some_and(|io| io.kind() == ErrorKind::BrokenPipe)
}
