//! `VtfSlim` CLI - Command-line interface for the asset optimizer

pub mod commands;
pub mod progress;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::OptimizerConfig;
use crate::stats;
use commands::Commands;

#[derive(Parser)]
#[command(name = "vtfslim")]
#[command(version, about = "VtfSlim: Source engine mod asset optimizer", long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/vtfslim/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Append warnings and failures to this file (overrides the config)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Print reports as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every command
pub struct Context {
    pub config: OptimizerConfig,
    pub json: bool,
}

/// Run the `VtfSlim` CLI
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = OptimizerConfig::load_or_default(cli.config.as_deref())?;

    let log_file = cli.log_file.clone().unwrap_or_else(|| config.log_file.clone());
    init_logging(&log_file)?;
    stats::reset();

    let ctx = Context {
        config,
        json: cli.json,
    };
    cli.command.execute(&ctx)
}

/// Stderr output honoring `RUST_LOG` (default `info`), plus WARN and above
/// appended to `log_file`.
fn init_logging(log_file: &Path) -> anyhow::Result<()> {
    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}
