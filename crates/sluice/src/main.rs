//! Sluice - change-data-capture replication
//!
//! # Usage
//!
//! ```bash
//! # Run every configured pipeline until Ctrl-C
//! sluice run --config configs/sluice.toml
//!
//! # Validate a config and bind every driver and hook without running
//! sluice check --config configs/sluice.toml
//!
//! # List registered sources, destinations and hooks
//! sluice drivers
//! ```

mod cmd;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sluice_config::{Config, LogConfig, LogFormat};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Sluice - change-data-capture replication
#[derive(Parser, Debug)]
#[command(name = "sluice")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every configured pipeline
    Run(cmd::run::RunArgs),

    /// Validate a config and build its pipelines without running them
    Check(cmd::check::CheckArgs),

    /// List registered drivers and hooks
    Drivers,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            let (level, format) = resolve_log_config(cli.log_level.as_deref(), &args.config);
            init_logging(&level, format)?;
            cmd::run::run(args).await
        }
        Command::Check(args) => {
            let (level, format) = resolve_log_config(cli.log_level.as_deref(), &args.config);
            init_logging(&level, format)?;
            cmd::check::run(args)
        }
        // Drivers doesn't need logging - just outputs to stdout
        Command::Drivers => cmd::drivers::run(),
    }
}

/// Log settings from the config file, with the CLI level taking precedence
///
/// Returns the level as a filter directive plus the output format.
fn resolve_log_config(cli_level: Option<&str>, config_path: &Path) -> (String, LogFormat) {
    let log = match Config::from_file(config_path) {
        Ok(config) => config.log,
        Err(_) => LogConfig::default(),
    };

    let level = cli_level.unwrap_or(log.level.as_str()).to_string();
    (level, log.format)
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    match format {
        LogFormat::Console => tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(true))
            .with(filter)
            .init(),
    }

    Ok(())
}
