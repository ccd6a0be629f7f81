//! Run command - replicate until interrupted
//!
//! Every pipeline is built before any is started, so a config error never
//! leaves half the pipelines running. Pipelines are independent once
//! started; Ctrl-C or SIGTERM stops them in declaration order.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use sluice_pipeline::Pipeline;
use sluice_registry::Registry;
use tokio::signal;
use tracing::{error, info};

use super::{build_pipelines, load_config};

/// Run command arguments
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "configs/sluice.toml")]
    pub config: PathBuf,
}

/// Run the run command
pub async fn run(args: RunArgs) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        config = %args.config.display(),
        "sluice starting"
    );

    let config = load_config(&args.config)?;
    let registry = Registry::with_builtins();
    let pipelines = build_pipelines(&config, &registry)?;

    if let Err(e) = start_all(&pipelines).await {
        error!(error = %e, "start-up failed");
        return Err(e);
    }
    info!(pipelines = pipelines.len(), "sluice running");

    wait_for_shutdown().await?;
    info!("shutdown signal received, stopping pipelines...");

    for pipeline in &pipelines {
        pipeline.stop().await;
    }

    info!("sluice shutdown complete");
    Ok(())
}

/// Start every pipeline, stopping the ones already running if one fails
async fn start_all(pipelines: &[Pipeline]) -> Result<()> {
    for (i, pipeline) in pipelines.iter().enumerate() {
        if let Err(e) = pipeline.run().await {
            for started in &pipelines[..i] {
                started.stop().await;
            }
            return Err(e)
                .with_context(|| format!("failed to start pipeline '{}'", pipeline.name()));
        }
    }
    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?;
        tokio::select! {
            result = signal::ctrl_c() => result.context("failed to listen for Ctrl+C")?,
            _ = terminate.recv() => info!("SIGTERM received"),
        }
    }

    #[cfg(not(unix))]
    signal::ctrl_c().await.context("failed to listen for Ctrl+C")?;

    Ok(())
}
