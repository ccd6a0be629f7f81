//! Check command - validate a config and bind its drivers

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use sluice_registry::Registry;
use tracing::info;

use super::{build_pipelines, load_config};

/// Check command arguments
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "configs/sluice.toml")]
    pub config: PathBuf,
}

/// Run the check command
pub fn run(args: CheckArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let registry = Registry::with_builtins();
    let pipelines = build_pipelines(&config, &registry)?;

    for pipeline in &pipelines {
        let settings = pipeline.settings();
        info!(
            pipeline = pipeline.name(),
            destinations = settings.window.destinations(),
            max_batch_size = settings.window.max_batch_size(),
            max_wait = ?settings.window.max_wait(),
            "pipeline ok"
        );
    }

    println!(
        "{}: {} pipeline(s) ok",
        args.config.display(),
        pipelines.len()
    );
    Ok(())
}
