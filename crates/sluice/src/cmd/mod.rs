//! CLI subcommands

pub mod check;
pub mod drivers;
pub mod run;

use std::path::Path;

use anyhow::{Context, Result};
use sluice_config::Config;
use sluice_pipeline::{Pipeline, PipelineBuilder};
use sluice_registry::Registry;

/// Load a config file that the user asked for explicitly
fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("config file not found: {}", path.display());
    }
    Config::from_file(path).context("failed to load configuration")
}

/// Build every configured pipeline, failing on the first one that does not bind
fn build_pipelines(config: &Config, registry: &Registry) -> Result<Vec<Pipeline>> {
    config
        .pipelines
        .iter()
        .map(|pipeline| {
            PipelineBuilder::from_config(pipeline, registry)
                .and_then(PipelineBuilder::build)
                .with_context(|| format!("failed to build pipeline '{}'", pipeline.name))
        })
        .collect()
}
