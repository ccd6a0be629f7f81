//! Configuration validation
//!
//! Validates config consistency:
//! - At least one pipeline, with unique non-empty names
//! - Every pipeline names a source driver and at least one destination
//! - Retry tuning can actually back off
//! - Hook call strings are well-formed

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::hooks::HookCall;
use crate::pipeline::PipelineConfig;
use std::collections::HashSet;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.pipelines.is_empty() {
        return Err(ConfigError::NoPipelines);
    }

    let mut seen = HashSet::new();
    for pipeline in &config.pipelines {
        validate_pipeline(pipeline)?;
        if !seen.insert(pipeline.name.as_str()) {
            return Err(ConfigError::duplicate_pipeline(&pipeline.name));
        }
    }

    Ok(())
}

/// Validate a single pipeline
pub fn validate_pipeline(pipeline: &PipelineConfig) -> Result<()> {
    if pipeline.name.trim().is_empty() {
        return Err(ConfigError::missing_field("pipeline", "<unnamed>", "name"));
    }
    let name = pipeline.name.as_str();

    if pipeline.source.driver.is_empty() {
        return Err(ConfigError::missing_field("source", name, "driver"));
    }

    if pipeline.destinations.is_empty() {
        return Err(ConfigError::missing_field("pipeline", name, "destinations"));
    }

    for (idx, dest) in pipeline.destinations.iter().enumerate() {
        if dest.driver.is_empty() {
            return Err(ConfigError::missing_field(
                "destination",
                format!("{name}[{idx}]"),
                "driver",
            ));
        }
        for call in &dest.hooks {
            HookCall::parse(call)?;
        }
    }

    let retry = &pipeline.retry;
    if retry.multiplier < 1.0 || !retry.multiplier.is_finite() {
        return Err(ConfigError::invalid_value(
            "pipeline",
            name,
            "multiplier",
            format!("must be a finite number >= 1.0, got {}", retry.multiplier),
        ));
    }
    if retry.max_interval_ms < retry.initial_interval_ms {
        return Err(ConfigError::invalid_value(
            "pipeline",
            name,
            "max_interval_ms",
            format!(
                "must be >= initial_interval_ms ({} < {})",
                retry.max_interval_ms, retry.initial_interval_ms
            ),
        ));
    }

    Ok(())
}
