//! Sluice Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Minimal config should just work - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use sluice_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str(r#"
//! [[pipelines]]
//! name = "orders"
//! source = { driver = "generator" }
//! destinations = [{ driver = "stdout" }]
//! "#).unwrap();
//! assert_eq!(config.pipelines[0].max_batch_size, 1);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "debug"
//!
//! [[pipelines]]
//! name = "mysql->clickhouse"
//! max_batch_size = 500
//! max_wait_time_ms = 2000
//!
//! [pipelines.retry]
//! initial_interval_ms = 1000
//! multiplier = 1.5
//! max_interval_ms = 3000
//!
//! [pipelines.source]
//! driver = "mysql"
//! dsn = "root:secret@tcp(127.0.0.1:3306)/"
//!
//! [[pipelines.destinations]]
//! driver = "clickhouse"
//! url = "tcp://127.0.0.1:9000"
//! hooks = ["dataFilter(shop,orders,amount,<,100)"]
//! ```
//!
//! Values left at zero (batch size, retry intervals, multiplier) are replaced
//! by their defaults when the config is loaded.

mod drivers;
mod error;
mod hooks;
mod logging;
mod pipeline;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use drivers::{DestinationConfig, DriverOptions, SourceConfig};
pub use error::{ConfigError, Result};
pub use hooks::HookCall;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use pipeline::{
    DEFAULT_INITIAL_INTERVAL_MS, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_INTERVAL_MS,
    DEFAULT_MAX_WAIT_TIME_MS, DEFAULT_MULTIPLIER, PipelineConfig, RetryConfig, StreamClosedPolicy,
};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults; validation requires at
/// least one pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Independent replication pipelines
    pub pipelines: Vec<PipelineConfig>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        for pipeline in &mut config.pipelines {
            pipeline.normalize();
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Find a pipeline by name
    pub fn pipeline(&self, name: &str) -> Option<&PipelineConfig> {
        self.pipelines.iter().find(|p| p.name == name)
    }

    /// Names of all configured pipelines, in declaration order
    pub fn pipeline_names(&self) -> Vec<&str> {
        self.pipelines.iter().map(|p| p.name.as_str()).collect()
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
