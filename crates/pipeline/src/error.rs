//! Pipeline error types

use sluice_config::ConfigError;
use sluice_destinations::DestinationError;
use sluice_registry::RegistryError;
use sluice_sources::SourceError;
use sluice_transform::TransformError;
use thiserror::Error;

use crate::Cancelled;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid pipeline configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Driver or hook name could not be resolved
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A destination's hook calls could not be bound
    #[error("hook chain of destination #{index} ({driver}): {source}")]
    Chain {
        index: usize,
        driver: String,
        #[source]
        source: TransformError,
    },

    /// Source rejected its options or failed to start
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Destination rejected its options or failed to start
    #[error("destination #{index} ({driver}): {source}")]
    Destination {
        index: usize,
        driver: String,
        #[source]
        source: DestinationError,
    },

    /// Shutdown requested while an operation was retrying
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    /// An earlier panic took the drivers down with the main loop
    #[error("pipeline '{0}' lost its drivers to a panic and cannot run again")]
    Defunct(String),
}

impl PipelineError {
    pub fn chain(index: usize, driver: impl Into<String>, source: TransformError) -> Self {
        Self::Chain {
            index,
            driver: driver.into(),
            source,
        }
    }

    pub fn destination(index: usize, driver: impl Into<String>, source: DestinationError) -> Self {
        Self::Destination {
            index,
            driver: driver.into(),
            source,
        }
    }

    /// True for errors raised while building a pipeline
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Registry(_) | Self::Chain { .. }
        )
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
