//! Destination error types

use thiserror::Error;

/// Result type for destination operations
pub type DestinationResult<T> = Result<T, DestinationError>;

/// Errors that can occur in a destination
#[derive(Debug, Error)]
pub enum DestinationError {
    /// Driver option missing or malformed
    #[error("destination '{driver}' option '{option}': {message}")]
    InvalidOption {
        driver: String,
        option: String,
        message: String,
    },

    /// Connectivity check failed
    #[error("destination '{driver}' failed to start: {message}")]
    Start { driver: String, message: String },

    /// Batch could not be written
    #[error("destination '{driver}' write failed: {message}")]
    Write { driver: String, message: String },

    /// Operation needs a started destination
    #[error("destination '{0}' is not started")]
    NotStarted(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be serialized
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DestinationError {
    /// Create an InvalidOption error
    pub fn invalid_option(
        driver: impl Into<String>,
        option: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidOption {
            driver: driver.into(),
            option: option.into(),
            message: message.into(),
        }
    }

    /// Create a Start error
    pub fn start(driver: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Start {
            driver: driver.into(),
            message: message.into(),
        }
    }

    /// Create a Write error
    pub fn write(driver: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Write {
            driver: driver.into(),
            message: message.into(),
        }
    }
}
