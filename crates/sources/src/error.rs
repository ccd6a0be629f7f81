//! Source error types

use thiserror::Error;

/// Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors that can occur in a source
#[derive(Debug, Error)]
pub enum SourceError {
    /// Driver option missing or malformed
    #[error("source '{driver}' option '{option}': {message}")]
    InvalidOption {
        driver: String,
        option: String,
        message: String,
    },

    /// Source could not begin producing events
    #[error("source '{driver}' failed to start: {message}")]
    Start { driver: String, message: String },

    /// Operation needs a started source
    #[error("source '{0}' is not started")]
    NotStarted(String),

    /// `start` called twice without `stop`
    #[error("source '{0}' is already started")]
    AlreadyStarted(String),

    /// Event stream is closed
    #[error("source '{0}' event stream is closed")]
    Closed(String),

    /// Resumption state could not be persisted
    #[error("source '{driver}' checkpoint failed: {message}")]
    Checkpoint { driver: String, message: String },
}

impl SourceError {
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

    /// Create a Checkpoint error
    pub fn checkpoint(driver: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Checkpoint {
            driver: driver.into(),
            message: message.into(),
        }
    }
}
