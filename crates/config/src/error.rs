//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// No pipelines declared
    #[error("no pipelines configured - at least one pipeline is required")]
    NoPipelines,

    /// Two pipelines share a name
    #[error("pipeline name '{name}' is used more than once")]
    DuplicatePipeline {
        /// The repeated name
        name: String,
    },

    /// Validation error - required field missing
    #[error("{component} '{name}' is missing required field '{field}'")]
    MissingField {
        /// Component type (e.g., "pipeline", "source")
        component: &'static str,
        /// Name of the component
        name: String,
        /// Missing field name
        field: &'static str,
    },

    /// Validation error - invalid value
    #[error("{component} '{name}' has invalid {field}: {message}")]
    InvalidValue {
        /// Component type
        component: &'static str,
        /// Name of the component
        name: String,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },

    /// Hook call string does not match `name(arg, ...)`
    #[error("malformed hook call '{call}': expected name(arg1,arg2,...)")]
    MalformedHookCall {
        /// The offending call string
        call: String,
    },
}

impl ConfigError {
    /// Create a DuplicatePipeline error
    pub fn duplicate_pipeline(name: impl Into<String>) -> Self {
        Self::DuplicatePipeline { name: name.into() }
    }

    /// Create a MissingField error
    pub fn missing_field(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
    ) -> Self {
        Self::MissingField {
            component,
            name: name.into(),
            field,
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            component,
            name: name.into(),
            field,
            message: message.into(),
        }
    }

    /// Create a MalformedHookCall error
    pub fn malformed_hook_call(call: impl Into<String>) -> Self {
        Self::MalformedHookCall { call: call.into() }
    }
}
