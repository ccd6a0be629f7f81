//! Transform error types
//!
//! Errors raised while building a hook chain from call strings, and errors
//! reported by hooks while a pass runs.

use crate::ArgType;
use thiserror::Error;

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

/// Errors that can occur while building or running a hook chain
#[derive(Debug, Error)]
pub enum TransformError {
    /// Call string is not `name(arg, ...)`
    #[error("invalid hook call '{call}': expected name(arg1,arg2,...)")]
    InvalidCall {
        /// The offending call string
        call: String,
    },

    /// No hook registered under this name
    #[error("unknown hook '{name}'")]
    UnknownHook {
        /// Requested hook name
        name: String,
    },

    /// Wrong number of arguments for the hook's signature
    #[error("hook '{hook}' expects {expected} args, got {actual}")]
    ArgCount {
        hook: String,
        expected: usize,
        actual: usize,
    },

    /// Argument could not be coerced to the declared type
    #[error("hook '{hook}' arg {index}: expected {expected}, got '{value}'")]
    ArgType {
        hook: String,
        index: usize,
        expected: ArgType,
        value: String,
    },

    /// Hook's argument validator rejected the arguments
    #[error("hook '{hook}' rejected its arguments: {message}")]
    InvalidArgument { hook: String, message: String },

    /// A step reported failure during a pass
    #[error("hook '{hook}' failed: {message}")]
    StepFailed { hook: String, message: String },

    /// The pass could not run to completion
    #[error("transform failed: {0}")]
    Failed(String),
}

impl TransformError {
    /// Create an InvalidCall error
    pub fn invalid_call(call: impl Into<String>) -> Self {
        Self::InvalidCall { call: call.into() }
    }

    /// Create an UnknownHook error
    pub fn unknown_hook(name: impl Into<String>) -> Self {
        Self::UnknownHook { name: name.into() }
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Create a StepFailed error
    pub fn step_failed(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StepFailed {
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Create a Failed error
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Whether this error comes from building a chain rather than running one
    pub fn is_build_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCall { .. }
                | Self::UnknownHook { .. }
                | Self::ArgCount { .. }
                | Self::ArgType { .. }
                | Self::InvalidArgument { .. }
        )
    }
}
