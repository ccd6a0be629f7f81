//! Registry error types

use thiserror::Error;

use crate::Role;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors returned by the registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Name already bound
    #[error("{role} '{name}' is already registered")]
    DuplicateName { name: String, role: Role },

    /// Nothing bound under the name
    #[error("{role} '{name}' is not registered")]
    NotFound { name: String, role: Role },

    /// Name bound, but to a driver of another role
    #[error("'{name}' is registered as a {actual}, not a {expected}")]
    TypeMismatch {
        name: String,
        expected: Role,
        actual: Role,
    },
}

impl RegistryError {
    pub fn duplicate(name: impl Into<String>, role: Role) -> Self {
        Self::DuplicateName {
            name: name.into(),
            role,
        }
    }

    pub fn not_found(name: impl Into<String>, role: Role) -> Self {
        Self::NotFound {
            name: name.into(),
            role,
        }
    }
}
