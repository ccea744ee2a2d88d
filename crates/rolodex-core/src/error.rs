//! Structured error handling for the rolodex core structure
//!
//! This module provides the error types for all map and index operations.
//! Every strict accessor on the map has a non-erroring `try_` or
//! `Option`-returning counterpart; errors are surfaced synchronously to the
//! caller and nothing is retried or swallowed.

use thiserror::Error;

/// Convenience alias for results produced by rolodex operations
pub type RolodexResult<T> = Result<T, RolodexError>;

/// Error type for multi-index map operations
#[derive(Error, Debug, Clone)]
pub enum RolodexError {
    /// Index registration attempted with a name that is already taken
    #[error("duplicate index: an index named '{name}' is already registered")]
    DuplicateIndex { name: String },

    /// Index registration attempted with an unusable argument
    #[error("invalid argument '{argument}': {message}")]
    InvalidArgument { argument: String, message: String },

    /// A strict accessor named an index that is not registered
    #[error("index not found: no index named '{name}' is registered")]
    IndexNotFound { name: String },

    /// A strict lookup named a derived key with no bucket in the index
    #[error("index key not found: index '{index}' has no bucket for key '{key}'")]
    IndexKeyNotFound { index: String, key: String },
}

impl RolodexError {
    /// Create a duplicate index error
    pub fn duplicate_index(name: impl Into<String>) -> Self {
        Self::DuplicateIndex { name: name.into() }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(argument: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument { argument: argument.to_string(), message: message.into() }
    }

    /// Create an index not found error
    pub fn index_not_found(name: impl Into<String>) -> Self {
        Self::IndexNotFound { name: name.into() }
    }

    /// Create an index key not found error
    pub fn index_key_not_found(index: impl Into<String>, key: impl Into<String>) -> Self {
        Self::IndexKeyNotFound { index: index.into(), key: key.into() }
    }

    /// Get the error category for logging and metrics
    pub fn category(&self) -> &'static str {
        match self {
            RolodexError::DuplicateIndex { .. } => "duplicate_index",
            RolodexError::InvalidArgument { .. } => "invalid_argument",
            RolodexError::IndexNotFound { .. } => "index_not_found",
            RolodexError::IndexKeyNotFound { .. } => "index_key_not_found",
        }
    }
}
