//! Core error types.

use thiserror::Error;

/// Errors produced while validating core identity types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The application id is not usable as an identifier.
    #[error("invalid application id '{id}': {reason}")]
    InvalidAppId {
        /// The rejected id.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A permission status string was not recognized.
    #[error("unknown permission status: {0}")]
    UnknownPermissionStatus(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
