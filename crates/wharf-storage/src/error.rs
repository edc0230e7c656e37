//! Storage error types.

use std::path::PathBuf;

use wharf_core::AppId;

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An application with this id is already stored.
    #[error("application {id} is already stored")]
    AlreadyExists {
        /// The duplicate id.
        id: AppId,
    },

    /// No application with this id is stored.
    #[error("application {id} is not stored")]
    NotFound {
        /// The missing id.
        id: AppId,
    },

    /// Reading or writing the backing file failed.
    #[error("storage I/O error on {path}: {message}")]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying failure.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The stored manifest cannot be turned back into a record.
    #[error("stored record for {id} is unusable: {message}")]
    Corrupt {
        /// Affected id.
        id: AppId,
        /// Reason.
        message: String,
    },

    /// A storage lock was poisoned.
    #[error("storage error: {0}")]
    Internal(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
