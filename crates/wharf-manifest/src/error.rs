//! Manifest error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a manifest or running the handler pipeline.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {path}: {message}")]
    Unreadable {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying failure.
        message: String,
    },

    /// The manifest file exceeds the size limit.
    #[error("manifest {path} is too large ({size} bytes, limit {limit})")]
    TooLarge {
        /// Path that was being read.
        path: PathBuf,
        /// Actual size in bytes.
        size: u64,
        /// Maximum accepted size in bytes.
        limit: u64,
    },

    /// The document text is not valid JSON or XML.
    #[error("failed to parse manifest: {message}")]
    Parse {
        /// Parser diagnostic.
        message: String,
    },

    /// A mandatory key is absent.
    #[error("manifest is missing required key '{key}'")]
    MissingKey {
        /// Dotted path of the missing key.
        key: String,
    },

    /// A key is present but holds an unusable value.
    #[error("invalid value for manifest key '{key}': {message}")]
    InvalidValue {
        /// Dotted path of the key.
        key: String,
        /// What is wrong with the value.
        message: String,
    },

    /// Handler prerequisites form a cycle.
    #[error("manifest handler prerequisites form a cycle between: {}", handlers.join(", "))]
    PrerequisiteCycle {
        /// Names of the handlers that could not be ordered.
        handlers: Vec<String>,
    },

    /// A handler names a prerequisite key that no registered handler owns.
    #[error("manifest handler '{handler}' requires unregistered key '{key}'")]
    UnknownPrerequisite {
        /// Handler declaring the prerequisite.
        handler: String,
        /// Key that is not registered.
        key: String,
    },

    /// A handler failed to parse its section.
    #[error("manifest handler '{handler}' failed: {message}")]
    HandlerFailed {
        /// Handler that failed.
        handler: String,
        /// Handler-supplied message.
        message: String,
    },

    /// A hard-validating handler rejected the application.
    #[error("manifest validation failed in '{handler}': {message}")]
    ValidationFailed {
        /// Handler that rejected the manifest.
        handler: String,
        /// Handler-supplied message.
        message: String,
    },
}

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;
