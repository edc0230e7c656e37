//! Package error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading, verifying, extracting or writing a package.
#[derive(Debug, Error)]
pub enum PackageError {
    /// The package file could not be read.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The extension does not name a known package format.
    #[error("unsupported package format: {path}")]
    UnsupportedFormat {
        /// Offending path.
        path: PathBuf,
    },

    /// The file is shorter than the fixed header.
    #[error("package is truncated: {size} bytes, header needs {required}")]
    Truncated {
        /// Actual file size.
        size: u64,
        /// Bytes required.
        required: u64,
    },

    /// The header does not start with the package magic.
    #[error("bad package magic")]
    BadMagic,

    /// A header size field is zero or exceeds its maximum.
    #[error("invalid {field} size {size} (maximum {max})")]
    InvalidFieldSize {
        /// Which field: `key` or `signature`.
        field: &'static str,
        /// Declared size.
        size: u32,
        /// Format maximum.
        max: u32,
    },

    /// The embedded public key or signature is malformed.
    #[error("invalid embedded {field}: {message}")]
    InvalidCredential {
        /// Which field: `key` or `signature`.
        field: &'static str,
        /// Reason.
        message: String,
    },

    /// The payload does not match the embedded signature.
    #[error("package signature verification failed")]
    SignatureMismatch,

    /// The archive could not be opened or read.
    #[error("invalid archive: {message}")]
    Archive {
        /// Reason.
        message: String,
    },

    /// The widget descriptor is missing or unusable.
    #[error("invalid package descriptor: {message}")]
    Descriptor {
        /// Reason.
        message: String,
    },

    /// The external signature chain rejected the package.
    #[error("signature chain rejected package: {message}")]
    UntrustedSignatureChain {
        /// Reason given by the validator.
        message: String,
    },

    /// An archive entry would land outside the extraction root.
    #[error("path traversal detected in archive entry: {path}")]
    PathTraversal {
        /// Raw entry name.
        path: String,
    },

    /// An archive entry is a symlink or other non-regular file.
    #[error("unsupported entry type for {path}")]
    UnsafeEntryType {
        /// Raw entry name.
        path: String,
    },

    /// The archive exceeds an extraction limit.
    #[error("archive exceeds {limit}")]
    LimitExceeded {
        /// Description of the limit.
        limit: String,
    },

    /// An operation needing a valid package was called on an invalid one.
    #[error("package {path} is not valid: {reason}")]
    NotValid {
        /// Package path.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// Signing failed while writing a package.
    #[error("signing failed: {0}")]
    Signing(#[from] wharf_crypto::CryptoError),
}

impl PackageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn archive(err: impl std::fmt::Display) -> Self {
        Self::Archive {
            message: err.to_string(),
        }
    }
}

/// Result type for package operations.
pub type PackageResult<T> = Result<T, PackageError>;
