//! Installer error types.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use wharf_core::AppId;

/// The platform hook that reported a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    /// Registration of a new application.
    Install,
    /// Registration of a new version.
    Update,
    /// Deregistration.
    Uninstall,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => write!(f, "install"),
            Self::Update => write!(f, "update"),
            Self::Uninstall => write!(f, "uninstall"),
        }
    }
}

/// Errors from install, update, uninstall and recovery.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The given path cannot be installed from.
    #[error("cannot use {path}: {reason}")]
    InvalidPath {
        /// Offending path.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// The package failed a structural or signature check.
    #[error("invalid package {path}: {reason}")]
    InvalidPackage {
        /// Package path.
        path: PathBuf,
        /// Reason reported by the reader.
        reason: String,
    },

    /// The id is already installed.
    #[error("application {id} is already installed")]
    AlreadyInstalled {
        /// Installed id.
        id: AppId,
    },

    /// The id is not installed.
    #[error("application {id} is not installed")]
    NotInstalled {
        /// Missing id.
        id: AppId,
    },

    /// An update package belongs to a different application.
    #[error("package id {found} does not match installed application {expected}")]
    IdMismatch {
        /// Id being updated.
        expected: AppId,
        /// Id of the package.
        found: AppId,
    },

    /// An update does not raise the version.
    #[error("version {candidate} of {id} is not newer than installed {installed}")]
    VersionNotNewer {
        /// Application id.
        id: AppId,
        /// Installed version, or `none`.
        installed: String,
        /// Package version, or `none`.
        candidate: String,
    },

    /// The widget id policy requires a signature chain validator.
    #[error("widget_id_policy \"trust\" requires a signature chain validator")]
    MissingSignatureValidator,

    /// A platform hook failed.
    #[error("platform {stage} hook failed: {message}")]
    PlatformHook {
        /// Which hook.
        stage: HookStage,
        /// Message from the hook.
        message: String,
    },

    /// Some uninstall steps failed; the others still ran.
    #[error("uninstall of {id} incomplete: {}", failures.join("; "))]
    UninstallIncomplete {
        /// Application id.
        id: AppId,
        /// One message per failed step.
        failures: Vec<String>,
    },

    /// A filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The application could not be loaded.
    #[error(transparent)]
    Application(#[from] wharf_application::ApplicationError),

    /// The handler registries could not be built.
    #[error(transparent)]
    Manifest(#[from] wharf_manifest::ManifestError),

    /// Extraction failed.
    #[error(transparent)]
    Package(#[from] wharf_package::PackageError),

    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] wharf_storage::StorageError),

    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] wharf_config::ConfigError),
}

impl InstallError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for installer operations.
pub type InstallResult<T> = Result<T, InstallError>;
