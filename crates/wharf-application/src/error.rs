//! Application construction errors.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use wharf_manifest::ManifestError;

/// Step of record construction at which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructionStage {
    /// Assigning or checking the application id.
    IdAssignment,
    /// Whole-manifest checks before any field is read.
    ManifestValidation,
    /// Reading name, version and description.
    CoreFields,
    /// Running handler parse passes.
    HandlerParse,
    /// Running handler validate passes.
    HandlerValidation,
}

impl fmt::Display for ConstructionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::IdAssignment => "id assignment",
            Self::ManifestValidation => "manifest validation",
            Self::CoreFields => "core fields",
            Self::HandlerParse => "handler parse",
            Self::HandlerValidation => "handler validation",
        };
        f.write_str(name)
    }
}

/// Errors produced while building or loading an application record.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// The supplied or derived id is unusable.
    #[error("invalid application id '{id}': {reason}")]
    InvalidId {
        /// Offending id.
        id: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The manifest declares both a CSP and WARP access rules.
    #[error("manifest declares both a content security policy and access rules")]
    ConflictingSecurityPolicies,

    /// A required field is absent.
    #[error("manifest is missing required field '{field}'")]
    MissingField {
        /// Dotted path of the field.
        field: String,
    },

    /// The version string is malformed.
    #[error("invalid version '{value}': {message}")]
    InvalidVersion {
        /// Version as written.
        value: String,
        /// Parser diagnostic.
        message: String,
    },

    /// The handler pipeline rejected the manifest.
    #[error("{stage} failed: {source}")]
    Manifest {
        /// Stage that failed.
        stage: ConstructionStage,
        /// Underlying manifest error.
        #[source]
        source: ManifestError,
    },

    /// No manifest file was found in an application directory.
    #[error("no manifest.json or config.xml in {path}")]
    ManifestNotFound {
        /// Directory that was searched.
        path: PathBuf,
    },

    /// The manifest file could not be loaded.
    #[error("failed to load manifest: {0}")]
    Load(#[from] ManifestError),
}

impl ApplicationError {
    /// The construction stage this error belongs to, if any.
    #[must_use]
    pub fn stage(&self) -> Option<ConstructionStage> {
        match self {
            Self::InvalidId { .. } => Some(ConstructionStage::IdAssignment),
            Self::ConflictingSecurityPolicies => Some(ConstructionStage::ManifestValidation),
            Self::MissingField { .. } | Self::InvalidVersion { .. } => {
                Some(ConstructionStage::CoreFields)
            },
            Self::Manifest { stage, .. } => Some(*stage),
            Self::ManifestNotFound { .. } | Self::Load(_) => None,
        }
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
