//! Configuration types.
//!
//! Every struct implements [`Default`] with the same values as the embedded
//! `defaults.toml`, so a bare `[section]` header produces a working
//! configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where installed applications are recorded.
    pub storage: StorageSection,
    /// Installer policy and extraction limits.
    pub installer: InstallerSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// StorageSection
// ---------------------------------------------------------------------------

/// Application storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Backend: `"json"` or `"memory"`.
    pub backend: String,
    /// Root of the install layout. `None` uses the platform data directory
    /// (e.g. `$XDG_DATA_HOME/wharf`).
    pub data_dir: Option<PathBuf>,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: "json".to_owned(),
            data_dir: None,
        }
    }
}

impl StorageSection {
    /// The configured data directory, or the platform default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoDataDir`] if no directory is configured and
    /// the platform has none.
    pub fn resolve_data_dir(&self) -> ConfigResult<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        directories::ProjectDirs::from("org", "wharf", "wharf")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or(ConfigError::NoDataDir)
    }
}

// ---------------------------------------------------------------------------
// InstallerSection
// ---------------------------------------------------------------------------

/// Installer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerSection {
    /// Let widget packages replace an installed widget without a newer version.
    pub allow_widget_downgrade: bool,
    /// Maximum number of archive entries.
    pub max_entries: usize,
    /// Maximum total extracted bytes.
    pub max_extracted_bytes: u64,
    /// Widget id derivation: `"hash"` or `"trust"`.
    pub widget_id_policy: String,
}

impl Default for InstallerSection {
    fn default() -> Self {
        Self {
            allow_widget_downgrade: true,
            max_entries: 10_000,
            max_extracted_bytes: 500_000_000,
            widget_id_policy: "hash".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"` (human-friendly), `"compact"` (one-line),
    /// `"json"` (structured), or `"full"` (verbose).
    pub format: String,
    /// Per-crate tracing directives (e.g. `["wharf_installer=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
