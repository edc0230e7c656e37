//! The persisted form of an installed application.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wharf_application::{ApplicationRecord, ApplicationResult};
use wharf_core::{AppId, ManifestType, PermissionStatus, SourceType, Version};
use wharf_manifest::{HandlerRegistries, ManifestDocument};

use crate::error::{StorageError, StorageResult};

/// Everything needed to rebuild an installed application's record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredApplication {
    /// Application id.
    pub id: AppId,
    /// Install directory.
    pub path: PathBuf,
    /// Manifest flavour at install time.
    pub manifest_type: ManifestType,
    /// Manifest source.
    pub source_type: SourceType,
    /// The manifest tree.
    pub manifest: Value,
    /// Declared version, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
    /// Persisted permission decisions.
    #[serde(default)]
    pub permissions: BTreeMap<String, PermissionStatus>,
    /// When this version was installed.
    pub installed_at: DateTime<Utc>,
    /// `blake3:<hex>` of the package file, for package installs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_digest: Option<String>,
}

impl StoredApplication {
    /// Snapshot a record, stamped with the current time.
    #[must_use]
    pub fn from_record(app: &ApplicationRecord) -> Self {
        Self {
            id: app.id().clone(),
            path: app.path().to_path_buf(),
            manifest_type: app.manifest_type(),
            source_type: app.manifest().source_type(),
            manifest: Value::Object(app.manifest().root().clone()),
            version: app.version().cloned(),
            permissions: app.permissions().clone(),
            installed_at: Utc::now(),
            package_digest: None,
        }
    }

    /// Attach the package digest.
    #[must_use]
    pub fn with_package_digest(mut self, digest: impl Into<String>) -> Self {
        self.package_digest = Some(digest.into());
        self
    }

    /// Rebuild the application record, permissions included.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupt`] if the stored manifest no longer
    /// produces a valid record.
    pub fn to_record(&self, registries: &HandlerRegistries) -> StorageResult<ApplicationRecord> {
        self.try_to_record(registries)
            .map_err(|e| StorageError::Corrupt {
                id: self.id.clone(),
                message: e.to_string(),
            })
    }

    fn try_to_record(&self, registries: &HandlerRegistries) -> ApplicationResult<ApplicationRecord> {
        let manifest = ManifestDocument::new(self.manifest.clone(), self.source_type)?;
        let mut app =
            ApplicationRecord::create(&self.path, Some(self.id.clone()), manifest, registries)?;
        app.set_permissions(self.permissions.clone());
        Ok(app)
    }
}
