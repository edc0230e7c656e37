//! On-disk layout of an installation root.

use std::fs;
use std::path::{Path, PathBuf};

use wharf_core::AppId;

use crate::error::{InstallError, InstallResult};

/// Directory holding one subdirectory per installed application.
pub const APPLICATIONS_DIR: &str = "applications";
/// Staging directory for installs.
pub const INSTALL_TEMP_DIR: &str = "install_temp";
/// Staging directory for updates.
pub const UPDATE_TEMP_DIR: &str = "update_temp";
/// JSON storage document.
pub const STORAGE_FILE: &str = "applications.json";
/// Suffix of the directory an installed version is moved to during an update.
pub const BACKUP_SUFFIX: &str = ".tmp";

/// Paths below a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    data_dir: PathBuf,
}

impl InstallLayout {
    /// Layout rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The root directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// `<data_dir>/applications`.
    #[must_use]
    pub fn applications_dir(&self) -> PathBuf {
        self.data_dir.join(APPLICATIONS_DIR)
    }

    /// `<data_dir>/applications/<id>`.
    #[must_use]
    pub fn app_dir(&self, id: &AppId) -> PathBuf {
        self.applications_dir().join(id.as_str())
    }

    /// `<data_dir>/applications/<id>.tmp`.
    #[must_use]
    pub fn backup_dir(&self, id: &AppId) -> PathBuf {
        self.applications_dir()
            .join(format!("{}{BACKUP_SUFFIX}", id.as_str()))
    }

    /// `<data_dir>/install_temp`.
    #[must_use]
    pub fn install_temp(&self) -> PathBuf {
        self.data_dir.join(INSTALL_TEMP_DIR)
    }

    /// `<data_dir>/update_temp`.
    #[must_use]
    pub fn update_temp(&self) -> PathBuf {
        self.data_dir.join(UPDATE_TEMP_DIR)
    }

    /// `<data_dir>/applications.json`.
    #[must_use]
    pub fn storage_file(&self) -> PathBuf {
        self.data_dir.join(STORAGE_FILE)
    }

    /// Create the applications and staging directories.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Io`] if a directory cannot be created.
    pub fn ensure(&self) -> InstallResult<()> {
        for dir in [
            self.applications_dir(),
            self.install_temp(),
            self.update_temp(),
        ] {
            fs::create_dir_all(&dir).map_err(|e| InstallError::io(&dir, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = InstallLayout::new("/var/lib/wharf");
        let id = AppId::new("demo").unwrap();
        assert_eq!(
            layout.app_dir(&id),
            PathBuf::from("/var/lib/wharf/applications/demo")
        );
        assert_eq!(
            layout.backup_dir(&id),
            PathBuf::from("/var/lib/wharf/applications/demo.tmp")
        );
        assert_eq!(
            layout.storage_file(),
            PathBuf::from("/var/lib/wharf/applications.json")
        );
    }

    #[test]
    fn test_ensure_creates_directories() {
        let root = tempfile::tempdir().unwrap();
        let layout = InstallLayout::new(root.path().join("data"));
        layout.ensure().unwrap();
        assert!(layout.applications_dir().is_dir());
        assert!(layout.install_temp().is_dir());
        assert!(layout.update_temp().is_dir());
    }
}
