//! Scope guards for temporary files and directories.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// Deletes a file or directory tree when dropped, unless dismissed.
///
/// A path that no longer exists at drop time is not an error.
#[derive(Debug)]
#[must_use = "the path is deleted as soon as the guard is dropped"]
pub struct ScopedDeleter {
    path: Option<PathBuf>,
}

impl ScopedDeleter {
    /// Guard `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// The guarded path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or(Path::new(""))
    }

    /// Keep the path and return it.
    pub fn dismiss(mut self) -> PathBuf {
        self.path.take().unwrap_or_default()
    }
}

impl Drop for ScopedDeleter {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        let result = match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&path),
            Ok(_) => fs::remove_file(&path),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => debug!(path = %path.display(), "Removed temporary path"),
            Err(e) if e.kind() == ErrorKind::NotFound => {},
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove temporary path"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deletes_file_and_directory() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("pkg.xpk");
        let dir = root.path().join("unpacked");
        fs::write(&file, b"x").unwrap();
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested/a.txt"), b"a").unwrap();

        {
            let _file_guard = ScopedDeleter::new(&file);
            let _dir_guard = ScopedDeleter::new(&dir);
        }
        assert!(!file.exists());
        assert!(!dir.exists());
    }

    #[test]
    fn test_dismiss_keeps_path() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("keep.txt");
        fs::write(&file, b"x").unwrap();

        let guard = ScopedDeleter::new(&file);
        assert_eq!(guard.path(), file.as_path());
        assert_eq!(guard.dismiss(), file);
        assert!(file.exists());
    }

    #[test]
    fn test_missing_path_is_fine() {
        let root = tempfile::tempdir().unwrap();
        drop(ScopedDeleter::new(root.path().join("never-created")));
    }
}
