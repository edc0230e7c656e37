//! Directory moves and copies.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{InstallError, InstallResult};

/// Delete a file or a directory tree. A missing path is not an error.
pub(crate) fn remove_path(path: &Path) -> InstallResult<()> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };
    match result {
        Err(e) if e.kind() != ErrorKind::NotFound => Err(InstallError::io(path, e)),
        _ => Ok(()),
    }
}

/// Copy the tree at `from` to `to`, which must not exist. Symlinks are skipped.
pub(crate) fn copy_dir_all(from: &Path, to: &Path) -> InstallResult<()> {
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(from).to_path_buf();
            InstallError::io(path, e.into())
        })?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|_| InstallError::invalid_path(entry.path(), "outside the copied tree"))?;
        let target = to.join(relative);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| InstallError::io(&target, e))?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target).map_err(|e| InstallError::io(&target, e))?;
        } else {
            debug!(path = %entry.path().display(), "Skipping non-regular file");
        }
    }
    Ok(())
}

/// Rename `from` to `to`, copying across filesystems when rename cannot.
pub(crate) fn move_dir(from: &Path, to: &Path) -> InstallResult<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(InstallError::io(from, e)),
        Err(e) => {
            debug!(
                from = %from.display(),
                to = %to.display(),
                error = %e,
                "Rename failed, copying instead"
            );
            if let Err(copy_err) = copy_dir_all(from, to) {
                let _ = remove_path(to);
                return Err(copy_err);
            }
            remove_path(from)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_and_move() {
        let root = tempfile::tempdir().unwrap();
        let src = root.path().join("src");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::write(src.join("a/b/c.txt"), b"c").unwrap();
        fs::write(src.join("top.txt"), b"t").unwrap();

        let copy = root.path().join("copy");
        copy_dir_all(&src, &copy).unwrap();
        assert_eq!(fs::read(copy.join("a/b/c.txt")).unwrap(), b"c");
        assert!(src.join("top.txt").exists());

        let moved = root.path().join("moved");
        move_dir(&copy, &moved).unwrap();
        assert!(!copy.exists());
        assert_eq!(fs::read(moved.join("top.txt")).unwrap(), b"t");
    }

    #[test]
    fn test_move_missing_source() {
        let root = tempfile::tempdir().unwrap();
        let err = move_dir(&root.path().join("missing"), &root.path().join("to")).unwrap_err();
        assert!(matches!(err, InstallError::Io { .. }));
    }

    #[test]
    fn test_remove_path_tolerates_missing() {
        let root = tempfile::tempdir().unwrap();
        remove_path(&root.path().join("missing")).unwrap();
    }
}
