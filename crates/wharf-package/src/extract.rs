//! Safe zip extraction with path traversal protection.
//!
//! Guards against:
//! - Path traversal (`../` components) and absolute or prefixed entry names
//! - Symlink entries
//! - Excessive entry counts and extracted sizes (zip bomb protection)

use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Component, Path};

use tracing::debug;
use zip::ZipArchive;

use crate::error::{PackageError, PackageResult};

/// Default maximum number of entries in a package archive.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Default maximum total extracted size (500 MB).
pub const DEFAULT_MAX_EXTRACTED_BYTES: u64 = 500_000_000;

/// Limits applied while extracting an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionLimits {
    /// Maximum number of entries, directories included.
    pub max_entries: usize,
    /// Maximum sum of the uncompressed entry sizes.
    pub max_extracted_bytes: u64,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_extracted_bytes: DEFAULT_MAX_EXTRACTED_BYTES,
        }
    }
}

/// Extract every entry of `archive` below `dest`, returning the entry count.
///
/// # Errors
///
/// Returns [`PackageError::PathTraversal`] or [`PackageError::UnsafeEntryType`]
/// for hostile entries, [`PackageError::LimitExceeded`] when a limit is hit,
/// and [`PackageError::Archive`] or [`PackageError::Io`] on read or write
/// failures. Entries already written stay in `dest`; callers extract into a
/// directory they own and discard it on error.
pub(crate) fn extract_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    dest: &Path,
    limits: &ExtractionLimits,
) -> PackageResult<usize> {
    if archive.len() > limits.max_entries {
        return Err(PackageError::LimitExceeded {
            limit: format!("maximum entry count ({})", limits.max_entries),
        });
    }

    let mut total_size: u64 = 0;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(PackageError::archive)?;
        let raw_name = entry.name().to_string();

        if entry.is_symlink() {
            return Err(PackageError::UnsafeEntryType { path: raw_name });
        }

        validate_entry_path(&raw_name)?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| PackageError::PathTraversal {
                path: raw_name.clone(),
            })?;

        total_size = total_size.saturating_add(entry.size());
        if total_size > limits.max_extracted_bytes {
            return Err(PackageError::LimitExceeded {
                limit: format!(
                    "maximum extracted size ({} bytes)",
                    limits.max_extracted_bytes
                ),
            });
        }

        let target = dest.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| PackageError::io(&target, e))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| PackageError::io(parent, e))?;
        }
        let declared = entry.size();
        let mut out = File::create(&target).map_err(|e| PackageError::io(&target, e))?;
        io::copy(&mut (&mut entry).take(declared), &mut out)
            .map_err(|e| PackageError::io(&target, e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o755))
                .map_err(|e| PackageError::io(&target, e))?;
        }
    }

    debug!(
        entries = archive.len(),
        bytes = total_size,
        dest = %dest.display(),
        "Extracted archive"
    );
    Ok(archive.len())
}

/// Reject absolute names and names with parent, root or prefix components.
fn validate_entry_path(name: &str) -> PackageResult<()> {
    let path = Path::new(name);
    let escapes = path.is_absolute()
        || name.starts_with('/')
        || name.starts_with('\\')
        || path.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::Prefix(_) | Component::RootDir
            )
        });
    if escapes {
        return Err(PackageError::PathTraversal {
            path: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    use super::*;

    fn archive_with(entries: &[(&str, &[u8])]) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        ZipArchive::new(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_extracts_nested_files() {
        let dest = tempfile::tempdir().unwrap();
        let mut archive = archive_with(&[("index.html", b"<p>"), ("js/app.js", b"1;")]);
        let count = extract_archive(&mut archive, dest.path(), &ExtractionLimits::default()).unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            fs::read_to_string(dest.path().join("js/app.js")).unwrap(),
            "1;"
        );
    }

    #[test]
    fn test_rejects_parent_traversal() {
        let dest = tempfile::tempdir().unwrap();
        let mut archive = archive_with(&[("../evil.txt", b"x")]);
        let err =
            extract_archive(&mut archive, dest.path(), &ExtractionLimits::default()).unwrap_err();
        assert!(matches!(err, PackageError::PathTraversal { .. }));
        assert!(!dest.path().parent().unwrap().join("evil.txt").exists());
    }

    #[test]
    fn test_rejects_absolute_path() {
        assert!(validate_entry_path("/etc/passwd").is_err());
        assert!(validate_entry_path("a/../../b").is_err());
        assert!(validate_entry_path("a/b/c.txt").is_ok());
    }

    #[test]
    fn test_entry_count_limit() {
        let dest = tempfile::tempdir().unwrap();
        let mut archive = archive_with(&[("a", b"1"), ("b", b"2"), ("c", b"3")]);
        let limits = ExtractionLimits {
            max_entries: 2,
            ..ExtractionLimits::default()
        };
        let err = extract_archive(&mut archive, dest.path(), &limits).unwrap_err();
        assert!(matches!(err, PackageError::LimitExceeded { .. }));
    }

    #[test]
    fn test_size_limit() {
        let dest = tempfile::tempdir().unwrap();
        let mut archive = archive_with(&[("big.bin", &[0u8; 4096])]);
        let limits = ExtractionLimits {
            max_extracted_bytes: 1024,
            ..ExtractionLimits::default()
        };
        let err = extract_archive(&mut archive, dest.path(), &limits).unwrap_err();
        assert!(matches!(err, PackageError::LimitExceeded { .. }));
    }
}
