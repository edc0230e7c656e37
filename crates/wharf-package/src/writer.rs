//! Building packages from a source directory.

use std::fs::File;
use std::io::{self, BufWriter, Cursor, Seek, Write};
use std::path::Path;

use tracing::{info, warn};
use walkdir::WalkDir;
use wharf_crypto::{KeyPair, PUBLIC_KEY_LEN, SIGNATURE_LEN};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{PackageError, PackageResult};
use crate::format::SignedHeader;

/// Zip `source_dir` into a widget archive at `dest`.
///
/// # Errors
///
/// Returns [`PackageError::Io`] or [`PackageError::Archive`] on failure.
pub fn write_widget_package(source_dir: &Path, dest: &Path) -> PackageResult<()> {
    let file = File::create(dest).map_err(|e| PackageError::io(dest, e))?;
    let mut writer = zip_directory(source_dir, BufWriter::new(file))?;
    writer.flush().map_err(|e| PackageError::io(dest, e))?;
    info!(source = %source_dir.display(), dest = %dest.display(), "Wrote widget package");
    Ok(())
}

/// Zip `source_dir`, sign the archive with `key` and write a signed package
/// to `dest`.
///
/// # Errors
///
/// Returns [`PackageError::Io`], [`PackageError::Archive`] or
/// [`PackageError::Signing`] on failure.
pub fn write_signed_package(source_dir: &Path, key: &KeyPair, dest: &Path) -> PackageResult<()> {
    let payload = zip_directory(source_dir, Cursor::new(Vec::new()))?.into_inner();

    let mut signer = key.streaming_signer();
    signer.update(&payload);
    let signature = signer.finalize()?;

    let header = SignedHeader {
        key_size: field_len(PUBLIC_KEY_LEN)?,
        signature_size: field_len(SIGNATURE_LEN)?,
    };

    let mut out = BufWriter::new(File::create(dest).map_err(|e| PackageError::io(dest, e))?);
    out.write_all(&header.to_bytes())
        .and_then(|()| out.write_all(key.public_key_bytes()))
        .and_then(|()| out.write_all(signature.as_bytes()))
        .and_then(|()| out.write_all(&payload))
        .and_then(|()| out.flush())
        .map_err(|e| PackageError::io(dest, e))?;

    info!(
        source = %source_dir.display(),
        dest = %dest.display(),
        key_id = %key.key_id_hex(),
        "Wrote signed package"
    );
    Ok(())
}

fn field_len(len: usize) -> PackageResult<u32> {
    u32::try_from(len).map_err(|_| PackageError::Archive {
        message: format!("field length {len} does not fit the header"),
    })
}

/// Write every regular file and directory under `source_dir` into a zip.
///
/// Entry names use `/` separators and are sorted for reproducible output.
/// Symlinks are skipped.
fn zip_directory<W: Write + Seek>(source_dir: &Path, writer: W) -> PackageResult<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(PackageError::archive)?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(PackageError::archive)?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let file_type = entry.file_type();
        if file_type.is_dir() {
            zip.add_directory(name, options)
                .map_err(PackageError::archive)?;
        } else if file_type.is_file() {
            zip.start_file(name, options)
                .map_err(PackageError::archive)?;
            let mut input = File::open(entry.path()).map_err(|e| PackageError::io(entry.path(), e))?;
            io::copy(&mut input, &mut zip).map_err(|e| PackageError::io(entry.path(), e))?;
        } else {
            warn!(path = %entry.path().display(), "Skipping non-regular file");
        }
    }

    zip.finish().map_err(PackageError::archive)
}
