//! Loading an application from an unpacked directory.

use std::path::{Path, PathBuf};

use tracing::info;
use wharf_core::{AppId, SourceType};
use wharf_manifest::{HandlerRegistries, ManifestDocument, keys};

use crate::error::{ApplicationError, ApplicationResult};
use crate::record::ApplicationRecord;

/// Locate the manifest of an application directory.
///
/// `manifest.json` takes precedence over `config.xml`.
#[must_use]
pub fn find_manifest(dir: &Path) -> Option<PathBuf> {
    [keys::JSON_MANIFEST_FILE, keys::WIDGET_MANIFEST_FILE]
        .into_iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Load the manifest in `dir` and build its record.
///
/// # Errors
///
/// Returns [`ApplicationError::ManifestNotFound`] if the directory has no
/// manifest, [`ApplicationError::Load`] if it cannot be read, or any
/// construction error.
pub fn load_application(
    dir: &Path,
    explicit_id: Option<AppId>,
    source_type: SourceType,
    registries: &HandlerRegistries,
) -> ApplicationResult<ApplicationRecord> {
    let manifest_path = find_manifest(dir).ok_or_else(|| ApplicationError::ManifestNotFound {
        path: dir.to_path_buf(),
    })?;
    let manifest = ManifestDocument::load(&manifest_path, source_type)?;
    let app = ApplicationRecord::create(dir, explicit_id, manifest, registries)?;
    info!(
        app_id = %app.id(),
        manifest = %manifest_path.display(),
        manifest_type = %app.manifest_type(),
        "Loaded application"
    );
    Ok(app)
}
