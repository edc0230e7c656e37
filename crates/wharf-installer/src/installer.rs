//! The install, update and uninstall transactions.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use wharf_application::{ApplicationRecord, load_application};
use wharf_config::Config;
use wharf_core::{AppId, PermissionStatus, SourceType, Version};
use wharf_manifest::HandlerRegistries;
use wharf_package::{
    ExtractionLimits, Package, PackageOptions, SignatureChainValidator, WidgetIdPolicy,
};
use wharf_storage::{ApplicationStorage, JsonFileStorage, MemoryStorage, StoredApplication};

use crate::error::{HookStage, InstallError, InstallResult};
use crate::fsutil::{copy_dir_all, move_dir, remove_path};
use crate::guard::ScopedDeleter;
use crate::hooks::{NoopPlatformHooks, PlatformHooks};
use crate::layout::{BACKUP_SUFFIX, InstallLayout};

/// Installer behaviour switches.
#[derive(Debug, Clone)]
pub struct InstallerOptions {
    /// Let a widget package replace an installed widget without raising the
    /// version.
    pub allow_widget_downgrade: bool,
    /// Limits applied while extracting packages.
    pub limits: ExtractionLimits,
    /// Widget id derivation.
    pub widget_id_policy: WidgetIdPolicy,
}

impl Default for InstallerOptions {
    fn default() -> Self {
        Self {
            allow_widget_downgrade: true,
            limits: ExtractionLimits::default(),
            widget_id_policy: WidgetIdPolicy::default(),
        }
    }
}

/// What [`PackageInstaller::continue_unfinished_tasks`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Applications installed from leftover staging files.
    pub installed: Vec<AppId>,
    /// Applications updated from leftover staging files.
    pub updated: Vec<AppId>,
    /// Backup directories moved back into place.
    pub restored: Vec<AppId>,
    /// Backup directories deleted because a newer tree was in place.
    pub discarded: Vec<AppId>,
    /// Leftover tasks that could not be completed.
    pub failures: Vec<String>,
}

impl RecoveryReport {
    /// True when nothing was left to do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
            && self.updated.is_empty()
            && self.restored.is_empty()
            && self.discarded.is_empty()
            && self.failures.is_empty()
    }
}

/// An application tree ready to be moved into place.
struct Staged {
    id: AppId,
    tree: StagedTree,
    source_type: SourceType,
    digest: Option<String>,
    manifest_type_is_widget: bool,
    version: Option<Version>,
}

enum StagedTree {
    /// A directory the user pointed at; copied, never moved.
    Directory(PathBuf),
    /// An extraction directory owned by the installer.
    Extracted(ScopedDeleter),
}

/// Installs packages below an [`InstallLayout`] and records them in an
/// [`ApplicationStorage`].
pub struct PackageInstaller {
    layout: InstallLayout,
    storage: Arc<dyn ApplicationStorage>,
    registries: HandlerRegistries,
    hooks: Arc<dyn PlatformHooks>,
    options: InstallerOptions,
}

impl std::fmt::Debug for PackageInstaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageInstaller")
            .field("layout", &self.layout)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl PackageInstaller {
    /// Create an installer with no-op platform hooks and default options.
    #[must_use]
    pub fn new(
        layout: InstallLayout,
        storage: Arc<dyn ApplicationStorage>,
        registries: HandlerRegistries,
    ) -> Self {
        Self {
            layout,
            storage,
            registries,
            hooks: Arc::new(NoopPlatformHooks),
            options: InstallerOptions::default(),
        }
    }

    /// Build an installer from a loaded [`Config`].
    ///
    /// `chain_validator` is required when `installer.widget_id_policy` is
    /// `"trust"`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::MissingSignatureValidator`] for the trust policy
    /// without a validator, or the error resolving the data directory or
    /// building the handler registries.
    pub fn from_config(
        config: &Config,
        chain_validator: Option<Arc<dyn SignatureChainValidator>>,
    ) -> InstallResult<Self> {
        let layout = InstallLayout::new(config.storage.resolve_data_dir()?);
        let storage: Arc<dyn ApplicationStorage> = match config.storage.backend.as_str() {
            "memory" => Arc::new(MemoryStorage::new()),
            _ => Arc::new(JsonFileStorage::new(layout.storage_file())),
        };
        let widget_id_policy = match (config.installer.widget_id_policy.as_str(), chain_validator) {
            ("trust", Some(validator)) => WidgetIdPolicy::TrustSignatureChain(validator),
            ("trust", None) => return Err(InstallError::MissingSignatureValidator),
            _ => WidgetIdPolicy::HashDeclaredId,
        };
        let options = InstallerOptions {
            allow_widget_downgrade: config.installer.allow_widget_downgrade,
            limits: ExtractionLimits {
                max_entries: config.installer.max_entries,
                max_extracted_bytes: config.installer.max_extracted_bytes,
            },
            widget_id_policy,
        };
        debug!(
            data_dir = %layout.data_dir().display(),
            backend = %config.storage.backend,
            "Configured package installer"
        );
        Ok(Self::new(layout, storage, HandlerRegistries::standard()?).with_options(options))
    }

    /// Replace the platform hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: Arc<dyn PlatformHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: InstallerOptions) -> Self {
        self.options = options;
        self
    }

    /// The on-disk layout.
    #[must_use]
    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    /// The storage backend.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn ApplicationStorage> {
        &self.storage
    }

    /// Rebuild the record of an installed application.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::NotInstalled`] for an unknown id, or the
    /// storage error.
    pub fn application(&self, id: &AppId) -> InstallResult<ApplicationRecord> {
        let stored = self
            .storage
            .get(id)?
            .ok_or_else(|| InstallError::NotInstalled { id: id.clone() })?;
        Ok(stored.to_record(&self.registries)?)
    }

    /// Install a package file or an unpacked application directory.
    ///
    /// Directory installs copy the tree and derive the id from the
    /// directory's path.
    ///
    /// # Errors
    ///
    /// Fails without leaving anything behind when the path is unusable, the
    /// package is invalid, the manifest does not load, the id is already
    /// installed, or storage or the platform hook rejects the application.
    pub fn install(&self, path: &Path) -> InstallResult<AppId> {
        if !path.exists() {
            return Err(InstallError::invalid_path(path, "path does not exist"));
        }
        self.layout.ensure()?;

        // The staged package copy lives until the install finishes.
        let (staged, _staged_file) = if path.is_dir() {
            let dir = path.canonicalize().map_err(|e| InstallError::io(path, e))?;
            let app = load_application(&dir, None, SourceType::Local, &self.registries)?;
            let staged = Staged {
                id: app.id().clone(),
                tree: StagedTree::Directory(dir),
                source_type: SourceType::Local,
                digest: None,
                manifest_type_is_widget: app.manifest_type().is_widget(),
                version: app.version().cloned(),
            };
            (staged, None)
        } else {
            let file = stage_file(path, &self.layout.install_temp())?;
            (self.extract_package(file.path(), None)?, Some(file))
        };

        let id = staged.id.clone();
        if self.storage.contains(&id)? {
            return Err(InstallError::AlreadyInstalled { id });
        }

        let app_dir = self.layout.app_dir(&id);
        if app_dir.exists() {
            warn!(app_id = %id, path = %app_dir.display(), "Removing stale application directory");
            remove_path(&app_dir)?;
        }
        let app_guard = ScopedDeleter::new(&app_dir);
        match &staged.tree {
            StagedTree::Directory(src) => copy_dir_all(src, &app_dir)?,
            StagedTree::Extracted(dir) => move_dir(dir.path(), &app_dir)?,
        }

        let mut app = load_application(
            &app_dir,
            Some(id.clone()),
            staged.source_type,
            &self.registries,
        )?;
        seed_permissions(&mut app, None);

        let mut record = StoredApplication::from_record(&app);
        if let Some(digest) = staged.digest {
            record = record.with_package_digest(digest);
        }
        self.storage.add(record)?;

        if let Err(message) = self.hooks.install(&app) {
            if let Err(e) = self.storage.remove(&id) {
                error!(app_id = %id, error = %e, "Failed to remove application after hook failure");
            }
            return Err(InstallError::PlatformHook {
                stage: HookStage::Install,
                message,
            });
        }

        app_guard.dismiss();
        info!(
            app_id = %id,
            name = %app.name(),
            path = %app_dir.display(),
            "Installed application"
        );
        Ok(id)
    }

    /// Replace an installed application with a newer package.
    ///
    /// On failure the previous tree and storage record are restored. If the
    /// storage record cannot be restored after the platform hook failed, the
    /// application is removed entirely.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::IdMismatch`] for a package of another
    /// application, [`InstallError::VersionNotNewer`] when the version does
    /// not increase, or the failing step's error.
    pub fn update(&self, id: &AppId, path: &Path) -> InstallResult<()> {
        if path.is_dir() {
            return Err(InstallError::invalid_path(
                path,
                "updates require a package file",
            ));
        }
        if !path.is_file() {
            return Err(InstallError::invalid_path(path, "path does not exist"));
        }
        self.layout.ensure()?;

        let old = self
            .storage
            .get(id)?
            .ok_or_else(|| InstallError::NotInstalled { id: id.clone() })?;

        let file = stage_file(path, &self.layout.update_temp())?;
        let staged = self.extract_package(file.path(), Some(id))?;
        self.check_version(id, &staged, old.version.as_ref())?;

        let StagedTree::Extracted(extracted) = &staged.tree else {
            return Err(InstallError::invalid_path(path, "updates require a package file"));
        };

        let app_dir = self.layout.app_dir(id);
        let backup = self.layout.backup_dir(id);
        if backup.exists() {
            warn!(app_id = %id, path = %backup.display(), "Removing stale update backup");
            remove_path(&backup)?;
        }
        move_dir(&app_dir, &backup)?;

        let app = match self.place_update(id, extracted.path(), &app_dir, &old, staged.digest) {
            Ok(app) => app,
            Err(e) => {
                restore_backup(&app_dir, &backup);
                return Err(e);
            },
        };

        if let Err(message) = self.hooks.update(&app) {
            self.revert_update(id, &app_dir, &backup, old);
            return Err(InstallError::PlatformHook {
                stage: HookStage::Update,
                message,
            });
        }

        if let Err(e) = remove_path(&backup) {
            warn!(app_id = %id, error = %e, "Failed to delete previous version");
        }
        info!(
            app_id = %id,
            from = %display_version(old.version.as_ref()),
            to = %display_version(app.version()),
            "Updated application"
        );
        Ok(())
    }

    /// Remove an installed application.
    ///
    /// Every step runs even if an earlier one failed.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::NotInstalled`] for an unknown id, or
    /// [`InstallError::UninstallIncomplete`] listing the steps that failed.
    pub fn uninstall(&self, id: &AppId) -> InstallResult<()> {
        if self.storage.get(id)?.is_none() {
            return Err(InstallError::NotInstalled { id: id.clone() });
        }

        let mut failures = Vec::new();
        if let Err(e) = self.storage.remove(id) {
            failures.push(format!("storage: {e}"));
        }
        let app_dir = self.layout.app_dir(id);
        if app_dir.exists()
            && let Err(e) = remove_path(&app_dir)
        {
            failures.push(format!("directory: {e}"));
        }
        if let Err(message) = self.hooks.uninstall(id) {
            failures.push(format!("platform {} hook: {message}", HookStage::Uninstall));
        }

        if failures.is_empty() {
            info!(app_id = %id, "Uninstalled application");
            Ok(())
        } else {
            warn!(app_id = %id, failures = ?failures, "Uninstall incomplete");
            Err(InstallError::UninstallIncomplete {
                id: id.clone(),
                failures,
            })
        }
    }

    /// Finish or clean up operations interrupted by a crash.
    ///
    /// Leftover update backups are restored when the application directory
    /// is missing and discarded otherwise. Staged install files are
    /// installed; staged update files are installed, or used to update an
    /// application that is already present. Both staging directories are
    /// emptied afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error only if the layout cannot be created or read; the
    /// outcome of each leftover task is in the report.
    pub fn continue_unfinished_tasks(&self) -> InstallResult<RecoveryReport> {
        self.layout.ensure()?;
        let mut report = RecoveryReport::default();

        self.recover_backups(&mut report)?;

        for file in staged_files(&self.layout.install_temp())? {
            match self.install(&file) {
                Ok(id) => report.installed.push(id),
                Err(e) => report
                    .failures
                    .push(format!("install {}: {e}", file.display())),
            }
        }

        for file in staged_files(&self.layout.update_temp())? {
            match self.install(&file) {
                Ok(id) => report.installed.push(id),
                Err(install_err) => {
                    let id = Package::open_with(&file, self.package_options(None))
                        .id()
                        .cloned();
                    match id {
                        Some(id) if self.storage.contains(&id)? => match self.update(&id, &file) {
                            Ok(()) => report.updated.push(id),
                            Err(e) => report
                                .failures
                                .push(format!("update {}: {e}", file.display())),
                        },
                        _ => report
                            .failures
                            .push(format!("install {}: {install_err}", file.display())),
                    }
                },
            }
        }

        for dir in [self.layout.install_temp(), self.layout.update_temp()] {
            empty_dir(&dir);
        }

        if report.is_empty() {
            debug!("No unfinished installer tasks");
        } else {
            info!(
                installed = report.installed.len(),
                updated = report.updated.len(),
                restored = report.restored.len(),
                discarded = report.discarded.len(),
                failures = report.failures.len(),
                "Recovered unfinished installer tasks"
            );
        }
        Ok(report)
    }

    fn recover_backups(&self, report: &mut RecoveryReport) -> InstallResult<()> {
        let apps_dir = self.layout.applications_dir();
        let entries = fs::read_dir(&apps_dir).map_err(|e| InstallError::io(&apps_dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| InstallError::io(&apps_dir, e))?;
            let name = entry.file_name();
            let Some(id) = name
                .to_str()
                .and_then(|name| name.strip_suffix(BACKUP_SUFFIX))
                .and_then(|id| AppId::new(id).ok())
            else {
                continue;
            };
            let backup = entry.path();
            let app_dir = self.layout.app_dir(&id);
            if app_dir.exists() {
                match remove_path(&backup) {
                    Ok(()) => report.discarded.push(id),
                    Err(e) => report.failures.push(e.to_string()),
                }
            } else {
                match move_dir(&backup, &app_dir) {
                    Ok(()) => {
                        warn!(app_id = %id, "Restored application from interrupted update");
                        report.restored.push(id);
                    },
                    Err(e) => report.failures.push(e.to_string()),
                }
            }
        }
        Ok(())
    }

    fn package_options(&self, extract_root: Option<PathBuf>) -> PackageOptions {
        PackageOptions {
            extract_root,
            limits: self.options.limits,
            widget_id_policy: self.options.widget_id_policy.clone(),
        }
    }

    /// Verify, extract and load a staged package.
    fn extract_package(&self, file: &Path, expected: Option<&AppId>) -> InstallResult<Staged> {
        let root = file.parent().map(Path::to_path_buf);
        let mut package = Package::open_with(file, self.package_options(root));
        if let Some(err) = package.error() {
            return Err(InstallError::InvalidPackage {
                path: file.to_path_buf(),
                reason: err.to_string(),
            });
        }
        let id = package
            .id()
            .cloned()
            .ok_or_else(|| InstallError::InvalidPackage {
                path: file.to_path_buf(),
                reason: "package has no id".to_owned(),
            })?;
        if let Some(expected) = expected
            && *expected != id
        {
            return Err(InstallError::IdMismatch {
                expected: expected.clone(),
                found: id,
            });
        }
        let digest = package.digest()?.to_prefixed();

        package.extract()?;
        let extracted = ScopedDeleter::new(package.dismiss().unwrap_or_default());
        let app = load_application(
            extracted.path(),
            Some(id.clone()),
            SourceType::Internal,
            &self.registries,
        )?;
        Ok(Staged {
            id,
            source_type: SourceType::Internal,
            digest: Some(digest),
            manifest_type_is_widget: app.manifest_type().is_widget(),
            version: app.version().cloned(),
            tree: StagedTree::Extracted(extracted),
        })
    }

    fn check_version(
        &self,
        id: &AppId,
        staged: &Staged,
        installed: Option<&Version>,
    ) -> InstallResult<()> {
        if staged.manifest_type_is_widget && self.options.allow_widget_downgrade {
            return Ok(());
        }
        let newer = match (staged.version.as_ref(), installed) {
            (Some(candidate), Some(installed)) => candidate.is_newer_than(installed),
            (Some(_), None) => true,
            (None, _) => false,
        };
        if newer {
            Ok(())
        } else {
            Err(InstallError::VersionNotNewer {
                id: id.clone(),
                installed: display_version(installed),
                candidate: display_version(staged.version.as_ref()),
            })
        }
    }

    /// Move the new tree into place, reload it and update storage.
    fn place_update(
        &self,
        id: &AppId,
        extracted: &Path,
        app_dir: &Path,
        old: &StoredApplication,
        digest: Option<String>,
    ) -> InstallResult<ApplicationRecord> {
        move_dir(extracted, app_dir)?;
        let mut app = load_application(
            app_dir,
            Some(id.clone()),
            SourceType::Internal,
            &self.registries,
        )?;
        seed_permissions(&mut app, Some(&old.permissions));

        let mut record = StoredApplication::from_record(&app);
        record.installed_at = old.installed_at;
        if let Some(digest) = digest {
            record = record.with_package_digest(digest);
        }
        self.storage.update(record)?;
        Ok(app)
    }

    /// Undo an update whose platform hook failed.
    fn revert_update(&self, id: &AppId, app_dir: &Path, backup: &Path, old: StoredApplication) {
        if let Err(e) = self.storage.update(old) {
            error!(
                app_id = %id,
                error = %e,
                "Failed to revert storage record, removing application"
            );
            if let Err(e) = self.storage.remove(id) {
                error!(app_id = %id, error = %e, "Failed to remove application from storage");
            }
            for dir in [app_dir, backup] {
                if let Err(e) = remove_path(dir) {
                    error!(path = %dir.display(), error = %e, "Failed to delete application files");
                }
            }
            return;
        }
        restore_backup(app_dir, backup);
    }
}

/// Copy `source` into `temp_dir` unless it already lives there.
fn stage_file(source: &Path, temp_dir: &Path) -> InstallResult<ScopedDeleter> {
    let name = source
        .file_name()
        .ok_or_else(|| InstallError::invalid_path(source, "path has no file name"))?;
    let staged = temp_dir.join(name);
    let already_staged =
        staged.exists() && source.canonicalize().ok() == staged.canonicalize().ok();
    if !already_staged {
        fs::copy(source, &staged).map_err(|e| InstallError::io(&staged, e))?;
        debug!(from = %source.display(), to = %staged.display(), "Staged package");
    }
    Ok(ScopedDeleter::new(staged))
}

/// Start every requested permission at `Prompt`, keeping earlier decisions.
fn seed_permissions(
    app: &mut ApplicationRecord,
    previous: Option<&BTreeMap<String, PermissionStatus>>,
) {
    let seeded = app
        .requested_permissions()
        .into_iter()
        .map(|name| {
            let status = previous
                .and_then(|p| p.get(&name))
                .copied()
                .unwrap_or(PermissionStatus::Prompt);
            (name, status)
        })
        .collect();
    app.set_permissions(seeded);
}

/// Put the backup back at `app_dir`, dropping whatever is there now.
fn restore_backup(app_dir: &Path, backup: &Path) {
    if let Err(e) = remove_path(app_dir) {
        error!(path = %app_dir.display(), error = %e, "Failed to delete new version");
    }
    match move_dir(backup, app_dir) {
        Ok(()) => debug!(path = %app_dir.display(), "Restored previous version"),
        Err(e) => error!(path = %backup.display(), error = %e, "Failed to restore previous version"),
    }
}

fn display_version(version: Option<&Version>) -> String {
    version.map_or_else(|| "none".to_owned(), ToString::to_string)
}

/// Regular files directly inside `dir`, sorted by name.
fn staged_files(dir: &Path) -> InstallResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| InstallError::io(dir, e))? {
        let entry = entry.map_err(|e| InstallError::io(dir, e))?;
        if entry.file_type().is_ok_and(|t| t.is_file()) {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn empty_dir(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if let Err(e) = remove_path(&path) {
            warn!(path = %path.display(), error = %e, "Failed to clean staging directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use wharf_crypto::KeyPair;
    use wharf_package::write_signed_package;

    use super::*;

    /// Hooks whose update (or install) step can be made to fail.
    #[derive(Default)]
    struct FlakyHooks {
        fail_install: AtomicBool,
        fail_update: AtomicBool,
        fail_uninstall: AtomicBool,
    }

    impl PlatformHooks for FlakyHooks {
        fn install(&self, _app: &ApplicationRecord) -> Result<(), String> {
            if self.fail_install.load(Ordering::SeqCst) {
                return Err("install refused".to_owned());
            }
            Ok(())
        }

        fn update(&self, _app: &ApplicationRecord) -> Result<(), String> {
            if self.fail_update.load(Ordering::SeqCst) {
                return Err("update refused".to_owned());
            }
            Ok(())
        }

        fn uninstall(&self, _id: &AppId) -> Result<(), String> {
            if self.fail_uninstall.load(Ordering::SeqCst) {
                return Err("uninstall refused".to_owned());
            }
            Ok(())
        }
    }

    struct Fixture {
        root: tempfile::TempDir,
        key: KeyPair,
        hooks: Arc<FlakyHooks>,
        installer: PackageInstaller,
    }

    fn fixture() -> Fixture {
        let root = tempfile::tempdir().unwrap();
        let hooks = Arc::new(FlakyHooks::default());
        let installer = PackageInstaller::new(
            InstallLayout::new(root.path().join("data")),
            Arc::new(MemoryStorage::new()),
            HandlerRegistries::standard().unwrap(),
        )
        .with_hooks(hooks.clone());
        Fixture {
            root,
            key: KeyPair::generate(),
            hooks,
            installer,
        }
    }

    impl Fixture {
        fn package(&self, name: &str, version: &str, permissions: &[&str]) -> PathBuf {
            let src = self.root.path().join(format!("src-{name}-{version}"));
            fs::create_dir_all(&src).unwrap();
            fs::write(src.join("index.html"), version).unwrap();
            let manifest = serde_json::json!({
                "name": name,
                "xwalk_version": version,
                "start_url": "index.html",
                "permissions": permissions,
            });
            fs::write(src.join("manifest.json"), manifest.to_string()).unwrap();
            let out = self.root.path().join(format!("{name}-{version}.xpk"));
            write_signed_package(&src, &self.key, &out).unwrap();
            out
        }
    }

    #[test]
    fn test_install_signed_package() {
        let f = fixture();
        let pkg = f.package("demo", "1.0", &["notifications"]);
        let id = f.installer.install(&pkg).unwrap();

        assert_eq!(id, AppId::from_public_key(f.key.public_key_bytes()));
        let app_dir = f.installer.layout().app_dir(&id);
        assert_eq!(fs::read_to_string(app_dir.join("index.html")).unwrap(), "1.0");

        let stored = f.installer.storage().get(&id).unwrap().unwrap();
        assert_eq!(stored.path, app_dir);
        assert!(stored.package_digest.unwrap().starts_with("blake3:"));
        assert_eq!(
            stored.permissions.get("notifications"),
            Some(&PermissionStatus::Prompt)
        );

        let app = f.installer.application(&id).unwrap();
        assert_eq!(app.name(), "demo");
        // Staging leaves nothing behind.
        assert_eq!(fs::read_dir(f.installer.layout().install_temp()).unwrap().count(), 0);
    }

    #[test]
    fn test_install_duplicate_fails_without_touching_disk() {
        let f = fixture();
        let pkg = f.package("demo", "1.0", &[]);
        let id = f.installer.install(&pkg).unwrap();
        let marker = f.installer.layout().app_dir(&id).join("marker");
        fs::write(&marker, b"keep").unwrap();

        let err = f.installer.install(&pkg).unwrap_err();
        assert!(matches!(err, InstallError::AlreadyInstalled { .. }));
        assert!(marker.exists());
    }

    #[test]
    fn test_install_missing_path() {
        let f = fixture();
        let err = f
            .installer
            .install(&f.root.path().join("nope.xpk"))
            .unwrap_err();
        assert!(matches!(err, InstallError::InvalidPath { .. }));
    }

    #[test]
    fn test_install_invalid_package() {
        let f = fixture();
        let bogus = f.root.path().join("bogus.xpk");
        fs::write(&bogus, b"definitely not a package").unwrap();
        let err = f.installer.install(&bogus).unwrap_err();
        assert!(matches!(err, InstallError::InvalidPackage { .. }));
        assert!(f.installer.storage().ids().unwrap().is_empty());
    }

    #[test]
    fn test_install_hook_failure_rolls_back() {
        let f = fixture();
        f.hooks.fail_install.store(true, Ordering::SeqCst);
        let pkg = f.package("demo", "1.0", &[]);

        let err = f.installer.install(&pkg).unwrap_err();
        assert!(matches!(
            err,
            InstallError::PlatformHook {
                stage: HookStage::Install,
                ..
            }
        ));
        let id = AppId::from_public_key(f.key.public_key_bytes());
        assert!(!f.installer.storage().contains(&id).unwrap());
        assert!(!f.installer.layout().app_dir(&id).exists());
    }

    #[test]
    fn test_install_directory() {
        let f = fixture();
        let src = f.root.path().join("unpacked");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("index.html"), "").unwrap();
        fs::write(
            src.join("manifest.json"),
            r#"{"name": "Local", "xwalk_version": "0.1", "start_url": "index.html"}"#,
        )
        .unwrap();

        let id = f.installer.install(&src).unwrap();
        assert!(id.is_generated());
        assert!(src.join("manifest.json").exists());
        let stored = f.installer.storage().get(&id).unwrap().unwrap();
        assert_eq!(stored.source_type, SourceType::Local);
        assert!(stored.package_digest.is_none());
    }

    #[test]
    fn test_update_carries_permissions() {
        let f = fixture();
        let id = f
            .installer
            .install(&f.package("demo", "1.0", &["notifications", "contacts"]))
            .unwrap();
        let mut stored = f.installer.storage().get(&id).unwrap().unwrap();
        stored
            .permissions
            .insert("notifications".to_owned(), PermissionStatus::Allow);
        let installed_at = stored.installed_at;
        f.installer.storage().update(stored).unwrap();

        f.installer
            .update(&id, &f.package("demo", "1.1", &["notifications", "geolocation"]))
            .unwrap();

        let stored = f.installer.storage().get(&id).unwrap().unwrap();
        assert_eq!(stored.version.unwrap().to_string(), "1.1");
        assert_eq!(stored.installed_at, installed_at);
        assert_eq!(
            stored.permissions.get("notifications"),
            Some(&PermissionStatus::Allow)
        );
        assert_eq!(
            stored.permissions.get("geolocation"),
            Some(&PermissionStatus::Prompt)
        );
        assert!(!stored.permissions.contains_key("contacts"));

        let app_dir = f.installer.layout().app_dir(&id);
        assert_eq!(fs::read_to_string(app_dir.join("index.html")).unwrap(), "1.1");
        assert!(!f.installer.layout().backup_dir(&id).exists());
    }

    #[test]
    fn test_update_rejects_same_version() {
        let f = fixture();
        let id = f.installer.install(&f.package("demo", "1.0", &[])).unwrap();
        let again = f.package("demo-again", "1.0", &[]);
        let err = f.installer.update(&id, &again).unwrap_err();
        assert!(matches!(err, InstallError::VersionNotNewer { .. }));
    }

    #[test]
    fn test_update_rejects_other_application() {
        let f = fixture();
        let id = f.installer.install(&f.package("demo", "1.0", &[])).unwrap();

        let other = fixture();
        let pkg = other.package("other", "2.0", &[]);
        let err = f.installer.update(&id, &pkg).unwrap_err();
        assert!(matches!(err, InstallError::IdMismatch { .. }));
    }

    #[test]
    fn test_update_rejects_directory_and_unknown_id() {
        let f = fixture();
        let err = f.installer.update(&AppId::new("x").unwrap(), f.root.path()).unwrap_err();
        assert!(matches!(err, InstallError::InvalidPath { .. }));

        let pkg = f.package("demo", "1.0", &[]);
        let err = f.installer.update(&AppId::new("x").unwrap(), &pkg).unwrap_err();
        assert!(matches!(err, InstallError::NotInstalled { .. }));
    }

    #[test]
    fn test_update_hook_failure_restores_everything() {
        let f = fixture();
        let id = f
            .installer
            .install(&f.package("demo", "1.0", &["notifications"]))
            .unwrap();
        let before = f.installer.storage().get(&id).unwrap().unwrap();

        f.hooks.fail_update.store(true, Ordering::SeqCst);
        let err = f
            .installer
            .update(&id, &f.package("demo", "2.0", &[]))
            .unwrap_err();
        assert!(matches!(
            err,
            InstallError::PlatformHook {
                stage: HookStage::Update,
                ..
            }
        ));

        assert_eq!(f.installer.storage().get(&id).unwrap().unwrap(), before);
        let app_dir = f.installer.layout().app_dir(&id);
        assert_eq!(fs::read_to_string(app_dir.join("index.html")).unwrap(), "1.0");
        assert!(!f.installer.layout().backup_dir(&id).exists());
    }

    #[test]
    fn test_uninstall() {
        let f = fixture();
        let id = f.installer.install(&f.package("demo", "1.0", &[])).unwrap();
        f.installer.uninstall(&id).unwrap();
        assert!(!f.installer.storage().contains(&id).unwrap());
        assert!(!f.installer.layout().app_dir(&id).exists());

        let err = f.installer.uninstall(&id).unwrap_err();
        assert!(matches!(err, InstallError::NotInstalled { .. }));
    }

    #[test]
    fn test_uninstall_reports_hook_failure_but_finishes() {
        let f = fixture();
        let id = f.installer.install(&f.package("demo", "1.0", &[])).unwrap();
        f.hooks.fail_uninstall.store(true, Ordering::SeqCst);

        let err = f.installer.uninstall(&id).unwrap_err();
        let InstallError::UninstallIncomplete { failures, .. } = err else {
            panic!("expected UninstallIncomplete");
        };
        assert_eq!(failures.len(), 1);
        assert!(!f.installer.storage().contains(&id).unwrap());
        assert!(!f.installer.layout().app_dir(&id).exists());
    }

    #[test]
    fn test_recovery_installs_staged_file_and_restores_backup() {
        let f = fixture();
        let layout = f.installer.layout().clone();
        layout.ensure().unwrap();

        let pkg = f.package("demo", "1.0", &[]);
        fs::copy(&pkg, layout.install_temp().join("demo-1.0.xpk")).unwrap();

        let orphan = AppId::new("orphan").unwrap();
        fs::create_dir_all(layout.backup_dir(&orphan)).unwrap();
        fs::write(layout.backup_dir(&orphan).join("index.html"), "old").unwrap();

        let report = f.installer.continue_unfinished_tasks().unwrap();
        assert_eq!(
            report.installed,
            vec![AppId::from_public_key(f.key.public_key_bytes())]
        );
        assert_eq!(report.restored, vec![orphan.clone()]);
        assert!(report.failures.is_empty());
        assert!(layout.app_dir(&orphan).join("index.html").exists());
        assert_eq!(fs::read_dir(layout.install_temp()).unwrap().count(), 0);
    }

    #[test]
    fn test_recovery_updates_from_update_temp() {
        let f = fixture();
        let id = f.installer.install(&f.package("demo", "1.0", &[])).unwrap();
        let layout = f.installer.layout().clone();
        fs::copy(
            f.package("demo", "1.2", &[]),
            layout.update_temp().join("demo-1.2.xpk"),
        )
        .unwrap();
        fs::create_dir_all(layout.backup_dir(&id)).unwrap();

        let report = f.installer.continue_unfinished_tasks().unwrap();
        assert_eq!(report.updated, vec![id.clone()]);
        assert_eq!(report.discarded, vec![id.clone()]);
        let stored = f.installer.storage().get(&id).unwrap().unwrap();
        assert_eq!(stored.version.unwrap().to_string(), "1.2");
        assert_eq!(fs::read_dir(layout.update_temp()).unwrap().count(), 0);
    }

    #[test]
    fn test_recovery_with_nothing_to_do() {
        let f = fixture();
        let report = f.installer.continue_unfinished_tasks().unwrap();
        assert!(report.is_empty());
    }
}
