//! Update transactions, their rollback paths and crash recovery.

mod common;

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{InstallerHarness, RecordingHooks, snapshot, widget_xml};
use serde_json::json;
use wharf_core::{AppId, PermissionStatus};
use wharf_installer::{InstallError, InstallLayout, InstallerOptions, PackageInstaller};
use wharf_manifest::HandlerRegistries;
use wharf_storage::{
    ApplicationStorage, MemoryStorage, StorageError, StorageResult, StoredApplication,
};

#[test]
fn test_update_replaces_tree_and_keeps_decisions() {
    let h = InstallerHarness::new();
    let id = h
        .installer
        .install(&h.signed_package("notes", "1.0", json!({"permissions": ["storage", "camera"]})))
        .unwrap();
    let mut stored = h.installer.storage().get(&id).unwrap().unwrap();
    stored
        .permissions
        .insert("camera".to_owned(), PermissionStatus::Deny);
    h.installer.storage().update(stored).unwrap();

    let pkg = h.signed_package("notes", "1.1", json!({"permissions": ["camera", "contacts"]}));
    h.installer.update(&id, &pkg).unwrap();

    let app = h.installer.application(&id).unwrap();
    assert_eq!(app.version().unwrap().to_string(), "1.1");
    assert_eq!(app.permission("camera"), Some(PermissionStatus::Deny));
    assert_eq!(app.permission("contacts"), Some(PermissionStatus::Prompt));
    assert_eq!(app.permission("storage"), None);
    assert_eq!(
        fs::read_to_string(h.layout().app_dir(&id).join("index.html")).unwrap(),
        "1.1"
    );
    assert!(!h.layout().backup_dir(&id).exists());
    assert_eq!(h.calls(), vec![format!("install {id}"), format!("update {id}")]);
}

#[test]
fn test_update_hook_failure_restores_previous_state() {
    let h = InstallerHarness::new();
    let id = h
        .installer
        .install(&h.signed_package("notes", "1.0", json!({"permissions": ["storage"]})))
        .unwrap();
    let record_before = h.installer.storage().get(&id).unwrap().unwrap();
    let tree_before = snapshot(&h.layout().app_dir(&id));

    h.hooks.fail_update.store(true, Ordering::SeqCst);
    let err = h
        .installer
        .update(&id, &h.signed_package("notes", "2.0", json!({})))
        .unwrap_err();
    assert!(matches!(err, InstallError::PlatformHook { .. }));

    assert_eq!(h.installer.storage().get(&id).unwrap().unwrap(), record_before);
    assert_eq!(snapshot(&h.layout().app_dir(&id)), tree_before);
    assert!(!h.layout().backup_dir(&id).exists());
    assert_eq!(h.reopen().application(&id).unwrap().version().unwrap().to_string(), "1.0");
}

#[test]
fn test_version_gate() {
    let h = InstallerHarness::new();
    let id = h
        .installer
        .install(&h.signed_package("notes", "1.5", json!({})))
        .unwrap();
    let tree = snapshot(&h.layout().app_dir(&id));

    for version in ["1.5", "1.4.9", "0.9"] {
        let err = h
            .installer
            .update(&id, &h.signed_package("notes", version, json!({})))
            .unwrap_err();
        assert!(
            matches!(err, InstallError::VersionNotNewer { .. }),
            "{version}: {err}"
        );
    }
    assert_eq!(snapshot(&h.layout().app_dir(&id)), tree);
}

#[test]
fn test_widget_downgrade_follows_option() {
    let h = InstallerHarness::new();
    let id = h
        .installer
        .install(&h.widget_package("clock-2", &widget_xml("clock", "2.0", "")))
        .unwrap();
    let older = h.widget_package("clock-1", &widget_xml("clock", "1.0", ""));

    h.installer.update(&id, &older).unwrap();
    assert_eq!(
        h.installer.application(&id).unwrap().version().unwrap().to_string(),
        "1.0"
    );

    let strict = InstallerHarness::with_options(InstallerOptions {
        allow_widget_downgrade: false,
        ..InstallerOptions::default()
    });
    let id = strict
        .installer
        .install(&strict.widget_package("clock-2", &widget_xml("clock", "2.0", "")))
        .unwrap();
    let older = strict.widget_package("clock-1", &widget_xml("clock", "1.0", ""));
    let err = strict.installer.update(&id, &older).unwrap_err();
    assert!(matches!(err, InstallError::VersionNotNewer { .. }));
}

/// Memory storage whose `update` fails from the given call onwards.
struct FailingUpdates {
    inner: MemoryStorage,
    calls: AtomicUsize,
    fail_from: usize,
}

impl ApplicationStorage for FailingUpdates {
    fn contains(&self, id: &AppId) -> StorageResult<bool> {
        self.inner.contains(id)
    }

    fn get(&self, id: &AppId) -> StorageResult<Option<StoredApplication>> {
        self.inner.get(id)
    }

    fn add(&self, app: StoredApplication) -> StorageResult<()> {
        self.inner.add(app)
    }

    fn update(&self, app: StoredApplication) -> StorageResult<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.fail_from {
            return Err(StorageError::Internal("disk full".to_owned()));
        }
        self.inner.update(app)
    }

    fn remove(&self, id: &AppId) -> StorageResult<()> {
        self.inner.remove(id)
    }

    fn ids(&self) -> StorageResult<Vec<AppId>> {
        self.inner.ids()
    }
}

fn installer_with(
    h: &InstallerHarness,
    storage: Arc<FailingUpdates>,
    hooks: Arc<RecordingHooks>,
) -> PackageInstaller {
    PackageInstaller::new(
        InstallLayout::new(h.root().join("flaky")),
        storage,
        HandlerRegistries::standard().unwrap(),
    )
    .with_hooks(hooks)
}

#[test]
fn test_storage_failure_during_update_restores_tree() {
    let h = InstallerHarness::new();
    let storage = Arc::new(FailingUpdates {
        inner: MemoryStorage::new(),
        calls: AtomicUsize::new(0),
        fail_from: 0,
    });
    let installer = installer_with(&h, storage.clone(), Arc::new(RecordingHooks::default()));
    let id = installer
        .install(&h.signed_package("notes", "1.0", json!({})))
        .unwrap();
    let tree = snapshot(&installer.layout().app_dir(&id));

    let err = installer
        .update(&id, &h.signed_package("notes", "2.0", json!({})))
        .unwrap_err();
    assert!(matches!(err, InstallError::Storage(_)));
    assert_eq!(snapshot(&installer.layout().app_dir(&id)), tree);
    assert!(storage.contains(&id).unwrap());
}

#[test]
fn test_failed_revert_removes_application() {
    let h = InstallerHarness::new();
    // The commit succeeds; the revert after the hook failure does not.
    let storage = Arc::new(FailingUpdates {
        inner: MemoryStorage::new(),
        calls: AtomicUsize::new(0),
        fail_from: 1,
    });
    let hooks = Arc::new(RecordingHooks::default());
    let installer = installer_with(&h, storage.clone(), hooks.clone());
    let id = installer
        .install(&h.signed_package("notes", "1.0", json!({})))
        .unwrap();

    hooks.fail_update.store(true, Ordering::SeqCst);
    let err = installer
        .update(&id, &h.signed_package("notes", "2.0", json!({})))
        .unwrap_err();
    assert!(matches!(err, InstallError::PlatformHook { .. }));

    assert!(!storage.contains(&id).unwrap());
    assert!(!installer.layout().app_dir(&id).exists());
    assert!(!installer.layout().backup_dir(&id).exists());
}

#[test]
fn test_recovery_after_interrupted_update() {
    let h = InstallerHarness::new();
    let id = h
        .installer
        .install(&h.signed_package("notes", "1.0", json!({})))
        .unwrap();
    let layout = h.layout().clone();

    // Crash after the old tree was moved aside, before the new one landed.
    fs::rename(layout.app_dir(&id), layout.backup_dir(&id)).unwrap();
    fs::copy(
        h.signed_package("notes", "1.1", json!({})),
        layout.update_temp().join("notes-1.1.xpk"),
    )
    .unwrap();

    let report = h.reopen().continue_unfinished_tasks().unwrap();
    assert_eq!(report.restored, vec![id.clone()]);
    assert_eq!(report.updated, vec![id.clone()]);
    assert!(report.failures.is_empty(), "{:?}", report.failures);

    let app = h.reopen().application(&id).unwrap();
    assert_eq!(app.version().unwrap().to_string(), "1.1");
    assert!(!layout.backup_dir(&id).exists());
    assert_eq!(fs::read_dir(layout.update_temp()).unwrap().count(), 0);
    assert_eq!(fs::read_dir(layout.install_temp()).unwrap().count(), 0);
}

#[test]
fn test_recovery_reports_unusable_leftovers() {
    let h = InstallerHarness::new();
    let layout = h.layout().clone();
    layout.ensure().unwrap();
    fs::write(layout.install_temp().join("junk.xpk"), b"not a package").unwrap();

    let report = h.installer.continue_unfinished_tasks().unwrap();
    assert_eq!(report.failures.len(), 1);
    assert!(report.installed.is_empty());
    assert_eq!(fs::read_dir(layout.install_temp()).unwrap().count(), 0);
}
