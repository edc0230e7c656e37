//! Install and uninstall through the public installer API with JSON storage.

mod common;

use std::fs;

use common::{InstallerHarness, widget_xml};
use serde_json::json;
use wharf_config::Config;
use wharf_core::{AppId, ManifestType, PermissionStatus};
use wharf_installer::{InstallError, PackageInstaller};
use wharf_storage::ApplicationStorage;
use wharf_telemetry::{LogConfig, LogTarget, setup_logging};

#[test]
fn test_install_survives_reopen() {
    let h = InstallerHarness::new();
    let pkg = h.signed_package("notes", "1.2.0", json!({"permissions": ["storage"]}));

    let id = h.installer.install(&pkg).unwrap();
    assert_eq!(id, AppId::from_public_key(h.key.public_key_bytes()));
    assert_eq!(h.calls(), vec![format!("install {id}")]);
    assert!(h.layout().storage_file().is_file());

    let reopened = h.reopen();
    let app = reopened.application(&id).unwrap();
    assert_eq!(app.name(), "notes");
    assert_eq!(app.manifest_type(), ManifestType::Packaged);
    assert_eq!(app.version().unwrap().to_string(), "1.2.0");
    assert_eq!(app.permission("storage"), Some(PermissionStatus::Prompt));
    assert_eq!(app.path(), h.layout().app_dir(&id).as_path());
    assert_eq!(
        fs::read_to_string(app.path().join("assets/app.js")).unwrap(),
        "console.log(1);"
    );

    let stored = reopened.storage().get(&id).unwrap().unwrap();
    assert!(stored.package_digest.unwrap().starts_with("blake3:"));
}

#[test]
fn test_duplicate_install_changes_nothing() {
    let h = InstallerHarness::new();
    let pkg = h.signed_package("notes", "1.0", json!({}));
    let id = h.installer.install(&pkg).unwrap();
    let stored = h.installer.storage().get(&id).unwrap().unwrap();
    let tree = common::snapshot(&h.layout().app_dir(&id));

    let newer = h.signed_package("notes", "2.0", json!({}));
    let err = h.installer.install(&newer).unwrap_err();
    assert!(matches!(err, InstallError::AlreadyInstalled { .. }));

    assert_eq!(h.installer.storage().get(&id).unwrap().unwrap(), stored);
    assert_eq!(common::snapshot(&h.layout().app_dir(&id)), tree);
    assert_eq!(h.calls().len(), 1);
}

#[test]
fn test_uninstall_and_reinstall() {
    let h = InstallerHarness::new();
    let pkg = h.signed_package("notes", "1.0", json!({}));
    let id = h.installer.install(&pkg).unwrap();

    h.installer.uninstall(&id).unwrap();
    assert!(h.installer.storage().ids().unwrap().is_empty());
    assert!(!h.layout().app_dir(&id).exists());

    assert_eq!(h.installer.install(&pkg).unwrap(), id);
    assert_eq!(
        h.calls(),
        vec![
            format!("install {id}"),
            format!("uninstall {id}"),
            format!("install {id}"),
        ]
    );
}

#[test]
fn test_widget_install_uses_hashed_declared_id() {
    let h = InstallerHarness::new();
    let xml = widget_xml("http://example.com/widgets/clock", "1.0", "");
    let pkg = h.widget_package("clock", &xml);

    let id = h.installer.install(&pkg).unwrap();
    assert!(id.is_generated());
    let app = h.installer.application(&id).unwrap();
    assert_eq!(app.manifest_type(), ManifestType::Widget);
    assert_eq!(app.name(), "Widget 1.0");
}

#[test]
fn test_installer_from_config() {
    let h = InstallerHarness::new();
    let data_dir = h.root().join("configured");
    let config_path = h.root().join("wharf.toml");
    fs::write(
        &config_path,
        format!(
            "[storage]\ndata_dir = {:?}\n\n[installer]\nmax_entries = 2\n",
            data_dir.display().to_string()
        ),
    )
    .unwrap();
    let config = Config::load_file(&config_path).unwrap();
    let installer = PackageInstaller::from_config(&config, None).unwrap();
    assert_eq!(installer.layout().data_dir(), data_dir.as_path());

    // The package has more entries than the configured limit.
    let pkg = h.signed_package("big", "1.0", json!({}));
    let err = installer.install(&pkg).unwrap_err();
    assert!(matches!(
        err,
        InstallError::Package(_) | InstallError::InvalidPackage { .. }
    ));
    assert!(installer.storage().ids().unwrap().is_empty());
}

#[test]
fn test_trust_policy_requires_validator() {
    let mut config = Config::default();
    config.storage.data_dir = Some(tempfile::tempdir().unwrap().path().to_path_buf());
    config.installer.widget_id_policy = "trust".to_owned();
    let err = PackageInstaller::from_config(&config, None).unwrap_err();
    assert!(matches!(err, InstallError::MissingSignatureValidator));
}

#[test]
fn test_install_with_logging_enabled() {
    let h = InstallerHarness::new();
    let log_dir = h.root().join("logs");
    let config = LogConfig::new("debug")
        .with_target(LogTarget::File(log_dir.clone()))
        .without_timestamps();
    setup_logging(&config).unwrap();

    let pkg = h.signed_package("logged", "1.0", json!({}));
    h.installer.install(&pkg).unwrap();
    assert!(log_dir.is_dir());
}
