//! Shared test harness for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use wharf_application::ApplicationRecord;
use wharf_core::AppId;
use wharf_crypto::KeyPair;
use wharf_installer::{InstallLayout, InstallerOptions, PackageInstaller, PlatformHooks};
use wharf_manifest::HandlerRegistries;
use wharf_package::{write_signed_package, write_widget_package};
use wharf_storage::JsonFileStorage;

/// Platform hooks that record every call and can be told to fail.
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingHooks {
    /// `"<stage> <id>"` for every call, in order.
    pub calls: Mutex<Vec<String>>,
    pub fail_install: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_uninstall: AtomicBool,
}

impl RecordingHooks {
    fn record(&self, stage: &str, id: &AppId, fail: &AtomicBool) -> Result<(), String> {
        self.calls
            .lock()
            .expect("hook log poisoned")
            .push(format!("{stage} {id}"));
        if fail.load(Ordering::SeqCst) {
            Err(format!("{stage} rejected by platform"))
        } else {
            Ok(())
        }
    }
}

impl PlatformHooks for RecordingHooks {
    fn install(&self, app: &ApplicationRecord) -> Result<(), String> {
        self.record("install", app.id(), &self.fail_install)
    }

    fn update(&self, app: &ApplicationRecord) -> Result<(), String> {
        self.record("update", app.id(), &self.fail_update)
    }

    fn uninstall(&self, id: &AppId) -> Result<(), String> {
        self.record("uninstall", id, &self.fail_uninstall)
    }
}

/// A data directory, a signing key and an installer backed by JSON storage.
///
/// Everything lives in a `TempDir` removed when the harness is dropped.
#[allow(dead_code)]
pub struct InstallerHarness {
    pub installer: PackageInstaller,
    pub hooks: Arc<RecordingHooks>,
    pub key: KeyPair,
    root: TempDir,
}

#[allow(dead_code)]
impl InstallerHarness {
    pub fn new() -> Self {
        Self::with_options(InstallerOptions::default())
    }

    pub fn with_options(options: InstallerOptions) -> Self {
        let root = TempDir::new().expect("failed to create tempdir");
        let hooks = Arc::new(RecordingHooks::default());
        let installer = build_installer(root.path(), hooks.clone(), options);
        Self {
            installer,
            hooks,
            key: KeyPair::generate(),
            root,
        }
    }

    /// A second installer over the same data directory.
    pub fn reopen(&self) -> PackageInstaller {
        build_installer(
            self.root.path(),
            Arc::new(RecordingHooks::default()),
            InstallerOptions::default(),
        )
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn layout(&self) -> &InstallLayout {
        self.installer.layout()
    }

    pub fn calls(&self) -> Vec<String> {
        self.hooks.calls.lock().expect("hook log poisoned").clone()
    }

    /// Source tree of a packaged app whose `index.html` contains `version`.
    pub fn app_source(&self, name: &str, version: &str, extra: serde_json::Value) -> PathBuf {
        let dir = self.root.path().join("sources").join(format!("{name}-{version}"));
        fs::create_dir_all(dir.join("assets")).expect("create source dir");
        fs::write(dir.join("index.html"), version).expect("write index");
        fs::write(dir.join("assets/app.js"), "console.log(1);").expect("write script");

        let mut manifest = serde_json::json!({
            "name": name,
            "xwalk_version": version,
            "start_url": "index.html",
        });
        if let (Some(obj), serde_json::Value::Object(extra)) = (manifest.as_object_mut(), extra) {
            obj.extend(extra);
        }
        fs::write(dir.join("manifest.json"), manifest.to_string()).expect("write manifest");
        dir
    }

    /// Signed package of [`app_source`](Self::app_source), signed with the harness key.
    pub fn signed_package(&self, name: &str, version: &str, extra: serde_json::Value) -> PathBuf {
        let src = self.app_source(name, version, extra);
        let out = self.root.path().join(format!("{name}-{version}.xpk"));
        write_signed_package(&src, &self.key, &out).expect("write signed package");
        out
    }

    /// Widget archive with the given `config.xml` body.
    pub fn widget_package(&self, file_name: &str, config_xml: &str) -> PathBuf {
        let src = self.root.path().join("sources").join(file_name);
        fs::create_dir_all(&src).expect("create widget dir");
        fs::write(src.join("config.xml"), config_xml).expect("write config.xml");
        fs::write(src.join("index.html"), file_name).expect("write index");
        let out = self.root.path().join(format!("{file_name}.wgt"));
        write_widget_package(&src, &out).expect("write widget package");
        out
    }
}

fn build_installer(
    root: &Path,
    hooks: Arc<RecordingHooks>,
    options: InstallerOptions,
) -> PackageInstaller {
    let layout = InstallLayout::new(root.join("data"));
    let storage = Arc::new(JsonFileStorage::new(layout.storage_file()));
    PackageInstaller::new(
        layout,
        storage,
        HandlerRegistries::standard().expect("standard registries"),
    )
    .with_hooks(hooks)
    .with_options(options)
}

/// Relative path and contents of every file below `dir`, sorted.
#[allow(dead_code)]
pub fn snapshot(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    fn walk(base: &Path, dir: &Path, out: &mut Vec<(PathBuf, Vec<u8>)>) {
        for entry in fs::read_dir(dir).expect("read dir") {
            let path = entry.expect("dir entry").path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                let rel = path.strip_prefix(base).expect("inside base").to_path_buf();
                out.push((rel, fs::read(&path).expect("read file")));
            }
        }
    }
    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}

/// A widget `config.xml`.
#[allow(dead_code)]
pub fn widget_xml(id: &str, version: &str, body: &str) -> String {
    format!(
        r#"<widget xmlns="http://www.w3.org/ns/widgets" id="{id}" version="{version}">
             <name>Widget {version}</name>
             {body}
           </widget>"#
    )
}
