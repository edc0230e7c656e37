//! Wharf Installer - install, update and uninstall as reversible steps.
//!
//! [`PackageInstaller`] stages a package under the data directory, verifies
//! and extracts it, loads its manifest, moves the tree into
//! `applications/<id>` and records it in an
//! [`ApplicationStorage`](wharf_storage::ApplicationStorage). Any failure
//! before the platform hook succeeds undoes what was done. Updates keep the
//! previous tree at `applications/<id>.tmp` until they commit.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use wharf_crypto::KeyPair;
//! use wharf_installer::{InstallLayout, PackageInstaller};
//! use wharf_manifest::HandlerRegistries;
//! use wharf_package::write_signed_package;
//! use wharf_storage::MemoryStorage;
//!
//! let work = tempfile::tempdir().unwrap();
//! let src = work.path().join("src");
//! std::fs::create_dir(&src).unwrap();
//! std::fs::write(src.join("index.html"), "<p>hi</p>").unwrap();
//! std::fs::write(
//!     src.join("manifest.json"),
//!     r#"{"name": "Hello", "xwalk_version": "1.0", "start_url": "index.html"}"#,
//! )
//! .unwrap();
//! let package = work.path().join("hello.xpk");
//! write_signed_package(&src, &KeyPair::generate(), &package).unwrap();
//!
//! let installer = PackageInstaller::new(
//!     InstallLayout::new(work.path().join("data")),
//!     Arc::new(MemoryStorage::new()),
//!     HandlerRegistries::standard().unwrap(),
//! );
//! let id = installer.install(&package).unwrap();
//! assert_eq!(installer.application(&id).unwrap().name(), "Hello");
//! installer.uninstall(&id).unwrap();
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod fsutil;
mod guard;
mod hooks;
mod installer;
mod layout;

pub use error::{HookStage, InstallError, InstallResult};
pub use guard::ScopedDeleter;
pub use hooks::{NoopPlatformHooks, PlatformHooks};
pub use installer::{InstallerOptions, PackageInstaller, RecoveryReport};
pub use layout::{
    APPLICATIONS_DIR, BACKUP_SUFFIX, INSTALL_TEMP_DIR, InstallLayout, STORAGE_FILE,
    UPDATE_TEMP_DIR,
};
