//! Wharf Storage - where installed applications are recorded.
//!
//! The installer talks to an [`ApplicationStorage`]; two backends ship here:
//!
//! - [`MemoryStorage`] for tests and throwaway installs.
//! - [`JsonFileStorage`], one JSON document replaced atomically on each
//!   mutation.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use chrono::Utc;
//! use wharf_core::{AppId, ManifestType, SourceType};
//! use wharf_storage::{ApplicationStorage, MemoryStorage, StoredApplication};
//!
//! let store = MemoryStorage::new();
//! let id = AppId::new("demo").unwrap();
//! store
//!     .add(StoredApplication {
//!         id: id.clone(),
//!         path: "/apps/demo".into(),
//!         manifest_type: ManifestType::Packaged,
//!         source_type: SourceType::Internal,
//!         manifest: serde_json::json!({"name": "Demo"}),
//!         version: None,
//!         permissions: BTreeMap::new(),
//!         installed_at: Utc::now(),
//!         package_digest: None,
//!     })
//!     .unwrap();
//! assert!(store.contains(&id).unwrap());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod json;
mod memory;
mod storage;
mod stored;

pub use error::{StorageError, StorageResult};
pub use json::{JsonFileStorage, SCHEMA_VERSION};
pub use memory::MemoryStorage;
pub use storage::ApplicationStorage;
pub use stored::StoredApplication;

#[cfg(test)]
mod test_support {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use wharf_core::{AppId, ManifestType, PermissionStatus, SourceType};

    use crate::StoredApplication;

    pub(crate) fn sample(id: &str) -> StoredApplication {
        StoredApplication {
            id: AppId::new(id).unwrap(),
            path: format!("/apps/{id}").into(),
            manifest_type: ManifestType::Packaged,
            source_type: SourceType::Internal,
            manifest: serde_json::json!({"name": id, "xwalk_version": "1.0"}),
            version: Some("1.0".parse().unwrap()),
            permissions: BTreeMap::from([("contacts".to_string(), PermissionStatus::Prompt)]),
            installed_at: Utc::now(),
            package_digest: None,
        }
    }
}
