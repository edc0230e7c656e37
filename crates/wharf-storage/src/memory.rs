//! In-memory storage for tests and ephemeral installs.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::debug;
use wharf_core::AppId;

use crate::error::{StorageError, StorageResult};
use crate::storage::ApplicationStorage;
use crate::stored::StoredApplication;

/// Applications kept in a `BTreeMap` behind a `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    apps: RwLock<BTreeMap<AppId, StoredApplication>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(e: impl std::fmt::Display) -> StorageError {
    StorageError::Internal(e.to_string())
}

impl ApplicationStorage for MemoryStorage {
    fn contains(&self, id: &AppId) -> StorageResult<bool> {
        let apps = self.apps.read().map_err(poisoned)?;
        Ok(apps.contains_key(id))
    }

    fn get(&self, id: &AppId) -> StorageResult<Option<StoredApplication>> {
        let apps = self.apps.read().map_err(poisoned)?;
        Ok(apps.get(id).cloned())
    }

    fn add(&self, app: StoredApplication) -> StorageResult<()> {
        let mut apps = self.apps.write().map_err(poisoned)?;
        if apps.contains_key(&app.id) {
            return Err(StorageError::AlreadyExists { id: app.id });
        }
        debug!(app_id = %app.id, "Stored application");
        apps.insert(app.id.clone(), app);
        Ok(())
    }

    fn update(&self, app: StoredApplication) -> StorageResult<()> {
        let mut apps = self.apps.write().map_err(poisoned)?;
        match apps.get_mut(&app.id) {
            Some(slot) => {
                *slot = app;
                Ok(())
            },
            None => Err(StorageError::NotFound { id: app.id }),
        }
    }

    fn remove(&self, id: &AppId) -> StorageResult<()> {
        let mut apps = self.apps.write().map_err(poisoned)?;
        apps.remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound { id: id.clone() })
    }

    fn ids(&self) -> StorageResult<Vec<AppId>> {
        let apps = self.apps.read().map_err(poisoned)?;
        Ok(apps.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample;

    #[test]
    fn test_add_get_remove() {
        let store = MemoryStorage::new();
        let app = sample("alpha");
        store.add(app.clone()).unwrap();
        assert!(store.contains(&app.id).unwrap());
        assert_eq!(store.get(&app.id).unwrap(), Some(app.clone()));

        store.remove(&app.id).unwrap();
        assert!(!store.contains(&app.id).unwrap());
        assert!(matches!(
            store.remove(&app.id),
            Err(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_add_rejected() {
        let store = MemoryStorage::new();
        store.add(sample("alpha")).unwrap();
        assert!(matches!(
            store.add(sample("alpha")),
            Err(StorageError::AlreadyExists { .. })
        ));
        assert_eq!(store.ids().unwrap().len(), 1);
    }

    #[test]
    fn test_update_requires_existing() {
        let store = MemoryStorage::new();
        assert!(matches!(
            store.update(sample("ghost")),
            Err(StorageError::NotFound { .. })
        ));
        store.add(sample("alpha")).unwrap();
        let mut changed = sample("alpha");
        changed.package_digest = Some("blake3:ff".into());
        store.update(changed.clone()).unwrap();
        assert_eq!(store.get(&changed.id).unwrap(), Some(changed));
    }
}
