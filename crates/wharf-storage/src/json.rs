//! Flat-file storage: every installed application in one JSON document.
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the document, so readers see either the old or the new state. An
//! advisory lock on a `.lk` sibling coordinates processes sharing the file;
//! a `Mutex` serializes mutations within this process.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wharf_core::AppId;

use crate::error::{StorageError, StorageResult};
use crate::storage::ApplicationStorage;
use crate::stored::StoredApplication;

/// Current document schema version.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StorageDocument {
    schema_version: u32,
    #[serde(default)]
    applications: BTreeMap<AppId, StoredApplication>,
}

/// Storage backed by a single JSON file.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStorage {
    /// Use the document at `path`, which need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, action: &str, e: impl std::fmt::Display) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            message: format!("{action}: {e}"),
        }
    }

    fn load(&self) -> StorageResult<StorageDocument> {
        let _guard = self.lock_file(LockMode::Shared)?;
        self.read_document()
    }

    fn read_document(&self) -> StorageResult<StorageDocument> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(StorageDocument {
                    schema_version: SCHEMA_VERSION,
                    applications: BTreeMap::new(),
                });
            },
            Err(e) => return Err(self.io_error("failed to read storage", e)),
        };

        let document: StorageDocument = serde_json::from_str(&content)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        if document.schema_version != SCHEMA_VERSION {
            warn!(
                path = %self.path.display(),
                found = document.schema_version,
                expected = SCHEMA_VERSION,
                "Storage schema version mismatch, attempting best-effort load"
            );
        }
        Ok(document)
    }

    /// Load, mutate and save under both the in-process and the file lock.
    fn mutate<F>(&self, f: F) -> StorageResult<()>
    where
        F: FnOnce(&mut BTreeMap<AppId, StoredApplication>) -> StorageResult<()>,
    {
        let _serial = self
            .write_lock
            .lock()
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        let _guard = self.lock_file(LockMode::Exclusive)?;

        let mut document = self.read_document()?;
        f(&mut document.applications)?;
        document.schema_version = SCHEMA_VERSION;
        self.save(&document)
    }

    fn save(&self, document: &StorageDocument) -> StorageResult<()> {
        let body = serde_json::to_vec_pretty(document)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let parent = self.path.parent().unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| self.io_error("failed to create temp file for atomic write", e))?;
        tmp.write_all(&body)
            .map_err(|e| self.io_error("failed to write temp file", e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| self.io_error("failed to sync temp file", e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.io_error("failed to replace storage", e))?;

        debug!(
            path = %self.path.display(),
            applications = document.applications.len(),
            "Saved application storage"
        );
        Ok(())
    }

    fn lock_file(&self, mode: LockMode) -> StorageResult<Option<File>> {
        let lock_path = self.path.with_extension("lk");
        match mode {
            LockMode::Shared => match OpenOptions::new().read(true).open(&lock_path) {
                Ok(file) => {
                    file.lock_shared()
                        .map_err(|e| self.io_error("failed to acquire shared lock", e))?;
                    Ok(Some(file))
                },
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(self.io_error("failed to open lock file", e)),
            },
            LockMode::Exclusive => {
                if let Some(parent) = lock_path.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| self.io_error("failed to create storage directory", e))?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .truncate(false)
                    .write(true)
                    .read(true)
                    .open(&lock_path)
                    .map_err(|e| self.io_error("failed to open lock file", e))?;
                file.lock_exclusive()
                    .map_err(|e| self.io_error("failed to acquire exclusive lock", e))?;
                Ok(Some(file))
            },
        }
    }
}

#[derive(Clone, Copy)]
enum LockMode {
    Shared,
    Exclusive,
}

impl ApplicationStorage for JsonFileStorage {
    fn contains(&self, id: &AppId) -> StorageResult<bool> {
        Ok(self.load()?.applications.contains_key(id))
    }

    fn get(&self, id: &AppId) -> StorageResult<Option<StoredApplication>> {
        Ok(self.load()?.applications.remove(id))
    }

    fn add(&self, app: StoredApplication) -> StorageResult<()> {
        self.mutate(|apps| {
            if apps.contains_key(&app.id) {
                return Err(StorageError::AlreadyExists { id: app.id });
            }
            apps.insert(app.id.clone(), app);
            Ok(())
        })
    }

    fn update(&self, app: StoredApplication) -> StorageResult<()> {
        self.mutate(|apps| match apps.get_mut(&app.id) {
            Some(slot) => {
                *slot = app;
                Ok(())
            },
            None => Err(StorageError::NotFound { id: app.id }),
        })
    }

    fn remove(&self, id: &AppId) -> StorageResult<()> {
        self.mutate(|apps| {
            apps.remove(id)
                .map(|_| ())
                .ok_or_else(|| StorageError::NotFound { id: id.clone() })
        })
    }

    fn ids(&self) -> StorageResult<Vec<AppId>> {
        Ok(self.load()?.applications.into_keys().collect())
    }
}
