//! The storage contract consumed by the installer.

use wharf_core::AppId;

use crate::error::StorageResult;
use crate::stored::StoredApplication;

/// Persistent registry of installed applications.
///
/// Each mutation is serialized against other mutations on the same store;
/// reads never wait for a mutation lock. The installer, not the store,
/// enforces that an id is installed at most once, but `add` still refuses
/// duplicates.
pub trait ApplicationStorage: Send + Sync {
    /// Whether an application with `id` is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn contains(&self, id: &AppId) -> StorageResult<bool>;

    /// Fetch the stored application.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, id: &AppId) -> StorageResult<Option<StoredApplication>>;

    /// Store a new application.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::AlreadyExists`](crate::StorageError::AlreadyExists)
    /// if the id is taken.
    fn add(&self, app: StoredApplication) -> StorageResult<()>;

    /// Replace a stored application.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`](crate::StorageError::NotFound) if
    /// the id is not stored.
    fn update(&self, app: StoredApplication) -> StorageResult<()>;

    /// Remove a stored application.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`](crate::StorageError::NotFound) if
    /// the id is not stored.
    fn remove(&self, id: &AppId) -> StorageResult<()>;

    /// Ids of all stored applications, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn ids(&self) -> StorageResult<Vec<AppId>>;
}
