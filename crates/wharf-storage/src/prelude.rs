//! Prelude module - commonly used types for convenient import.
//!
//! Use `use wharf_storage::prelude::*;` to import all essential types.

// Errors
pub use crate::{StorageError, StorageResult};

// Storage
pub use crate::{ApplicationStorage, JsonFileStorage, MemoryStorage, StoredApplication};
