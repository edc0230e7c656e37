//! Prelude module - commonly used types for convenient import.
//!
//! Use `use wharf_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult, VersionParseError};

// Identity
pub use crate::AppId;

// Versions
pub use crate::Version;

// Classification
pub use crate::{ManifestType, PermissionStatus, SourceType};
