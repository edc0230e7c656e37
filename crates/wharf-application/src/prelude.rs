//! Prelude module - commonly used types for convenient import.
//!
//! Use `use wharf_application::prelude::*;` to import all essential types.

// Errors
pub use crate::{ApplicationError, ApplicationResult, ConstructionStage};

// Records
pub use crate::{ApplicationRecord, load_application};

// Security
pub use crate::{SecurityMode, SecurityPolicy, WhitelistEntry};
