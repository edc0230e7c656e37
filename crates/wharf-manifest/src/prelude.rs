//! Prelude module - commonly used types for convenient import.
//!
//! Use `use wharf_manifest::prelude::*;` to import all essential types.

// Errors
pub use crate::{ManifestError, ManifestResult};

// Documents
pub use crate::ManifestDocument;

// Pipeline
pub use crate::{
    HandlerContext, HandlerRegistries, ManifestData, ManifestDataMap, ManifestHandler,
    ManifestHandlerRegistry,
};

// Records
pub use crate::{CspInfo, NavigationInfo, PermissionsInfo, WarpInfo, WidgetInfo};
