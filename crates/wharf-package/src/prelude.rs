//! Prelude module - commonly used types for convenient import.
//!
//! Use `use wharf_package::prelude::*;` to import all essential types.

// Errors
pub use crate::{PackageError, PackageResult};

// Reading
pub use crate::{Package, PackageFormat, PackageOptions, WidgetIdPolicy};

// Writing
pub use crate::{write_signed_package, write_widget_package};
