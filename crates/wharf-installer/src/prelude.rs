//! Prelude module - commonly used types for convenient import.
//!
//! Use `use wharf_installer::prelude::*;` to import all essential types.

// Errors
pub use crate::{HookStage, InstallError, InstallResult};

// Installer
pub use crate::{InstallLayout, InstallerOptions, PackageInstaller, RecoveryReport};

// Platform integration
pub use crate::{NoopPlatformHooks, PlatformHooks};
