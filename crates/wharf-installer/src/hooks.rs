//! Platform package-manager integration points.

use wharf_application::ApplicationRecord;
use wharf_core::AppId;

/// Registration of applications with the host platform.
///
/// Each hook returns a human-readable reason on failure. The installer rolls
/// back its own work when `install` or `update` fails; `uninstall` failures
/// are reported but do not stop the remaining uninstall steps.
pub trait PlatformHooks: Send + Sync {
    /// Register a newly installed application.
    ///
    /// # Errors
    ///
    /// Returns the reason registration failed.
    fn install(&self, app: &ApplicationRecord) -> Result<(), String>;

    /// Register a new version of an installed application.
    ///
    /// # Errors
    ///
    /// Returns the reason registration failed.
    fn update(&self, app: &ApplicationRecord) -> Result<(), String>;

    /// Deregister an application.
    ///
    /// # Errors
    ///
    /// Returns the reason deregistration failed.
    fn uninstall(&self, id: &AppId) -> Result<(), String>;
}

/// Hooks for platforms without a package database.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPlatformHooks;

impl PlatformHooks for NoopPlatformHooks {
    fn install(&self, _app: &ApplicationRecord) -> Result<(), String> {
        Ok(())
    }

    fn update(&self, _app: &ApplicationRecord) -> Result<(), String> {
        Ok(())
    }

    fn uninstall(&self, _id: &AppId) -> Result<(), String> {
        Ok(())
    }
}
