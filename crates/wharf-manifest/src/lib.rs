//! Wharf Manifest - manifest documents and the handler pipeline.
//!
//! A [`ManifestDocument`] is a read-only, locale-aware view over the key/value
//! tree of a `manifest.json` or widget `config.xml`. A
//! [`ManifestHandlerRegistry`] turns it into typed records by running
//! [`ManifestHandler`]s in prerequisite order.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use wharf_core::SourceType;
//! use wharf_manifest::{
//!     keys, HandlerContext, ManifestDataMap, ManifestDocument, ManifestHandlerRegistry,
//!     PermissionsInfo,
//! };
//!
//! let manifest = ManifestDocument::from_json_str(
//!     r#"{"start_url": "https://example.com/", "permissions": ["contacts"]}"#,
//!     SourceType::Internal,
//! )
//! .unwrap();
//!
//! let registry = ManifestHandlerRegistry::json().unwrap();
//! let ctx = HandlerContext { manifest: &manifest, app_path: Path::new("/apps/demo") };
//! let mut data = ManifestDataMap::new();
//! registry.parse_application(&ctx, &mut data).unwrap();
//!
//! let permissions = data.get::<PermissionsInfo>(keys::data::PERMISSIONS).unwrap();
//! assert!(permissions.api_permissions.contains("contacts"));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod keys;
pub mod prelude;

mod document;
mod error;
mod handler;
mod handlers;
mod registry;
mod xml;

pub use document::{MAX_MANIFEST_SIZE, ManifestDocument};
pub use error::{ManifestError, ManifestResult};
pub use handler::{HandlerContext, ManifestData, ManifestDataMap, ManifestHandler};
pub use handlers::{
    AppControl, AppControlHandler, AppControlInfo, CspHandler, CspInfo, DEFAULT_CSP,
    DEFAULT_WIDGET_START_PAGE, EntryPoint, MainDocumentHandler, MainDocumentInfo,
    NavigationHandler, NavigationInfo, PermissionsHandler, PermissionsInfo, Preference,
    WarpEntry, WarpHandler, WarpInfo, WidgetHandler, WidgetInfo, parse_directives,
};
pub use registry::{HandlerRegistries, ManifestHandlerRegistry, RegistryBuilder};
