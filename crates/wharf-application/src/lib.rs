//! Wharf Application - application records and their security policy.
//!
//! [`ApplicationRecord::create`] turns a [`ManifestDocument`](wharf_manifest::ManifestDocument)
//! into an immutable record (plus a mutable permission map), and
//! [`SecurityPolicy`] answers whether the application may reach a URL.
//!
//! # Example
//!
//! ```
//! use std::path::Path;
//! use url::Url;
//! use wharf_application::{ApplicationRecord, SecurityPolicy};
//! use wharf_core::SourceType;
//! use wharf_manifest::{HandlerRegistries, ManifestDocument};
//!
//! let manifest = ManifestDocument::from_widget_xml(
//!     r#"<widget xmlns="http://www.w3.org/ns/widgets">
//!          <access origin="https://api.example.com"/>
//!        </widget>"#,
//!     SourceType::Internal,
//! )
//! .unwrap();
//! let registries = HandlerRegistries::standard().unwrap();
//! let app = ApplicationRecord::create(Path::new("/apps/demo"), None, manifest, &registries).unwrap();
//!
//! let policy = SecurityPolicy::for_application(&app);
//! assert!(policy.is_access_allowed(&Url::parse("https://api.example.com/v1").unwrap()));
//! assert!(!policy.is_access_allowed(&Url::parse("https://elsewhere.com/").unwrap()));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod loader;
mod record;
mod security;

pub use error::{ApplicationError, ApplicationResult, ConstructionStage};
pub use loader::{find_manifest, load_application};
pub use record::{APP_SCHEME, ApplicationRecord, application_url};
pub use security::{SecurityMode, SecurityPolicy, WhitelistEntry};
