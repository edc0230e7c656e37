//! Wharf Core - shared identity and version types for the application lifecycle.
//!
//! This crate provides:
//! - [`AppId`]: application identifiers, either explicit or derived from a
//!   signing key / install path
//! - [`Version`]: 1 to 4 component dotted versions with zero-padded ordering
//! - [`ManifestType`], [`SourceType`] and [`PermissionStatus`] shared by the
//!   manifest, application and installer crates
//!
//! # Example
//!
//! ```
//! use wharf_core::{AppId, Version};
//!
//! let id = AppId::generate(b"public key bytes");
//! assert!(id.is_generated());
//!
//! let installed: Version = "1.2".parse().unwrap();
//! let candidate: Version = "1.2.0.1".parse().unwrap();
//! assert!(candidate.is_newer_than(&installed));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod id;
mod types;
mod version;

pub use error::{CoreError, CoreResult};
pub use id::{AppId, GENERATED_ID_LEN};
pub use types::{ManifestType, PermissionStatus, SourceType};
pub use version::{Version, VersionParseError};
