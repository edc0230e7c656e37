//! Wharf Package - reading, verifying and extracting application packages.
//!
//! Two formats are supported, selected by extension:
//!
//! - **Signed** (`.xpk`): a fixed header, an embedded Ed25519 public key and
//!   signature, then a zip payload. The signature is checked by streaming the
//!   payload and the application id is derived from the key.
//! - **Widget** (`.wgt`): a zip archive whose `config.xml` declares the id.
//!
//! [`Package::open`] never fails; it reports structural problems through
//! [`Package::is_valid`]. Extraction is lazy and lands in a temporary
//! directory owned by the package.
//!
//! # Example
//!
//! ```
//! use wharf_crypto::KeyPair;
//! use wharf_package::{Package, write_signed_package};
//!
//! let src = tempfile::tempdir().unwrap();
//! std::fs::write(src.path().join("index.html"), "<p>hello</p>").unwrap();
//! let out = tempfile::tempdir().unwrap();
//! let path = out.path().join("hello.xpk");
//!
//! let key = KeyPair::generate();
//! write_signed_package(src.path(), &key, &path).unwrap();
//!
//! let mut package = Package::open(&path);
//! assert!(package.is_valid());
//! let unpacked = package.extract().unwrap();
//! assert!(unpacked.join("index.html").is_file());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod extract;
mod format;
mod package;
mod slice;
mod writer;

pub use error::{PackageError, PackageResult};
pub use extract::{DEFAULT_MAX_ENTRIES, DEFAULT_MAX_EXTRACTED_BYTES, ExtractionLimits};
pub use format::{
    HEADER_LEN, MAX_KEY_SIZE, MAX_SIGNATURE_SIZE, PACKAGE_MAGIC, PackageFormat, SIGNED_EXTENSION,
    SignedHeader, WIDGET_EXTENSION,
};
pub use package::{Package, PackageOptions, SignatureChainValidator, WidgetIdPolicy};
pub use writer::{write_signed_package, write_widget_package};
