//! Wharf Telemetry - logging setup for the wharf lifecycle crates.
//!
//! The other crates only emit `tracing` events; this crate decides where they
//! go. [`LogConfig::from_section`] turns the `[logging]` configuration
//! section into a [`LogConfig`].
//!
//! # Example
//!
//! ```rust,no_run
//! use wharf_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), wharf_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Json)
//!     .with_directive("wharf_package=trace");
//! setup_logging(&config)?;
//! tracing::info!(app_id = "demo", "Installed application");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging,
};
