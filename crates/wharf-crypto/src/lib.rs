//! Wharf Crypto - signing and hashing primitives for application packages.
//!
//! This crate provides:
//! - Ed25519 key pairs, public keys and signatures
//! - Streaming Ed25519ph signing/verification over arbitrarily large payloads
//! - BLAKE3 content hashing for recording package digests
//!
//! # Example
//!
//! ```
//! use std::io::Write;
//! use wharf_crypto::{KeyPair, SignatureAlgorithm, StreamingVerifier};
//!
//! let keypair = KeyPair::generate();
//!
//! let mut signer = keypair.streaming_signer();
//! signer.update(b"payload part 1");
//! signer.update(b"payload part 2");
//! let signature = signer.finalize().unwrap();
//!
//! let mut verifier = StreamingVerifier::new(
//!     SignatureAlgorithm::Ed25519ph,
//!     &keypair.export_public_key(),
//!     &signature,
//! )
//! .unwrap();
//! verifier.write_all(b"payload part 1payload part 2").unwrap();
//! assert!(verifier.finalize().is_ok());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod hash;
mod keypair;
mod signature;
mod stream;

pub use error::{CryptoError, CryptoResult};
pub use hash::ContentHash;
pub use keypair::{KeyPair, PUBLIC_KEY_LEN, PublicKey};
pub use signature::{SIGNATURE_LEN, Signature};
pub use stream::{PACKAGE_SIGNATURE_CONTEXT, SignatureAlgorithm, StreamingSigner, StreamingVerifier};
