//! Prelude module - commonly used types for convenient import.
//!
//! Use `use wharf_crypto::prelude::*;` to import all essential types.

// Errors
pub use crate::{CryptoError, CryptoResult};

// Keys and signatures
pub use crate::{KeyPair, PublicKey, Signature};

// Streaming verification
pub use crate::{SignatureAlgorithm, StreamingSigner, StreamingVerifier};

// Hashing
pub use crate::ContentHash;
