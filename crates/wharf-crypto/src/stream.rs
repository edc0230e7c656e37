//! Streaming Ed25519ph signatures over package payloads.
//!
//! Signed packages can be large, so the payload is never held in memory.
//! Both sides feed it through a SHA-512 prehash and sign or verify the
//! digest with a fixed domain-separation context.

use std::fmt;
use std::io;
use std::str::FromStr;

use ed25519_dalek::{SigningKey, VerifyingKey};
use sha2::{Digest, Sha512};

use crate::error::{CryptoError, CryptoResult};
use crate::keypair::PublicKey;
use crate::signature::Signature;

/// Domain-separation context mixed into every package signature.
pub const PACKAGE_SIGNATURE_CONTEXT: &[u8] = b"wharf-package";

/// Signature schemes a package verifier understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// Ed25519 over a SHA-512 prehash (RFC 8032 section 5.1).
    Ed25519ph,
}

impl SignatureAlgorithm {
    /// Canonical identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ed25519ph => "Ed25519ph",
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ed25519ph" => Ok(Self::Ed25519ph),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Accumulates a payload and produces an Ed25519ph signature.
///
/// Created with [`KeyPair::streaming_signer`](crate::KeyPair::streaming_signer).
pub struct StreamingSigner<'a> {
    key: &'a SigningKey,
    digest: Sha512,
}

impl<'a> StreamingSigner<'a> {
    pub(crate) fn new(key: &'a SigningKey) -> Self {
        Self {
            key,
            digest: Sha512::new(),
        }
    }

    /// Feed the next chunk of payload.
    pub fn update(&mut self, chunk: &[u8]) {
        self.digest.update(chunk);
    }

    /// Produce the signature.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SigningFailed`] if the signer rejects the context.
    pub fn finalize(self) -> CryptoResult<Signature> {
        self.key
            .sign_prehashed(self.digest, Some(PACKAGE_SIGNATURE_CONTEXT))
            .map(Signature::from)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))
    }
}

impl io::Write for StreamingSigner<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for StreamingSigner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingSigner").finish_non_exhaustive()
    }
}

/// Verifies an Ed25519ph signature over a payload fed in chunks.
///
/// Nothing is decided until [`finalize`](Self::finalize): a verifier that is
/// dropped early has verified nothing.
pub struct StreamingVerifier {
    algorithm: SignatureAlgorithm,
    key: VerifyingKey,
    signature: Signature,
    digest: Sha512,
}

impl StreamingVerifier {
    /// Start verifying `signature` made by `public_key`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidPublicKey`] if the key bytes are not a
    /// valid curve point.
    pub fn new(
        algorithm: SignatureAlgorithm,
        public_key: &PublicKey,
        signature: &Signature,
    ) -> CryptoResult<Self> {
        Ok(Self {
            algorithm,
            key: public_key.to_verifying_key()?,
            signature: *signature,
            digest: Sha512::new(),
        })
    }

    /// The algorithm this verifier checks.
    #[must_use]
    pub const fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    /// Feed the next chunk of payload.
    pub fn update(&mut self, chunk: &[u8]) {
        self.digest.update(chunk);
    }

    /// Check the signature against everything fed so far.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::SignatureVerificationFailed`] on mismatch.
    pub fn finalize(self) -> CryptoResult<()> {
        match self.algorithm {
            SignatureAlgorithm::Ed25519ph => self
                .key
                .verify_prehashed(
                    self.digest,
                    Some(PACKAGE_SIGNATURE_CONTEXT),
                    &self.signature.to_dalek(),
                )
                .map_err(|_| CryptoError::SignatureVerificationFailed),
        }
    }
}

impl io::Write for StreamingVerifier {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Debug for StreamingVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingVerifier")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}
