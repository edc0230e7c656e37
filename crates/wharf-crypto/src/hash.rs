//! BLAKE3 content hashing.
//!
//! Installed packages record the digest of the archive they came from so an
//! operator can tell which artifact is on disk.

use std::fmt;
use std::io::{self, Read};

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// Prefix used when rendering a digest with its algorithm.
const DIGEST_PREFIX: &str = "blake3:";

/// A BLAKE3 hash (32 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash arbitrary data.
    #[must_use]
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Hash everything a reader yields, in fixed-size chunks.
    ///
    /// # Errors
    ///
    /// Returns any I/O error produced by the reader.
    pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut hasher = blake3::Hasher::new();
        io::copy(&mut reader, &mut hasher)?;
        Ok(Self(*hasher.finalize().as_bytes()))
    }

    /// Get the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Encode as hex string.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode from hex string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid hex or not 32 bytes.
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidHexEncoding)?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// Render as `blake3:<hex>`.
    #[must_use]
    pub fn to_prefixed(&self) -> String {
        format!("{DIGEST_PREFIX}{}", self.to_hex())
    }

    /// Parse a `blake3:<hex>` string.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnsupportedAlgorithm`] for any other prefix, or a
    /// hex error if the digest itself is malformed.
    pub fn from_prefixed(s: &str) -> CryptoResult<Self> {
        let hex = s
            .strip_prefix(DIGEST_PREFIX)
            .ok_or_else(|| CryptoError::UnsupportedAlgorithm(s.to_string()))?;
        Self::from_hex(hex)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "ContentHash({})", hex.get(..16).unwrap_or(&hex))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_prefixed())
    }
}

impl Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_prefixed())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_prefixed(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(ContentHash::hash(b"abc"), ContentHash::hash(b"abc"));
        assert_ne!(ContentHash::hash(b"abc"), ContentHash::hash(b"abd"));
    }

    #[test]
    fn test_hash_reader_matches_one_shot() {
        let data = vec![7u8; 200_000];
        let streamed = ContentHash::hash_reader(data.as_slice()).unwrap();
        assert_eq!(streamed, ContentHash::hash(&data));
    }

    #[test]
    fn test_prefixed_form() {
        let h = ContentHash::hash(b"package");
        let s = h.to_prefixed();
        assert!(s.starts_with("blake3:"));
        assert_eq!(ContentHash::from_prefixed(&s).unwrap(), h);
        assert!(matches!(
            ContentHash::from_prefixed(&format!("sha256:{}", h.to_hex())),
            Err(CryptoError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_serde_uses_prefixed_hex() {
        let h = ContentHash::hash(b"x");
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", h.to_prefixed()));
        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
