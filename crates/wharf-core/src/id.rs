//! Application identifiers.
//!
//! Generated ids hash a stable input (a package's public key, or the absolute
//! path of an unpacked install) with SHA-256 and spell the first 16 bytes using
//! the alphabet `a`..`p`, one letter per nibble. The result never contains a
//! digit, so it cannot be mistaken for a number or an IP address when used as
//! the authority of an `app://` URL.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CoreError, CoreResult};

/// Length of a generated id in characters.
pub const GENERATED_ID_LEN: usize = 32;

/// Maximum length accepted for an explicit id.
const MAX_ID_LEN: usize = 128;

/// Number of digest bytes that make up a generated id.
const ID_DIGEST_BYTES: usize = 16;

/// Nibble alphabet for generated ids.
const ID_ALPHABET: &[u8; 16] = b"abcdefghijklmnop";

/// A validated application identifier.
///
/// Ids double as directory names under the applications root, so explicit
/// ids are restricted to ASCII alphanumerics plus `.`, `_` and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AppId(String);

impl AppId {
    /// Validate and wrap an explicit id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAppId`] if the id is empty, too long,
    /// starts with `.`, or contains characters outside `[A-Za-z0-9._-]`.
    pub fn new(id: impl Into<String>) -> CoreResult<Self> {
        let id = id.into();
        let reject = |reason: &str| CoreError::InvalidAppId {
            id: id.clone(),
            reason: reason.to_string(),
        };

        if id.is_empty() {
            return Err(reject("id must not be empty"));
        }
        if id.len() > MAX_ID_LEN {
            return Err(reject("id exceeds 128 bytes"));
        }
        if id.starts_with('.') {
            return Err(reject("id must not start with '.'"));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(reject("id may only contain [A-Za-z0-9._-]"));
        }

        Ok(Self(id))
    }

    /// Derive an id from arbitrary bytes.
    #[must_use]
    pub fn generate(input: &[u8]) -> Self {
        let digest = Sha256::digest(input);
        let hex = hex::encode(&digest[..ID_DIGEST_BYTES]);
        let id = hex
            .chars()
            .filter_map(|c| c.to_digit(16))
            .filter_map(|nibble| usize::try_from(nibble).ok())
            .filter_map(|nibble| ID_ALPHABET.get(nibble))
            .map(|&b| char::from(b))
            .collect();
        Self(id)
    }

    /// Derive the id of a signed package from its embedded public key.
    #[must_use]
    pub fn from_public_key(key: &[u8]) -> Self {
        Self::generate(key)
    }

    /// Derive the id of an unpacked install from its absolute path.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        Self::generate(path.to_string_lossy().as_bytes())
    }

    /// Whether this id has the shape of a generated id.
    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.0.len() == GENERATED_ID_LEN && self.0.bytes().all(|b| ID_ALPHABET.contains(&b))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AppId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AppId> for String {
    fn from(id: AppId) -> Self {
        id.0
    }
}

impl AsRef<str> for AppId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_shape() {
        let id = AppId::generate(b"some public key");
        assert_eq!(id.as_str().len(), GENERATED_ID_LEN);
        assert!(id.as_str().bytes().all(|b| (b'a'..=b'p').contains(&b)));
        assert!(id.is_generated());
    }

    #[test]
    fn test_generated_id_is_stable() {
        assert_eq!(AppId::generate(b"key"), AppId::generate(b"key"));
        assert_ne!(AppId::generate(b"key"), AppId::generate(b"other key"));
    }

    #[test]
    fn test_generated_id_known_value() {
        // SHA-256("") starts with e3b0c442 98fc1c14 9afbf4c8 996fb924.
        let id = AppId::generate(b"");
        assert_eq!(id.as_str(), "odlameecjipmbmbejkplpemijjgpljce");
    }

    #[test]
    fn test_from_path_matches_generate() {
        let path = Path::new("/opt/apps/demo");
        assert_eq!(AppId::from_path(path), AppId::generate(b"/opt/apps/demo"));
    }

    #[test]
    fn test_explicit_id_accepted() {
        let id = AppId::new("org.example.Demo_1-2").unwrap();
        assert_eq!(id.to_string(), "org.example.Demo_1-2");
        assert!(!id.is_generated());
    }

    #[test]
    fn test_explicit_id_rejections() {
        assert!(AppId::new("").is_err());
        assert!(AppId::new(".hidden").is_err());
        assert!(AppId::new("../escape").is_err());
        assert!(AppId::new("a/b").is_err());
        assert!(AppId::new("with space").is_err());
        assert!(AppId::new("x".repeat(129)).is_err());
    }

    #[test]
    fn test_serde_validates() {
        let id: AppId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(id.as_str(), "abc");
        assert!(serde_json::from_str::<AppId>("\"a/b\"").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
