//! The handler contract and the typed records handlers produce.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use wharf_core::ManifestType;

use crate::document::ManifestDocument;

/// A typed record parsed from one section of a manifest.
pub trait ManifestData: Any + fmt::Debug + Send + Sync {}

/// Records produced by a parse pass, keyed by data key.
///
/// Filled once while an application is constructed and only read afterwards.
#[derive(Debug, Default)]
pub struct ManifestDataMap {
    entries: HashMap<String, Box<dyn ManifestData>>,
}

impl ManifestDataMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record, replacing any record under the same key.
    pub fn insert<T: ManifestData>(&mut self, key: impl Into<String>, data: T) {
        self.entries.insert(key.into(), Box::new(data));
    }

    /// Borrow a record if it exists and has type `T`.
    #[must_use]
    pub fn get<T: ManifestData>(&self, key: &str) -> Option<&T> {
        let data: &dyn ManifestData = self.entries.get(key)?.as_ref();
        let any: &dyn Any = data;
        any.downcast_ref::<T>()
    }

    /// Whether any record is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Stored keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What a handler can see while parsing or validating.
#[derive(Debug, Clone, Copy)]
pub struct HandlerContext<'a> {
    /// The manifest being processed.
    pub manifest: &'a ManifestDocument,
    /// Directory the application lives in.
    pub app_path: &'a Path,
}

impl HandlerContext<'_> {
    /// Shorthand for the manifest's type.
    #[must_use]
    pub fn manifest_type(&self) -> ManifestType {
        self.manifest.manifest_type()
    }
}

/// One pluggable section parser.
///
/// Handlers are stateless: everything they learn goes into the
/// [`ManifestDataMap`]. Errors are plain messages, the registry attaches the
/// handler name.
pub trait ManifestHandler: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Manifest paths this handler owns. Presence of any of them selects it.
    fn keys(&self) -> &'static [&'static str];

    /// Keys whose handlers must run before this one.
    fn prerequisite_keys(&self) -> &'static [&'static str] {
        &[]
    }

    /// Parse the owned section into one or more records.
    ///
    /// # Errors
    ///
    /// A message describing why the section is unusable. Aborts construction.
    fn parse(&self, ctx: &HandlerContext<'_>, data: &mut ManifestDataMap) -> Result<(), String>;

    /// Check parsed records for consistency.
    ///
    /// # Errors
    ///
    /// A message describing the problem. Fatal only for hard-validating handlers.
    fn validate(&self, _ctx: &HandlerContext<'_>, _data: &ManifestDataMap) -> Result<(), String> {
        Ok(())
    }

    /// Run [`parse`](Self::parse) even when none of the keys are present.
    fn always_parse_for_type(&self, _manifest_type: ManifestType) -> bool {
        false
    }

    /// Run [`validate`](Self::validate) even when none of the keys are present.
    fn always_validate_for_type(&self, manifest_type: ManifestType) -> bool {
        self.always_parse_for_type(manifest_type)
    }

    /// Whether a validation failure rejects the application.
    fn hard_validation(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Alpha(u32);
    impl ManifestData for Alpha {}

    #[derive(Debug)]
    struct Beta;
    impl ManifestData for Beta {}

    #[test]
    fn test_typed_lookup() {
        let mut map = ManifestDataMap::new();
        map.insert("a", Alpha(7));
        map.insert("b", Beta);

        assert_eq!(map.get::<Alpha>("a"), Some(&Alpha(7)));
        assert!(map.get::<Beta>("a").is_none());
        assert!(map.get::<Alpha>("missing").is_none());
        assert!(map.contains("b"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_repeated_reads_are_stable() {
        let mut map = ManifestDataMap::new();
        map.insert("a", Alpha(1));
        let first = map.get::<Alpha>("a").map(|a| a.0);
        let second = map.get::<Alpha>("a").map(|a| a.0);
        assert_eq!(first, second);
    }
}
