//! The manifest document: a read-only, locale-aware view over a key/value tree.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::warn;
use url::Url;
use wharf_core::{ManifestType, SourceType};

use crate::error::{ManifestError, ManifestResult};
use crate::keys;
use crate::xml;

/// Largest manifest file accepted (1 MiB).
pub const MAX_MANIFEST_SIZE: u64 = 1_048_576;

/// Widget elements whose text varies with `xml:lang`.
const WIDGET_LOCALIZED: &[(&str, &str)] = &[
    ("name", keys::WIDGET_NAME),
    ("description", keys::WIDGET_DESCRIPTION),
    ("license", keys::WIDGET_LICENSE),
];

/// JSON fields that `locales.<tag>` may override.
const JSON_LOCALIZED: &[(&str, &str)] = &[
    ("name", keys::NAME),
    ("description", keys::DESCRIPTION),
];

/// A parsed manifest.
///
/// Built once from JSON or widget XML and read-only afterwards: the only
/// mutation is [`set_locale`](Self::set_locale), which changes how localized
/// strings resolve.
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    root: Map<String, Value>,
    source_type: SourceType,
    manifest_version: u32,
    manifest_type: ManifestType,
    /// path -> locale tag (lowercase, "" for the unlabelled value) -> text
    localized: HashMap<String, HashMap<String, String>>,
    default_locale: Option<String>,
    locale: Option<String>,
}

impl ManifestDocument {
    /// Wrap an already-parsed tree.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Parse`] if the root is not an object and
    /// [`ManifestError::InvalidValue`] if `manifest_version` is not a positive integer.
    pub fn new(value: Value, source_type: SourceType) -> ManifestResult<Self> {
        let Value::Object(root) = value else {
            return Err(ManifestError::Parse {
                message: "manifest root must be an object".to_string(),
            });
        };

        let manifest_version = match root.get(keys::MANIFEST_VERSION) {
            None => 1,
            Some(v) => v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| *n >= 1)
                .ok_or_else(|| ManifestError::InvalidValue {
                    key: keys::MANIFEST_VERSION.to_string(),
                    message: format!("expected a positive integer, got {v}"),
                })?,
        };

        let manifest_type = detect_type(&root);
        let mut doc = Self {
            root,
            source_type,
            manifest_version,
            manifest_type,
            localized: HashMap::new(),
            default_locale: None,
            locale: None,
        };
        doc.build_locale_table();
        Ok(doc)
    }

    /// Parse a JSON manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Parse`] for invalid JSON or a non-object root.
    pub fn from_json_str(text: &str, source_type: SourceType) -> ManifestResult<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| ManifestError::Parse {
            message: e.to_string(),
        })?;
        Self::new(value, source_type)
    }

    /// Parse a widget `config.xml`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Parse`] for malformed XML or a non-`<widget>` root.
    pub fn from_widget_xml(text: &str, source_type: SourceType) -> ManifestResult<Self> {
        Self::new(xml::widget_xml_to_value(text)?, source_type)
    }

    /// Load a manifest file, choosing the parser by file name
    /// (`config.xml` is widget XML, anything else is JSON).
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Unreadable`] or [`ManifestError::TooLarge`] if
    /// the file cannot be read, or a parse error for malformed content.
    pub fn load(path: &Path, source_type: SourceType) -> ManifestResult<Self> {
        let text = read_limited(path)?;
        if path.file_name().and_then(|n| n.to_str()) == Some(keys::WIDGET_MANIFEST_FILE) {
            Self::from_widget_xml(&text, source_type)
        } else {
            Self::from_json_str(&text, source_type)
        }
    }

    /// The whole tree.
    #[must_use]
    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    /// Where this manifest came from.
    #[must_use]
    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    /// Resolved `manifest_version` (1 when absent).
    #[must_use]
    pub fn manifest_version(&self) -> u32 {
        self.manifest_version
    }

    /// Hosted, packaged or widget, decided at construction.
    #[must_use]
    pub fn manifest_type(&self) -> ManifestType {
        self.manifest_type
    }

    /// Whether a top-level key exists.
    #[must_use]
    pub fn has_key(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    /// Whether a dotted path resolves to a value.
    #[must_use]
    pub fn has_path(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Walk a dotted path through nested objects.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let mut current = self.root.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Read a value, falling back to a deprecated path with a warning.
    #[must_use]
    pub fn get_or_deprecated(&self, path: &str, deprecated: &str) -> Option<&Value> {
        self.get(path).or_else(|| {
            let value = self.get(deprecated)?;
            warn!(key = deprecated, replacement = path, "Deprecated manifest key");
            Some(value)
        })
    }

    /// Read a string, resolving localized paths against the current locale.
    #[must_use]
    pub fn get_string(&self, path: &str) -> Option<&str> {
        if let Some(by_locale) = self.localized.get(path) {
            for tag in self.locale_chain() {
                if let Some(text) = by_locale.get(&tag) {
                    return Some(text);
                }
            }
        }
        self.get(path)?.as_str()
    }

    /// [`get_string`](Self::get_string) with a deprecated fallback path.
    #[must_use]
    pub fn get_string_or_deprecated(&self, path: &str, deprecated: &str) -> Option<&str> {
        self.get_string(path).or_else(|| {
            let value = self.get_string(deprecated)?;
            warn!(key = deprecated, replacement = path, "Deprecated manifest key");
            Some(value)
        })
    }

    /// Read a list.
    #[must_use]
    pub fn get_list(&self, path: &str) -> Option<&[Value]> {
        self.get(path)?.as_array().map(Vec::as_slice)
    }

    /// Read an object.
    #[must_use]
    pub fn get_dict(&self, path: &str) -> Option<&Map<String, Value>> {
        self.get(path)?.as_object()
    }

    /// Read a node that may be a single object or a list of objects.
    ///
    /// Widget elements only become lists when repeated, so handlers read
    /// them through this accessor. Non-object list items are skipped.
    #[must_use]
    pub fn get_dicts(&self, path: &str) -> Vec<&Map<String, Value>> {
        match self.get(path) {
            Some(Value::Object(map)) => vec![map],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
            _ => Vec::new(),
        }
    }

    /// Switch the locale used by [`get_string`](Self::get_string).
    pub fn set_locale(&mut self, locale: &str) {
        self.locale = Some(locale.to_ascii_lowercase());
    }

    /// The locale set by [`set_locale`](Self::set_locale), lowercase.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Locale the widget declared as its default, lowercase.
    #[must_use]
    pub fn default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }

    fn locale_chain(&self) -> Vec<String> {
        let mut chain = Vec::new();
        for tag in [self.locale.as_deref(), self.default_locale.as_deref()]
            .into_iter()
            .flatten()
        {
            chain.push(tag.to_string());
            if let Some((language, _)) = tag.split_once('-') {
                chain.push(language.to_string());
            }
        }
        chain.push(String::new());
        chain
    }

    fn build_locale_table(&mut self) {
        if self.manifest_type.is_widget() {
            self.default_locale = self
                .get_string(keys::WIDGET_DEFAULT_LOCALE)
                .map(str::to_ascii_lowercase);

            for (element, path) in WIDGET_LOCALIZED {
                let mut by_locale: HashMap<String, String> = HashMap::new();
                let mut first = None;
                for item in self.get_dicts(&format!("{}.{element}", keys::WIDGET)) {
                    let Some(text) = item.get("#text").and_then(Value::as_str) else {
                        continue;
                    };
                    let tag = item
                        .get("@lang")
                        .and_then(Value::as_str)
                        .map(str::to_ascii_lowercase)
                        .unwrap_or_default();
                    first.get_or_insert_with(|| text.to_string());
                    by_locale.entry(tag).or_insert_with(|| text.to_string());
                }
                if let Some(first) = first {
                    by_locale.entry(String::new()).or_insert(first);
                    self.localized.insert((*path).to_string(), by_locale);
                }
            }
        } else if let Some(locales) = self.get_dict(keys::LOCALES) {
            let mut table: HashMap<String, HashMap<String, String>> = HashMap::new();
            for (tag, entry) in locales {
                for (field, path) in JSON_LOCALIZED {
                    if let Some(text) = entry.get(*field).and_then(Value::as_str) {
                        table
                            .entry((*path).to_string())
                            .or_default()
                            .insert(tag.to_ascii_lowercase(), text.to_string());
                    }
                }
            }
            for (_, path) in JSON_LOCALIZED {
                let default = if *path == keys::DESCRIPTION {
                    self.get_string_or_deprecated(path, keys::DEPRECATED_DESCRIPTION)
                } else {
                    self.get_string(path)
                }
                .map(str::to_string);
                if let (Some(by_locale), Some(default)) = (table.get_mut(*path), default) {
                    by_locale.entry(String::new()).or_insert(default);
                }
            }
            self.localized = table;
        }
    }
}

fn detect_type(root: &Map<String, Value>) -> ManifestType {
    if root.contains_key(keys::WIDGET) {
        return ManifestType::Widget;
    }

    let has_local_path = root
        .get("app")
        .and_then(|app| app.get("launch"))
        .and_then(|launch| launch.get("local_path"))
        .is_some();
    let remote_start = root
        .get(keys::START_URL)
        .and_then(Value::as_str)
        .and_then(|s| Url::parse(s).ok())
        .is_some_and(|url| matches!(url.scheme(), "http" | "https"));

    if remote_start && !has_local_path {
        ManifestType::Hosted
    } else {
        ManifestType::Packaged
    }
}

fn read_limited(path: &Path) -> ManifestResult<String> {
    let unreadable = |e: std::io::Error| ManifestError::Unreadable {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let file = File::open(path).map_err(unreadable)?;
    let size = file.metadata().map_err(unreadable)?.len();
    if size > MAX_MANIFEST_SIZE {
        return Err(ManifestError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: MAX_MANIFEST_SIZE,
        });
    }

    let mut text = String::new();
    file.take(MAX_MANIFEST_SIZE)
        .read_to_string(&mut text)
        .map_err(unreadable)?;
    Ok(text)
}
