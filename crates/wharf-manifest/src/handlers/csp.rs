//! Content security policy.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::handler::{HandlerContext, ManifestData, ManifestDataMap, ManifestHandler};
use crate::keys;

/// Policy applied to packaged apps and widgets that declare none.
pub const DEFAULT_CSP: &str =
    "default-src *; script-src 'self'; style-src 'self'; object-src 'none'";

/// Parsed CSP directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CspInfo {
    /// Enforced directives.
    pub directives: BTreeMap<String, Vec<String>>,
    /// Report-only directives (widgets only).
    pub report_only: BTreeMap<String, Vec<String>>,
}

impl CspInfo {
    /// Build from an enforced policy string.
    #[must_use]
    pub fn from_policy(policy: &str) -> Self {
        Self {
            directives: parse_directives(policy),
            report_only: BTreeMap::new(),
        }
    }

    /// The built-in default policy.
    #[must_use]
    pub fn default_policy() -> Self {
        Self::from_policy(DEFAULT_CSP)
    }

    /// Values of one directive.
    #[must_use]
    pub fn directive(&self, name: &str) -> Option<&[String]> {
        self.directives.get(name).map(Vec::as_slice)
    }
}

impl ManifestData for CspInfo {}

/// Split `"name v1 v2; name2 v3"` into a directive map.
///
/// Directive names are lowercased. Empty directives are skipped and a
/// repeated directive keeps its first occurrence.
#[must_use]
pub fn parse_directives(policy: &str) -> BTreeMap<String, Vec<String>> {
    let mut directives = BTreeMap::new();
    for directive in policy.split(';') {
        let mut tokens = directive.split_whitespace();
        let Some(name) = tokens.next() else {
            continue;
        };
        directives
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| tokens.map(str::to_string).collect());
    }
    directives
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavour {
    Json,
    Widget,
}

/// Parses `csp` (JSON) or `content-security-policy` (widget).
#[derive(Debug, Clone, Copy)]
pub struct CspHandler {
    flavour: Flavour,
}

impl CspHandler {
    /// Handler for JSON manifests.
    #[must_use]
    pub const fn json() -> Self {
        Self {
            flavour: Flavour::Json,
        }
    }

    /// Handler for widget descriptors.
    #[must_use]
    pub const fn widget() -> Self {
        Self {
            flavour: Flavour::Widget,
        }
    }
}

fn policy_text(value: Option<&Value>, key: &str) -> Result<Option<String>, String> {
    match value {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Object(element)) => Ok(Some(
            element
                .get("#text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        )),
        Some(_) => Err(format!("'{key}' must be a string")),
    }
}

impl ManifestHandler for CspHandler {
    fn name(&self) -> &'static str {
        "csp"
    }

    fn keys(&self) -> &'static [&'static str] {
        match self.flavour {
            Flavour::Json => &[keys::CSP, keys::DEPRECATED_CSP],
            Flavour::Widget => &[keys::WIDGET_CSP, keys::WIDGET_CSP_REPORT_ONLY],
        }
    }

    fn parse(&self, ctx: &HandlerContext<'_>, data: &mut ManifestDataMap) -> Result<(), String> {
        let manifest = ctx.manifest;
        let info = match self.flavour {
            Flavour::Json => {
                let policy = policy_text(
                    manifest.get_or_deprecated(keys::CSP, keys::DEPRECATED_CSP),
                    keys::CSP,
                )?;
                CspInfo::from_policy(policy.as_deref().unwrap_or_default())
            },
            Flavour::Widget => {
                let policy = policy_text(manifest.get(keys::WIDGET_CSP), keys::WIDGET_CSP)?;
                let report_only = policy_text(
                    manifest.get(keys::WIDGET_CSP_REPORT_ONLY),
                    keys::WIDGET_CSP_REPORT_ONLY,
                )?;
                CspInfo {
                    directives: parse_directives(policy.as_deref().unwrap_or_default()),
                    report_only: parse_directives(report_only.as_deref().unwrap_or_default()),
                }
            },
        };
        data.insert(keys::data::CSP, info);
        Ok(())
    }
}
