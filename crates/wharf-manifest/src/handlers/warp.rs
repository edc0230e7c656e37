//! Widget access requests (`<access origin=".." subdomains="..">`).

use serde_json::Value;
use url::Url;

use crate::handler::{HandlerContext, ManifestData, ManifestDataMap, ManifestHandler};
use crate::keys;

/// One `<access>` element as declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarpEntry {
    /// Declared origin; `"*"` grants everything, empty entries are kept as-is.
    pub origin: String,
    /// `subdomains="true"`.
    pub subdomains: bool,
}

/// All access requests of a widget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarpInfo {
    /// Entries in document order.
    pub entries: Vec<WarpEntry>,
}

impl WarpInfo {
    /// Whether any entry grants access to every origin.
    #[must_use]
    pub fn grants_all(&self) -> bool {
        self.entries.iter().any(|e| e.origin == "*")
    }

    /// Hosts of all entries that parse as URLs.
    pub fn hosts(&self) -> impl Iterator<Item = String> + '_ {
        self.entries
            .iter()
            .filter_map(|e| Url::parse(&e.origin).ok())
            .filter_map(|u| u.host_str().map(str::to_string))
    }
}

impl ManifestData for WarpInfo {}

/// Parses `widget.access`.
#[derive(Debug, Clone, Copy)]
pub struct WarpHandler;

impl ManifestHandler for WarpHandler {
    fn name(&self) -> &'static str {
        "warp"
    }

    fn keys(&self) -> &'static [&'static str] {
        &[keys::WIDGET_ACCESS]
    }

    fn parse(&self, ctx: &HandlerContext<'_>, data: &mut ManifestDataMap) -> Result<(), String> {
        let entries = ctx
            .manifest
            .get_dicts(keys::WIDGET_ACCESS)
            .into_iter()
            .map(|access| WarpEntry {
                origin: access
                    .get("@origin")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                subdomains: access.get("@subdomains").and_then(Value::as_str) == Some("true"),
            })
            .collect();
        data.insert(keys::data::WARP, WarpInfo { entries });
        Ok(())
    }

    fn validate(&self, _ctx: &HandlerContext<'_>, data: &ManifestDataMap) -> Result<(), String> {
        let Some(info) = data.get::<WarpInfo>(keys::data::WARP) else {
            return Ok(());
        };
        for entry in &info.entries {
            if entry.origin.is_empty() || entry.origin == "*" {
                continue;
            }
            let url = Url::parse(&entry.origin)
                .map_err(|e| format!("invalid access origin '{}': {e}", entry.origin))?;
            if url.host_str().is_none() {
                return Err(format!("access origin '{}' has no host", entry.origin));
            }
        }
        Ok(())
    }
}
