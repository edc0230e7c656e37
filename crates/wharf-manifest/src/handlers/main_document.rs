//! Entry point of a JSON-described application.

use std::path::{Component, Path};

use serde_json::Value;
use url::Url;
use wharf_core::ManifestType;

use crate::handler::{HandlerContext, ManifestData, ManifestDataMap, ManifestHandler};
use crate::keys;

/// Where an application starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPoint {
    /// A file inside the application directory.
    Local(String),
    /// A remote page (hosted apps).
    Remote(Url),
}

/// The resolved entry point, if the manifest declares one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MainDocumentInfo {
    /// Entry point; `None` fails validation.
    pub entry: Option<EntryPoint>,
}

impl ManifestData for MainDocumentInfo {}

/// Reads `app.launch.local_path` or `start_url`.
#[derive(Debug, Clone, Copy)]
pub struct MainDocumentHandler;

fn string_at(value: Option<&Value>, key: &str) -> Result<Option<String>, String> {
    match value {
        None => Ok(None),
        Some(Value::String(s)) if !s.is_empty() => Ok(Some(s.clone())),
        Some(_) => Err(format!("'{key}' must be a non-empty string")),
    }
}

impl ManifestHandler for MainDocumentHandler {
    fn name(&self) -> &'static str {
        "main_document"
    }

    fn keys(&self) -> &'static [&'static str] {
        &[keys::LAUNCH_LOCAL_PATH, keys::START_URL]
    }

    fn parse(&self, ctx: &HandlerContext<'_>, data: &mut ManifestDataMap) -> Result<(), String> {
        let manifest = ctx.manifest;
        let local = string_at(manifest.get(keys::LAUNCH_LOCAL_PATH), keys::LAUNCH_LOCAL_PATH)?;
        let start = string_at(manifest.get(keys::START_URL), keys::START_URL)?;

        let entry = match (local, start) {
            (Some(path), _) => Some(EntryPoint::Local(path.trim_start_matches('/').to_string())),
            (None, Some(start)) => Some(match Url::parse(&start) {
                Ok(url) => EntryPoint::Remote(url),
                Err(_) => EntryPoint::Local(start.trim_start_matches('/').to_string()),
            }),
            (None, None) => None,
        };

        data.insert(keys::data::MAIN_DOCUMENT, MainDocumentInfo { entry });
        Ok(())
    }

    fn validate(&self, ctx: &HandlerContext<'_>, data: &ManifestDataMap) -> Result<(), String> {
        let entry = data
            .get::<MainDocumentInfo>(keys::data::MAIN_DOCUMENT)
            .and_then(|info| info.entry.as_ref())
            .ok_or_else(|| {
                format!(
                    "no entry point: set '{}' or '{}'",
                    keys::LAUNCH_LOCAL_PATH,
                    keys::START_URL
                )
            })?;

        match entry {
            EntryPoint::Remote(url) => {
                if matches!(url.scheme(), "http" | "https") {
                    Ok(())
                } else {
                    Err(format!("unsupported start URL scheme '{}'", url.scheme()))
                }
            },
            EntryPoint::Local(path) => {
                let relative = Path::new(path);
                if relative
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
                {
                    return Err(format!("entry point '{path}' escapes the application directory"));
                }
                if ctx.app_path.join(relative).is_file() {
                    Ok(())
                } else {
                    Err(format!("entry point '{path}' does not exist"))
                }
            },
        }
    }

    fn always_parse_for_type(&self, manifest_type: ManifestType) -> bool {
        matches!(manifest_type, ManifestType::Hosted | ManifestType::Packaged)
    }

    fn hard_validation(&self) -> bool {
        true
    }
}
