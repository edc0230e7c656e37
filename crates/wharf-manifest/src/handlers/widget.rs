//! Widget metadata exposed to the widget scripting interface.

use std::collections::HashSet;

use serde_json::{Map, Value};
use url::Url;
use wharf_core::ManifestType;

use crate::handler::{HandlerContext, ManifestData, ManifestDataMap, ManifestHandler};
use crate::keys;

/// Start page used when `<content>` is absent.
pub const DEFAULT_WIDGET_START_PAGE: &str = "index.html";

/// One `<preference>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preference {
    /// Preference name, unique within the widget.
    pub name: String,
    /// Initial value.
    pub value: Option<String>,
    /// `readonly="true"`.
    pub readonly: bool,
}

/// Descriptive widget fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetInfo {
    /// Widget id IRI.
    pub id: String,
    /// Localized name.
    pub name: String,
    /// Short name.
    pub short_name: String,
    /// Localized description.
    pub description: String,
    /// Version attribute as written.
    pub version: String,
    /// Author name.
    pub author: String,
    /// Author e-mail.
    pub author_email: String,
    /// Author page; cleared when it is not a valid URL.
    pub author_href: String,
    /// Preferred height.
    pub height: String,
    /// Preferred width.
    pub width: String,
    /// Start page relative to the widget root.
    pub content_src: String,
    /// Preferences; later duplicates of a name are dropped.
    pub preferences: Vec<Preference>,
}

impl ManifestData for WidgetInfo {}

/// Parses the `<widget>` root.
#[derive(Debug, Clone, Copy)]
pub struct WidgetHandler;

fn parse_preference(item: &Map<String, Value>, used: &mut HashSet<String>) -> Option<Preference> {
    let name = item.get("@name").and_then(Value::as_str)?;
    if !used.insert(name.to_string()) {
        return None;
    }
    Some(Preference {
        name: name.to_string(),
        value: item.get("@value").and_then(Value::as_str).map(str::to_string),
        readonly: item.get("@readonly").and_then(Value::as_str) == Some("true"),
    })
}

impl ManifestHandler for WidgetHandler {
    fn name(&self) -> &'static str {
        "widget"
    }

    fn keys(&self) -> &'static [&'static str] {
        &[keys::WIDGET]
    }

    fn parse(&self, ctx: &HandlerContext<'_>, data: &mut ManifestDataMap) -> Result<(), String> {
        let m = ctx.manifest;
        let text = |path: &str| m.get_string(path).unwrap_or_default().to_string();

        let mut author_href = text(keys::WIDGET_AUTHOR_HREF);
        if !author_href.is_empty() && Url::parse(&author_href).is_err() {
            author_href.clear();
        }

        let mut used = HashSet::new();
        let preferences = m
            .get_dicts(keys::WIDGET_PREFERENCE)
            .into_iter()
            .filter_map(|item| parse_preference(item, &mut used))
            .collect();

        let content_src = m
            .get_string(keys::WIDGET_CONTENT_SRC)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_WIDGET_START_PAGE)
            .to_string();

        let info = WidgetInfo {
            id: text(keys::WIDGET_ID),
            name: text(keys::WIDGET_NAME),
            short_name: text(keys::WIDGET_SHORT_NAME),
            description: text(keys::WIDGET_DESCRIPTION),
            version: text(keys::WIDGET_VERSION),
            author: text(keys::WIDGET_AUTHOR),
            author_email: text(keys::WIDGET_AUTHOR_EMAIL),
            author_href,
            height: text(keys::WIDGET_HEIGHT),
            width: text(keys::WIDGET_WIDTH),
            content_src,
            preferences,
        };
        data.insert(keys::data::WIDGET, info);
        Ok(())
    }

    fn validate(&self, ctx: &HandlerContext<'_>, _data: &ManifestDataMap) -> Result<(), String> {
        let namespace = ctx
            .manifest
            .get_string(keys::WIDGET_NAMESPACE)
            .ok_or_else(|| "failed to retrieve the widget's namespace".to_string())?;
        if namespace.eq_ignore_ascii_case(keys::WIDGET_NAMESPACE_URI) {
            Ok(())
        } else {
            Err(format!("the widget namespace '{namespace}' is invalid"))
        }
    }

    fn always_parse_for_type(&self, manifest_type: ManifestType) -> bool {
        manifest_type.is_widget()
    }

    fn hard_validation(&self) -> bool {
        true
    }
}
