//! Application-control declarations: which page handles which operation.

use serde_json::{Map, Value};

use crate::handler::{HandlerContext, ManifestData, ManifestDataMap, ManifestHandler};
use crate::keys;

/// One `<app-control>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppControl {
    /// Page that handles the request.
    pub src: Option<String>,
    /// Operation IRI.
    pub operation: Option<String>,
    /// URI scheme filter.
    pub uri: Option<String>,
    /// MIME type filter.
    pub mime: Option<String>,
}

/// All application-control declarations of a widget.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppControlInfo {
    /// Declarations in document order.
    pub controls: Vec<AppControl>,
}

impl ManifestData for AppControlInfo {}

/// Parses `widget.app-control`.
#[derive(Debug, Clone, Copy)]
pub struct AppControlHandler;

fn child_name(item: &Map<String, Value>, child: &str) -> Option<String> {
    item.get(child)?
        .get("@name")?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ManifestHandler for AppControlHandler {
    fn name(&self) -> &'static str {
        "app_control"
    }

    fn keys(&self) -> &'static [&'static str] {
        &[keys::WIDGET_APP_CONTROL]
    }

    fn parse(&self, ctx: &HandlerContext<'_>, data: &mut ManifestDataMap) -> Result<(), String> {
        let controls = ctx
            .manifest
            .get_dicts(keys::WIDGET_APP_CONTROL)
            .into_iter()
            .map(|item| AppControl {
                src: child_name(item, "src"),
                operation: child_name(item, "operation"),
                uri: child_name(item, "uri"),
                mime: child_name(item, "mime"),
            })
            .collect();
        data.insert(keys::data::APP_CONTROL, AppControlInfo { controls });
        Ok(())
    }

    fn validate(&self, _ctx: &HandlerContext<'_>, data: &ManifestDataMap) -> Result<(), String> {
        let Some(info) = data.get::<AppControlInfo>(keys::data::APP_CONTROL) else {
            return Ok(());
        };
        for control in &info.controls {
            if control.src.is_none() {
                return Err("app-control is missing its src".to_string());
            }
            if control.operation.is_none() {
                return Err("app-control is missing its operation".to_string());
            }
        }
        Ok(())
    }

    fn hard_validation(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use wharf_core::SourceType;

    use super::*;
    use crate::document::ManifestDocument;

    fn run(xml: &str) -> (Result<(), String>, AppControlInfo) {
        let manifest = ManifestDocument::from_widget_xml(xml, SourceType::Internal).unwrap();
        let ctx = HandlerContext {
            manifest: &manifest,
            app_path: Path::new("/"),
        };
        let mut data = ManifestDataMap::new();
        AppControlHandler.parse(&ctx, &mut data).unwrap();
        let info = data
            .get::<AppControlInfo>(keys::data::APP_CONTROL)
            .unwrap()
            .clone();
        (AppControlHandler.validate(&ctx, &data), info)
    }

    #[test]
    fn test_complete_declarations() {
        let (result, info) = run(
            r#"<widget xmlns="http://www.w3.org/ns/widgets">
                 <app-control>
                   <src name="edit.html"/>
                   <operation name="http://example.com/op/edit"/>
                   <mime name="image/png"/>
                 </app-control>
                 <app-control>
                   <src name="view.html"/>
                   <operation name="http://example.com/op/view"/>
                 </app-control>
               </widget>"#,
        );
        assert!(result.is_ok());
        assert_eq!(info.controls.len(), 2);
        assert_eq!(info.controls[0].mime.as_deref(), Some("image/png"));
        assert!(info.controls[1].uri.is_none());
    }

    #[test]
    fn test_missing_operation_rejected() {
        let (result, _) = run(
            r#"<widget xmlns="http://www.w3.org/ns/widgets">
                 <app-control><src name="edit.html"/></app-control>
               </widget>"#,
        );
        assert!(result.unwrap_err().contains("operation"));
    }
}
