//! Requested API permissions (`"permissions": ["contacts", "messaging"]`).

use std::collections::BTreeSet;

use serde_json::Value;

use crate::handler::{HandlerContext, ManifestData, ManifestDataMap, ManifestHandler};
use crate::keys;

/// API names an application asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionsInfo {
    /// Requested APIs, de-duplicated.
    pub api_permissions: BTreeSet<String>,
}

impl ManifestData for PermissionsInfo {}

/// Parses `permissions`.
#[derive(Debug, Clone, Copy)]
pub struct PermissionsHandler;

impl ManifestHandler for PermissionsHandler {
    fn name(&self) -> &'static str {
        "permissions"
    }

    fn keys(&self) -> &'static [&'static str] {
        &[keys::PERMISSIONS]
    }

    fn parse(&self, ctx: &HandlerContext<'_>, data: &mut ManifestDataMap) -> Result<(), String> {
        let list = ctx
            .manifest
            .get_list(keys::PERMISSIONS)
            .ok_or_else(|| "'permissions' must be a list".to_string())?;

        let mut api_permissions = BTreeSet::new();
        for item in list {
            let Value::String(name) = item else {
                return Err(format!("invalid permission entry: {item}"));
            };
            if !name.is_empty() {
                api_permissions.insert(name.clone());
            }
        }

        data.insert(keys::data::PERMISSIONS, PermissionsInfo { api_permissions });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;
    use wharf_core::SourceType;

    use super::*;
    use crate::document::ManifestDocument;

    fn parse(v: Value) -> Result<ManifestDataMap, String> {
        let manifest = ManifestDocument::new(v, SourceType::Internal).unwrap();
        let ctx = HandlerContext {
            manifest: &manifest,
            app_path: Path::new("/"),
        };
        let mut data = ManifestDataMap::new();
        PermissionsHandler.parse(&ctx, &mut data)?;
        Ok(data)
    }

    #[test]
    fn test_collects_names() {
        let data = parse(json!({"permissions": ["contacts", "messaging", "contacts", ""]})).unwrap();
        let info = data.get::<PermissionsInfo>(keys::data::PERMISSIONS).unwrap();
        assert_eq!(
            info.api_permissions.iter().collect::<Vec<_>>(),
            vec!["contacts", "messaging"]
        );
    }

    #[test]
    fn test_rejects_non_list_and_non_string() {
        assert!(parse(json!({"permissions": "contacts"})).is_err());
        assert!(parse(json!({"permissions": ["ok", 3]})).is_err());
    }
}
