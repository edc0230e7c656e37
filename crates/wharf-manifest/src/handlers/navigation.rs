//! Widget navigation allow-list (`<allow-navigation>host1 *.host2</allow-navigation>`).

use crate::handler::{HandlerContext, ManifestData, ManifestDataMap, ManifestHandler};
use crate::handlers::warp::WarpInfo;
use crate::keys;

/// Hosts a widget may navigate to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationInfo {
    /// Host patterns: `example.com`, `*.example.com` or `*`.
    pub hosts: Vec<String>,
}

impl ManifestData for NavigationInfo {}

/// Parses `widget.allow-navigation` after WARP, dropping hosts WARP already grants.
///
/// `ApplicationRecord` rejects widgets declaring both a CSP and `<access>`,
/// and the security policy reads these hosts only in CSP mode. The WARP pass
/// therefore matters only to callers reading [`NavigationInfo`] from a
/// registry run directly, as the tests below do.
#[derive(Debug, Clone, Copy)]
pub struct NavigationHandler;

impl ManifestHandler for NavigationHandler {
    fn name(&self) -> &'static str {
        "navigation"
    }

    fn keys(&self) -> &'static [&'static str] {
        &[keys::WIDGET_ALLOW_NAVIGATION]
    }

    fn prerequisite_keys(&self) -> &'static [&'static str] {
        &[keys::WIDGET_ACCESS]
    }

    fn parse(&self, ctx: &HandlerContext<'_>, data: &mut ManifestDataMap) -> Result<(), String> {
        let text = ctx
            .manifest
            .get_string(&format!("{}.#text", keys::WIDGET_ALLOW_NAVIGATION))
            .unwrap_or_default();

        let warp_hosts: Vec<String> = data
            .get::<WarpInfo>(keys::data::WARP)
            .map(|warp| warp.hosts().collect())
            .unwrap_or_default();

        let mut hosts: Vec<String> = Vec::new();
        for host in text.split_whitespace() {
            if warp_hosts.iter().any(|w| w == host) || hosts.iter().any(|h| h == host) {
                continue;
            }
            hosts.push(host.to_string());
        }

        data.insert(keys::data::NAVIGATION, NavigationInfo { hosts });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use wharf_core::SourceType;

    use super::*;
    use crate::document::ManifestDocument;
    use crate::handlers::warp::WarpHandler;

    #[test]
    fn test_drops_hosts_granted_by_warp() {
        let manifest = ManifestDocument::from_widget_xml(
            r#"<widget xmlns="http://www.w3.org/ns/widgets">
                 <access origin="https://shared.example.com"/>
                 <allow-navigation>shared.example.com *.other.org other.org other.org</allow-navigation>
               </widget>"#,
            SourceType::Internal,
        )
        .unwrap();
        let ctx = HandlerContext {
            manifest: &manifest,
            app_path: Path::new("/"),
        };
        let mut data = ManifestDataMap::new();
        WarpHandler.parse(&ctx, &mut data).unwrap();
        NavigationHandler.parse(&ctx, &mut data).unwrap();

        let nav = data.get::<NavigationInfo>(keys::data::NAVIGATION).unwrap();
        assert_eq!(nav.hosts, vec!["*.other.org", "other.org"]);
    }

    #[test]
    fn test_without_warp() {
        let manifest = ManifestDocument::from_widget_xml(
            r#"<widget xmlns="http://www.w3.org/ns/widgets"><allow-navigation>*</allow-navigation></widget>"#,
            SourceType::Internal,
        )
        .unwrap();
        let ctx = HandlerContext {
            manifest: &manifest,
            app_path: Path::new("/"),
        };
        let mut data = ManifestDataMap::new();
        NavigationHandler.parse(&ctx, &mut data).unwrap();
        assert_eq!(
            data.get::<NavigationInfo>(keys::data::NAVIGATION).unwrap().hosts,
            vec!["*"]
        );
    }
}
