//! Well-known manifest paths and manifest-data keys.
//!
//! Paths are dotted walks through the document tree. Widget paths follow the
//! XML conversion rules: attributes are `@name`, element text is `#text`.

/// Name of the JSON manifest file inside an application directory.
pub const JSON_MANIFEST_FILE: &str = "manifest.json";
/// Name of the widget descriptor inside an application directory.
pub const WIDGET_MANIFEST_FILE: &str = "config.xml";

/// `manifest_version` (integer, default 1).
pub const MANIFEST_VERSION: &str = "manifest_version";
/// Application name.
pub const NAME: &str = "name";
/// Application version.
pub const VERSION: &str = "xwalk_version";
/// Older spelling of [`VERSION`].
pub const DEPRECATED_VERSION: &str = "version";
/// Application description.
pub const DESCRIPTION: &str = "xwalk_description";
/// Older spelling of [`DESCRIPTION`].
pub const DEPRECATED_DESCRIPTION: &str = "description";
/// Per-locale overrides: `locales.<tag>.name` / `locales.<tag>.description`.
pub const LOCALES: &str = "locales";
/// Content security policy string.
pub const CSP: &str = "csp";
/// Older spelling of [`CSP`].
pub const DEPRECATED_CSP: &str = "content_security_policy";
/// Entry point, absolute for hosted apps or relative for packaged ones.
pub const START_URL: &str = "start_url";
/// Packaged entry point relative to the application directory.
pub const LAUNCH_LOCAL_PATH: &str = "app.launch.local_path";
/// Sub-path of the app origin the app is restricted to.
pub const SCOPE: &str = "scope";
/// Requested API permissions.
pub const PERMISSIONS: &str = "permissions";

/// Root of a widget descriptor.
pub const WIDGET: &str = "widget";
/// Namespace of the widget root element.
pub const WIDGET_NAMESPACE: &str = "widget.@namespace";
/// Widget id attribute.
pub const WIDGET_ID: &str = "widget.@id";
/// Widget version attribute.
pub const WIDGET_VERSION: &str = "widget.@version";
/// Widget default locale attribute.
pub const WIDGET_DEFAULT_LOCALE: &str = "widget.@defaultlocale";
/// Widget height attribute.
pub const WIDGET_HEIGHT: &str = "widget.@height";
/// Widget width attribute.
pub const WIDGET_WIDTH: &str = "widget.@width";
/// Widget name text (localized).
pub const WIDGET_NAME: &str = "widget.name.#text";
/// Widget short name attribute.
pub const WIDGET_SHORT_NAME: &str = "widget.name.@short";
/// Widget description text (localized).
pub const WIDGET_DESCRIPTION: &str = "widget.description.#text";
/// Widget license text (localized).
pub const WIDGET_LICENSE: &str = "widget.license.#text";
/// Widget author text.
pub const WIDGET_AUTHOR: &str = "widget.author.#text";
/// Widget author e-mail.
pub const WIDGET_AUTHOR_EMAIL: &str = "widget.author.@email";
/// Widget author home page.
pub const WIDGET_AUTHOR_HREF: &str = "widget.author.@href";
/// Widget start page.
pub const WIDGET_CONTENT_SRC: &str = "widget.content.@src";
/// Widget preferences (dict or list).
pub const WIDGET_PREFERENCE: &str = "widget.preference";
/// WARP access requests (dict or list).
pub const WIDGET_ACCESS: &str = "widget.access";
/// Widget CSP element.
pub const WIDGET_CSP: &str = "widget.content-security-policy";
/// Widget report-only CSP element.
pub const WIDGET_CSP_REPORT_ONLY: &str = "widget.content-security-policy-report-only";
/// Widget navigation allow-list element.
pub const WIDGET_ALLOW_NAVIGATION: &str = "widget.allow-navigation";
/// Widget application-control declarations (dict or list).
pub const WIDGET_APP_CONTROL: &str = "widget.app-control";

/// The W3C widget namespace.
pub const WIDGET_NAMESPACE_URI: &str = "http://www.w3.org/ns/widgets";

/// Keys under which handlers store their parsed records.
pub mod data {
    /// [`CspInfo`](crate::CspInfo), for both manifest flavours.
    pub const CSP: &str = "csp";
    /// [`WarpInfo`](crate::WarpInfo).
    pub const WARP: &str = "widget.access";
    /// [`NavigationInfo`](crate::NavigationInfo).
    pub const NAVIGATION: &str = "widget.allow-navigation";
    /// [`PermissionsInfo`](crate::PermissionsInfo).
    pub const PERMISSIONS: &str = "permissions";
    /// [`MainDocumentInfo`](crate::MainDocumentInfo).
    pub const MAIN_DOCUMENT: &str = "app.main";
    /// [`WidgetInfo`](crate::WidgetInfo).
    pub const WIDGET: &str = "widget";
    /// [`AppControlInfo`](crate::AppControlInfo).
    pub const APP_CONTROL: &str = "widget.app-control";
}
