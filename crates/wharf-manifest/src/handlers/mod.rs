//! Built-in manifest handlers.

mod app_control;
mod csp;
mod main_document;
mod navigation;
mod permissions;
mod warp;
mod widget;

pub use app_control::{AppControl, AppControlHandler, AppControlInfo};
pub use csp::{CspHandler, CspInfo, DEFAULT_CSP, parse_directives};
pub use main_document::{EntryPoint, MainDocumentHandler, MainDocumentInfo};
pub use navigation::{NavigationHandler, NavigationInfo};
pub use permissions::{PermissionsHandler, PermissionsInfo};
pub use warp::{WarpEntry, WarpHandler, WarpInfo};
pub use widget::{DEFAULT_WIDGET_START_PAGE, Preference, WidgetHandler, WidgetInfo};
