//! Classification types shared across the lifecycle crates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The kind of manifest an application was described by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestType {
    /// A JSON manifest whose entry point is a remote `http(s)` URL.
    Hosted,
    /// A JSON manifest whose entry point ships inside the package.
    Packaged,
    /// A W3C widget described by `config.xml`.
    Widget,
}

impl ManifestType {
    /// Whether this is the widget (archive + XML descriptor) flavour.
    #[must_use]
    pub const fn is_widget(self) -> bool {
        matches!(self, Self::Widget)
    }
}

impl fmt::Display for ManifestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hosted => write!(f, "hosted"),
            Self::Packaged => write!(f, "packaged"),
            Self::Widget => write!(f, "widget"),
        }
    }
}

/// Where a manifest was loaded from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Installed through the package installer.
    #[default]
    Internal,
    /// Launched directly from a path given on a command line.
    CommandLine,
    /// Installed from an unpacked development directory.
    Local,
}

/// A persisted decision for one API permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    /// Always allowed.
    Allow,
    /// Always denied.
    Deny,
    /// Ask the user at use time.
    Prompt,
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Deny => write!(f, "deny"),
            Self::Prompt => write!(f, "prompt"),
        }
    }
}

impl FromStr for PermissionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            "prompt" => Ok(Self::Prompt),
            _ => Err(CoreError::UnknownPermissionStatus(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_status_parse() {
        assert_eq!("ALLOW".parse::<PermissionStatus>().unwrap(), PermissionStatus::Allow);
        assert_eq!("prompt".parse::<PermissionStatus>().unwrap(), PermissionStatus::Prompt);
        assert!("undefined".parse::<PermissionStatus>().is_err());
    }

    #[test]
    fn test_manifest_type_serde() {
        let json = serde_json::to_string(&ManifestType::Widget).unwrap();
        assert_eq!(json, "\"widget\"");
        assert!(ManifestType::Widget.is_widget());
        assert!(!ManifestType::Hosted.is_widget());
    }
}
