//! Network access policy derived from an application's manifest.
//!
//! An application is in one of three modes. With a declared CSP the policy
//! allow-lists origins named by the CSP (JSON manifests) or by
//! `allow-navigation` (widgets). Widgets without a CSP use their WARP
//! `<access>` rules. Everything else is unrestricted.

use tracing::{debug, warn};
use url::Url;
use wharf_core::AppId;
use wharf_manifest::{NavigationInfo, WarpInfo, keys};

use crate::record::{APP_SCHEME, ApplicationRecord};

/// Which rule set governs an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMode {
    /// No restriction.
    NoSecurity,
    /// Content security policy.
    Csp,
    /// Widget access request policy.
    Warp,
}

/// One allowed destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistEntry {
    /// Destination; its scheme and path prefix must match.
    pub url: Url,
    /// Destination host.
    pub host: String,
    /// Whether subdomains of `host` also match.
    pub subdomains: bool,
}

impl WhitelistEntry {
    fn new(url: Url, subdomains: bool) -> Option<Self> {
        let host = url.host_str()?.to_ascii_lowercase();
        Some(Self {
            url,
            host,
            subdomains,
        })
    }

    fn matches(&self, target: &Url) -> bool {
        if target.scheme() != self.url.scheme() {
            return false;
        }
        let Some(host) = target.host_str().map(str::to_ascii_lowercase) else {
            return false;
        };
        let host_matches = if self.subdomains {
            domain_is(&host, &self.host)
        } else {
            host == self.host
        };
        host_matches
            && target
                .path()
                .to_ascii_lowercase()
                .starts_with(&self.url.path().to_ascii_lowercase())
    }
}

/// `host` equals `domain` or is one of its subdomains.
fn domain_is(host: &str, domain: &str) -> bool {
    host.strip_suffix(domain)
        .is_some_and(|rest| rest.is_empty() || rest.ends_with('.'))
}

/// The access policy of one application.
#[derive(Debug, Clone)]
pub struct SecurityPolicy {
    app_id: AppId,
    mode: SecurityMode,
    enabled: bool,
    entries: Vec<WhitelistEntry>,
    warnings: Vec<String>,
}

impl SecurityPolicy {
    /// Derive the policy for an application.
    #[must_use]
    pub fn for_application(app: &ApplicationRecord) -> Self {
        let mode = if app.has_csp_defined() {
            SecurityMode::Csp
        } else if app.manifest_type().is_widget() {
            SecurityMode::Warp
        } else {
            SecurityMode::NoSecurity
        };

        let mut policy = Self {
            app_id: app.id().clone(),
            mode,
            enabled: false,
            entries: Vec::new(),
            warnings: Vec::new(),
        };
        match mode {
            SecurityMode::NoSecurity => {},
            SecurityMode::Warp => policy.enforce_warp(app),
            SecurityMode::Csp if app.manifest_type().is_widget() => policy.enforce_widget_csp(app),
            SecurityMode::Csp => policy.enforce_csp(app),
        }
        debug!(
            app_id = %policy.app_id,
            mode = ?policy.mode,
            enabled = policy.enabled,
            entries = policy.entries.len(),
            "Security policy derived"
        );
        policy
    }

    /// Whether `url` may be reached. Pure; evaluated on every navigation.
    ///
    /// The own origin is always `app://<id>`. For hosted apps that is not the
    /// `start_url` origin, so under a CSP the start URL's host is reachable
    /// only if the policy lists it.
    #[must_use]
    pub fn is_access_allowed(&self, url: &Url) -> bool {
        if !self.enabled {
            return true;
        }
        if url.scheme() == APP_SCHEME && url.host_str() == Some(self.app_id.as_str()) {
            return true;
        }
        self.entries.iter().any(|entry| entry.matches(url))
    }

    /// Selected mode.
    #[must_use]
    pub fn mode(&self) -> SecurityMode {
        self.mode
    }

    /// Whether the policy restricts anything.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Allowed destinations, without duplicates.
    #[must_use]
    pub fn entries(&self) -> &[WhitelistEntry] {
        &self.entries
    }

    /// Entries that were skipped and why.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn add_entry(&mut self, url: Url, subdomains: bool) {
        match WhitelistEntry::new(url.clone(), subdomains) {
            Some(entry) if self.entries.contains(&entry) => {},
            Some(entry) => self.entries.push(entry),
            None => self.skip(format!("'{url}' has no host")),
        }
    }

    fn skip(&mut self, reason: String) {
        warn!(app_id = %self.app_id, %reason, "Skipping security policy entry");
        self.warnings.push(reason);
    }

    fn enforce_warp(&mut self, app: &ApplicationRecord) {
        let Some(info) = app.manifest_data::<WarpInfo>(keys::data::WARP) else {
            self.enabled = true;
            return;
        };

        for entry in &info.entries {
            if entry.origin.is_empty() {
                continue;
            }
            if entry.origin == "*" {
                self.mode = SecurityMode::NoSecurity;
                self.enabled = false;
                self.entries.clear();
                return;
            }
            // Any non-wildcard entry turns enforcement on, even one that is skipped.
            self.enabled = true;
            match Url::parse(&entry.origin) {
                Ok(url) => self.add_entry(url, entry.subdomains),
                Err(e) => self.skip(format!("invalid access origin '{}': {e}", entry.origin)),
            }
        }
    }

    fn enforce_widget_csp(&mut self, app: &ApplicationRecord) {
        self.enabled = true;
        let Some(info) = app.manifest_data::<NavigationInfo>(keys::data::NAVIGATION) else {
            return;
        };

        for pattern in &info.hosts {
            if pattern == "*" {
                self.enabled = false;
                self.entries.clear();
                return;
            }
            let (host, subdomains) = match pattern.strip_prefix("*.") {
                Some(rest) => (rest, true),
                None => (pattern.as_str(), false),
            };
            for scheme in ["http", "https"] {
                match Url::parse(&format!("{scheme}://{host}")) {
                    Ok(url) => self.add_entry(url, subdomains),
                    Err(e) => self.skip(format!("invalid navigation host '{pattern}': {e}")),
                }
            }
        }
    }

    fn enforce_csp(&mut self, app: &ApplicationRecord) {
        self.enabled = true;

        if let Some(csp) = app.content_security_policy() {
            for token in csp.directives.values().flatten() {
                if let Some((url, subdomains)) = csp_source_url(token) {
                    self.add_entry(url, subdomains);
                }
            }
        }

        if let Some(scope) = app.manifest().get_string(keys::SCOPE) {
            let mut scoped = app.url().clone();
            scoped.set_path(scope);
            self.add_entry(scoped, false);
        }
        self.add_entry(app.url().clone(), false);
    }
}

/// Interpret a CSP source expression as a URL, if it is one.
///
/// `https://*.example.com` allows subdomains. Keywords (`'self'`), bare
/// schemes (`data:`) and `*` are not URLs and yield `None`.
fn csp_source_url(token: &str) -> Option<(Url, bool)> {
    if token.starts_with('\'') || !token.contains("://") {
        return None;
    }
    let (text, subdomains) = match token.split_once("://*.") {
        Some((scheme, rest)) => (format!("{scheme}://{rest}"), true),
        None => (token.to_string(), false),
    };
    let url = Url::parse(&text).ok()?;
    url.host_str()?;
    Some((url, subdomains))
}
