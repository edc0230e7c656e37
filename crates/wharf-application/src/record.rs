//! The application record and its factory.
//!
//! Construction runs a fixed sequence: assign the id, check the manifest as
//! a whole, read the core fields, run the handler parse pass, run the
//! validate pass. Any failure discards the partial record.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use url::Url;
use wharf_core::{AppId, ManifestType, PermissionStatus, Version};
use wharf_manifest::{
    CspInfo, HandlerContext, HandlerRegistries, ManifestData, ManifestDataMap, ManifestDocument,
    PermissionsInfo, keys,
};

use crate::error::{ApplicationError, ApplicationResult, ConstructionStage};

/// URL scheme under which application resources are served.
pub const APP_SCHEME: &str = "app";

/// An installed or in-progress application.
///
/// Everything except the permission map and the display locale is fixed once
/// [`create`](Self::create) returns.
#[derive(Debug)]
pub struct ApplicationRecord {
    id: AppId,
    path: PathBuf,
    url: Url,
    version: Option<Version>,
    manifest: ManifestDocument,
    data: ManifestDataMap,
    permissions: BTreeMap<String, PermissionStatus>,
    warnings: Vec<String>,
}

impl ApplicationRecord {
    /// Build a record for the application in `path`.
    ///
    /// Without an explicit id, the id is derived from `path`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApplicationError`] whose [`stage`](ApplicationError::stage)
    /// names the step that failed.
    pub fn create(
        path: &Path,
        explicit_id: Option<AppId>,
        manifest: ManifestDocument,
        registries: &HandlerRegistries,
    ) -> ApplicationResult<Self> {
        let id = explicit_id.unwrap_or_else(|| AppId::from_path(path));
        let url = application_url(&id)?;
        debug!(app_id = %id, path = %path.display(), "Building application record");

        validate_manifest(&manifest)?;

        let mut warnings = Vec::new();
        read_name(&manifest)?;
        let version = read_version(&manifest, &mut warnings)?;

        let registry = registries.for_type(manifest.manifest_type());
        let ctx = HandlerContext {
            manifest: &manifest,
            app_path: path,
        };
        let mut data = ManifestDataMap::new();
        registry
            .parse_application(&ctx, &mut data)
            .map_err(|source| ApplicationError::Manifest {
                stage: ConstructionStage::HandlerParse,
                source,
            })?;
        warnings.extend(registry.validate_application(&ctx, &data).map_err(|source| {
            ApplicationError::Manifest {
                stage: ConstructionStage::HandlerValidation,
                source,
            }
        })?);

        Ok(Self {
            id,
            path: path.to_path_buf(),
            url,
            version,
            manifest,
            data,
            permissions: BTreeMap::new(),
            warnings,
        })
    }

    /// Application id.
    #[must_use]
    pub fn id(&self) -> &AppId {
        &self.id
    }

    /// Directory the application lives in.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `app://<id>/`.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// URL of a resource inside the application. A leading `/` is ignored.
    #[must_use]
    pub fn resource_url(&self, relative: &str) -> Option<Url> {
        self.url.join(relative.trim_start_matches('/')).ok()
    }

    /// Parsed version; `None` for hosted apps and widgets without a usable one.
    #[must_use]
    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    /// Display name in the current locale.
    #[must_use]
    pub fn name(&self) -> &str {
        let path = if self.manifest_type().is_widget() {
            keys::WIDGET_NAME
        } else {
            keys::NAME
        };
        self.manifest.get_string(path).unwrap_or_default()
    }

    /// Description in the current locale.
    #[must_use]
    pub fn description(&self) -> &str {
        let description = if self.manifest_type().is_widget() {
            self.manifest.get_string(keys::WIDGET_DESCRIPTION)
        } else {
            self.manifest
                .get_string_or_deprecated(keys::DESCRIPTION, keys::DEPRECATED_DESCRIPTION)
        };
        description.unwrap_or_default()
    }

    /// Hosted, packaged or widget.
    #[must_use]
    pub fn manifest_type(&self) -> ManifestType {
        self.manifest.manifest_type()
    }

    /// The manifest the record was built from.
    #[must_use]
    pub fn manifest(&self) -> &ManifestDocument {
        &self.manifest
    }

    /// A parsed record produced by a handler.
    #[must_use]
    pub fn manifest_data<T: ManifestData>(&self, key: &str) -> Option<&T> {
        self.data.get(key)
    }

    /// Soft validation failures collected during construction.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Switch the display locale (affects [`name`](Self::name) and
    /// [`description`](Self::description)).
    pub fn set_locale(&mut self, locale: &str) {
        self.manifest.set_locale(locale);
    }

    /// Whether the manifest declares a content security policy.
    #[must_use]
    pub fn has_csp_defined(&self) -> bool {
        has_csp(&self.manifest)
    }

    /// The policy in force: the declared one, or the built-in default when
    /// none (or an empty one) is declared. Hosted apps have no default.
    #[must_use]
    pub fn content_security_policy(&self) -> Option<CspInfo> {
        match self.manifest_data::<CspInfo>(keys::data::CSP) {
            Some(info) if !info.directives.is_empty() => Some(info.clone()),
            _ if self.manifest_type() == ManifestType::Hosted => None,
            _ => Some(CspInfo::default_policy()),
        }
    }

    /// API names the manifest asks for.
    #[must_use]
    pub fn requested_permissions(&self) -> BTreeSet<String> {
        self.manifest_data::<PermissionsInfo>(keys::data::PERMISSIONS)
            .map(|p| p.api_permissions.clone())
            .unwrap_or_default()
    }

    /// Stored decision for one API.
    #[must_use]
    pub fn permission(&self, name: &str) -> Option<PermissionStatus> {
        self.permissions.get(name).copied()
    }

    /// Record a decision for one API. Empty names are ignored.
    pub fn set_permission(&mut self, name: impl Into<String>, status: PermissionStatus) -> bool {
        let name = name.into();
        if name.is_empty() {
            return false;
        }
        self.permissions.insert(name, status);
        true
    }

    /// Forget the decision for one API.
    pub fn clear_permission(&mut self, name: &str) -> bool {
        self.permissions.remove(name).is_some()
    }

    /// Forget all decisions.
    pub fn clear_permissions(&mut self) {
        self.permissions.clear();
    }

    /// All stored decisions.
    #[must_use]
    pub fn permissions(&self) -> &BTreeMap<String, PermissionStatus> {
        &self.permissions
    }

    /// Replace all decisions, e.g. with those loaded from storage.
    pub fn set_permissions(&mut self, permissions: BTreeMap<String, PermissionStatus>) {
        self.permissions = permissions;
    }
}

/// `app://<id>/` for an id.
///
/// # Errors
///
/// Returns [`ApplicationError::InvalidId`] if the id cannot form a URL host.
pub fn application_url(id: &AppId) -> ApplicationResult<Url> {
    Url::parse(&format!("{APP_SCHEME}://{id}/")).map_err(|e| ApplicationError::InvalidId {
        id: id.to_string(),
        reason: e.to_string(),
    })
}

fn has_csp(manifest: &ManifestDocument) -> bool {
    if manifest.manifest_type().is_widget() {
        manifest.has_path(keys::WIDGET_CSP) || manifest.has_path(keys::WIDGET_CSP_REPORT_ONLY)
    } else {
        manifest.has_path(keys::CSP) || manifest.has_path(keys::DEPRECATED_CSP)
    }
}

fn validate_manifest(manifest: &ManifestDocument) -> ApplicationResult<()> {
    if has_csp(manifest) && manifest.has_path(keys::WIDGET_ACCESS) {
        return Err(ApplicationError::ConflictingSecurityPolicies);
    }
    Ok(())
}

fn read_name(manifest: &ManifestDocument) -> ApplicationResult<()> {
    if manifest.manifest_type().is_widget() || manifest.get_string(keys::NAME).is_some() {
        Ok(())
    } else {
        Err(ApplicationError::MissingField {
            field: keys::NAME.to_string(),
        })
    }
}

fn read_version(
    manifest: &ManifestDocument,
    warnings: &mut Vec<String>,
) -> ApplicationResult<Option<Version>> {
    let manifest_type = manifest.manifest_type();
    let raw = if manifest_type.is_widget() {
        manifest.get_string(keys::WIDGET_VERSION)
    } else {
        manifest.get_string_or_deprecated(keys::VERSION, keys::DEPRECATED_VERSION)
    };
    let strict = manifest_type == ManifestType::Packaged;

    let Some(raw) = raw else {
        if strict {
            return Err(ApplicationError::MissingField {
                field: keys::VERSION.to_string(),
            });
        }
        return Ok(None);
    };

    match raw.parse::<Version>() {
        Ok(version) => Ok(Some(version)),
        Err(e) if strict => Err(ApplicationError::InvalidVersion {
            value: raw.to_string(),
            message: e.to_string(),
        }),
        Err(e) => {
            warn!(version = raw, error = %e, "Ignoring malformed version");
            warnings.push(format!("ignored malformed version '{raw}': {e}"));
            Ok(None)
        },
    }
}
