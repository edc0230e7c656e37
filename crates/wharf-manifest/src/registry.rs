//! Dependency-ordered handler registry.
//!
//! Handlers register under every key they own (last registration of a key
//! wins). On build, handlers are ordered so that each one follows the owners
//! of its prerequisite keys. The order is computed once by repeated passes
//! over the unordered set; a pass that orders nothing means the remainder is
//! a cycle and the registry is not built.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};
use wharf_core::ManifestType;

use crate::error::{ManifestError, ManifestResult};
use crate::handler::{HandlerContext, ManifestDataMap, ManifestHandler};
use crate::handlers::{
    AppControlHandler, CspHandler, MainDocumentHandler, NavigationHandler, PermissionsHandler,
    WarpHandler, WidgetHandler,
};

/// Collects handlers before ordering them.
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: Vec<Box<dyn ManifestHandler>>,
    by_key: HashMap<&'static str, usize>,
}

impl RegistryBuilder {
    /// Register a handler under all of its keys.
    #[must_use]
    pub fn register(mut self, handler: impl ManifestHandler + 'static) -> Self {
        let index = self.handlers.len();
        for key in handler.keys() {
            self.by_key.insert(*key, index);
        }
        self.handlers.push(Box::new(handler));
        self
    }

    /// Order the registered handlers.
    ///
    /// Handlers whose keys were all taken over by later registrations are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::UnknownPrerequisite`] if a prerequisite key is
    /// not registered, or [`ManifestError::PrerequisiteCycle`] if the
    /// prerequisites cannot be ordered.
    pub fn build(self) -> ManifestResult<ManifestHandlerRegistry> {
        let live: BTreeSet<usize> = self.by_key.values().copied().collect();

        for &index in &live {
            let handler = &self.handlers[index];
            for key in handler.prerequisite_keys() {
                if !self.by_key.contains_key(key) {
                    return Err(ManifestError::UnknownPrerequisite {
                        handler: handler.name().to_string(),
                        key: (*key).to_string(),
                    });
                }
            }
        }

        let mut ordered: Vec<usize> = Vec::with_capacity(live.len());
        let mut pending: Vec<usize> = live.into_iter().collect();
        while !pending.is_empty() {
            let mut remaining = Vec::new();
            let mut progressed = false;
            for index in pending {
                let ready = self.handlers[index]
                    .prerequisite_keys()
                    .iter()
                    .all(|key| self.by_key.get(key).is_some_and(|p| ordered.contains(p)));
                if ready {
                    ordered.push(index);
                    progressed = true;
                } else {
                    remaining.push(index);
                }
            }
            if !progressed {
                return Err(ManifestError::PrerequisiteCycle {
                    handlers: remaining
                        .iter()
                        .map(|&i| self.handlers[i].name().to_string())
                        .collect(),
                });
            }
            pending = remaining;
        }

        let mut slots: Vec<Option<Box<dyn ManifestHandler>>> =
            self.handlers.into_iter().map(Some).collect();
        let mut position = HashMap::new();
        let mut handlers = Vec::with_capacity(ordered.len());
        for old in ordered {
            if let Some(handler) = slots.get_mut(old).and_then(Option::take) {
                position.insert(old, handlers.len());
                handlers.push(handler);
            }
        }
        let by_key = self
            .by_key
            .into_iter()
            .filter_map(|(key, old)| position.get(&old).map(|&new| (key, new)))
            .collect();

        Ok(ManifestHandlerRegistry { handlers, by_key })
    }
}

/// An ordered set of manifest handlers.
pub struct ManifestHandlerRegistry {
    /// Handlers in prerequisite order.
    handlers: Vec<Box<dyn ManifestHandler>>,
    /// Key -> index into `handlers`.
    by_key: HashMap<&'static str, usize>,
}

impl ManifestHandlerRegistry {
    /// Start collecting handlers.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Handlers for JSON manifests (hosted and packaged apps).
    ///
    /// # Errors
    ///
    /// Propagates ordering errors, which would indicate a broken built-in set.
    pub fn json() -> ManifestResult<Self> {
        Self::builder()
            .register(CspHandler::json())
            .register(MainDocumentHandler)
            .register(PermissionsHandler)
            .build()
    }

    /// Handlers for widget descriptors.
    ///
    /// # Errors
    ///
    /// Propagates ordering errors, which would indicate a broken built-in set.
    pub fn widget() -> ManifestResult<Self> {
        Self::builder()
            .register(WidgetHandler)
            .register(WarpHandler)
            .register(CspHandler::widget())
            .register(NavigationHandler)
            .register(AppControlHandler)
            .build()
    }

    /// Position of the handler owning `key` in the computed order.
    #[must_use]
    pub fn order_index(&self, key: &str) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    /// Handler names in execution order.
    #[must_use]
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// Run `parse` on every selected handler in order, stopping at the first failure.
    ///
    /// A handler is selected when the manifest contains one of the keys it
    /// still owns, or when it always parses for the manifest's type.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::HandlerFailed`] carrying the handler's message.
    pub fn parse_application(
        &self,
        ctx: &HandlerContext<'_>,
        data: &mut ManifestDataMap,
    ) -> ManifestResult<()> {
        for (index, handler) in self.handlers.iter().enumerate() {
            if !(self.owns_present_key(index, ctx)
                || handler.always_parse_for_type(ctx.manifest_type()))
            {
                continue;
            }
            debug!(handler = handler.name(), "Parsing manifest section");
            handler
                .parse(ctx, data)
                .map_err(|message| ManifestError::HandlerFailed {
                    handler: handler.name().to_string(),
                    message,
                })?;
        }
        Ok(())
    }

    /// Run `validate` on every selected handler in order.
    ///
    /// Failures of soft handlers are returned as warnings.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::ValidationFailed`] for the first failure of a
    /// hard-validating handler.
    pub fn validate_application(
        &self,
        ctx: &HandlerContext<'_>,
        data: &ManifestDataMap,
    ) -> ManifestResult<Vec<String>> {
        let mut warnings = Vec::new();
        for (index, handler) in self.handlers.iter().enumerate() {
            if !(self.owns_present_key(index, ctx)
                || handler.always_validate_for_type(ctx.manifest_type()))
            {
                continue;
            }
            if let Err(message) = handler.validate(ctx, data) {
                if handler.hard_validation() {
                    return Err(ManifestError::ValidationFailed {
                        handler: handler.name().to_string(),
                        message,
                    });
                }
                warn!(handler = handler.name(), %message, "Manifest validation warning");
                warnings.push(format!("{}: {message}", handler.name()));
            }
        }
        Ok(warnings)
    }

    fn owns_present_key(&self, index: usize, ctx: &HandlerContext<'_>) -> bool {
        self.handlers[index]
            .keys()
            .iter()
            .any(|key| self.by_key.get(key) == Some(&index) && ctx.manifest.has_path(key))
    }
}

impl std::fmt::Debug for ManifestHandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestHandlerRegistry")
            .field("handlers", &self.handler_names())
            .finish()
    }
}

/// The two registries an application can be parsed with.
#[derive(Debug)]
pub struct HandlerRegistries {
    json: ManifestHandlerRegistry,
    widget: ManifestHandlerRegistry,
}

impl HandlerRegistries {
    /// Pair custom registries.
    #[must_use]
    pub fn new(json: ManifestHandlerRegistry, widget: ManifestHandlerRegistry) -> Self {
        Self { json, widget }
    }

    /// The built-in handler sets.
    ///
    /// # Errors
    ///
    /// Propagates ordering errors from either registry.
    pub fn standard() -> ManifestResult<Self> {
        Ok(Self::new(
            ManifestHandlerRegistry::json()?,
            ManifestHandlerRegistry::widget()?,
        ))
    }

    /// The registry responsible for a manifest type.
    #[must_use]
    pub fn for_type(&self, manifest_type: ManifestType) -> &ManifestHandlerRegistry {
        if manifest_type.is_widget() {
            &self.widget
        } else {
            &self.json
        }
    }
}
