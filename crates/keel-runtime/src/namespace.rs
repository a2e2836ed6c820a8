//! Namespace metadata lookup for the computed config layer.
//!
//! A request may name an action. Numeric action ids go through the
//! deprecated legacy action table; anything else selects a namespace
//! by name. A miss on either path leaves the computed layer untouched.

use crate::options::ConfigLayer;
use parking_lot::RwLock;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// A named extension namespace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamespaceRecord {
    pub name: String,
    /// Filesystem path of the namespace.
    pub path: String,
    /// Public URL of the namespace's static assets.
    #[serde(default)]
    pub assets_url: String,
}

impl NamespaceRecord {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        assets_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            assets_url: assets_url.into(),
        }
    }
}

/// An entry of the deprecated numeric action table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LegacyAction {
    pub id: u32,
    pub namespace: String,
    #[serde(default)]
    pub namespace_path: String,
    #[serde(default)]
    pub namespace_assets_path: String,
    #[serde(default)]
    pub help_url: String,
}

/// Lookup of namespace records and legacy actions.
pub trait NamespaceStore: Send + Sync {
    /// Returns the namespace with the given name.
    fn namespace(&self, name: &str) -> Option<NamespaceRecord>;

    /// Returns the legacy action with the given id.
    fn legacy_action(&self, id: u32) -> Option<LegacyAction>;
}

/// [`NamespaceStore`] backed by two in-memory maps.
#[derive(Debug, Default)]
pub struct InMemoryNamespaceStore {
    namespaces: RwLock<HashMap<String, NamespaceRecord>>,
    legacy: RwLock<HashMap<u32, LegacyAction>>,
}

impl InMemoryNamespaceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a namespace.
    pub fn insert_namespace(&self, record: NamespaceRecord) {
        self.namespaces.write().insert(record.name.clone(), record);
    }

    /// Adds or replaces a legacy action.
    pub fn insert_legacy_action(&self, action: LegacyAction) {
        self.legacy.write().insert(action.id, action);
    }
}

impl NamespaceStore for InMemoryNamespaceStore {
    fn namespace(&self, name: &str) -> Option<NamespaceRecord> {
        self.namespaces.read().get(name).cloned()
    }

    fn legacy_action(&self, id: u32) -> Option<LegacyAction> {
        self.legacy.read().get(&id).cloned()
    }
}

/// Outcome of namespace resolution for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceResolution {
    /// The action id matched the legacy table.
    LegacyAction(LegacyAction),
    /// A namespace matched by name.
    CurrentNamespace(NamespaceRecord),
    /// Nothing matched; no fields are contributed.
    NotFound,
}

impl NamespaceResolution {
    /// Resolves request inputs against `store`.
    ///
    /// - no action (or an empty one) → [`NotFound`](Self::NotFound)
    /// - a positive integer action → legacy table only, no fallback
    /// - any other action → the namespace named `hint`, or `default_namespace`
    pub fn resolve(
        store: &dyn NamespaceStore,
        action: Option<&str>,
        hint: Option<&str>,
        default_namespace: &str,
    ) -> Self {
        let Some(action) = action.map(str::trim).filter(|a| !a.is_empty()) else {
            return Self::NotFound;
        };

        if let Some(id) = action.parse::<u32>().ok().filter(|id| *id > 0) {
            return match store.legacy_action(id) {
                Some(legacy) => Self::LegacyAction(legacy),
                None => {
                    debug!(action = id, "Legacy action not found");
                    Self::NotFound
                }
            };
        }

        let name = hint
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .unwrap_or(default_namespace);
        match store.namespace(name) {
            Some(record) => Self::CurrentNamespace(record),
            None => {
                debug!(namespace = name, "Namespace not found");
                Self::NotFound
            }
        }
    }

    /// Returns `true` unless this is [`NotFound`](Self::NotFound).
    #[must_use]
    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }

    /// Copies the resolved metadata into `layer`.
    pub fn write_into(&self, layer: &mut ConfigLayer) {
        match self {
            Self::LegacyAction(action) => {
                layer.insert("namespace", action.namespace.as_str());
                layer.insert("namespace_path", action.namespace_path.as_str());
                layer.insert(
                    "namespace_assets_path",
                    action.namespace_assets_path.as_str(),
                );
                layer.insert("help_url", action.help_url.trim_start_matches('/'));
            }
            Self::CurrentNamespace(record) => {
                layer.insert("namespace", record.name.as_str());
                layer.insert("namespace_path", record.path.as_str());
                layer.insert("namespace_assets_path", record.assets_url.as_str());
            }
            Self::NotFound => {}
        }
    }
}
