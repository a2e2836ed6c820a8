//! Flat option layers and their precedence merge.
//!
//! # Layer Order
//!
//! ```text
//! lowest                                                  highest
//! ┌──────────┐   ┌───────────┐   ┌────────────┐   ┌────────────┐
//! │  system  │ → │  context  │ → │ principal  │ → │  computed  │
//! └──────────┘   └───────────┘   └────────────┘   └────────────┘
//! ```
//!
//! Later layers overwrite earlier ones key for key. A key missing from a
//! layer falls through to the one below. Merging is a pure function of
//! the [`LayerStack`]; key order in the result is the order in which each
//! key was first seen, so identical inputs always produce identical output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An ordered, flat mapping from option name to value.
///
/// ```
/// use keel_runtime::options::ConfigLayer;
/// use serde_json::json;
///
/// let mut layer = ConfigLayer::new();
/// layer.insert("site_name", json!("Keel"));
/// assert_eq!(layer.get_str("site_name"), Some("Keel"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigLayer(Map<String, Value>);

impl ConfigLayer {
    /// Creates an empty layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Returns the value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the value of `key` if it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Returns `true` if `key` is set.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the layer has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over option names in layer order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Iterates over entries in layer order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Writes every entry of `upper` over this layer.
    pub fn overlay(&mut self, upper: &ConfigLayer) {
        for (key, value) in upper.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Borrows the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ConfigLayer {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ConfigLayer {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Source of the system-wide option layer.
///
/// Read once per request so that settings edited between requests are
/// picked up without a restart.
pub trait SystemOptions: Send + Sync {
    /// Returns the current system layer.
    fn system_layer(&self) -> ConfigLayer;
}

impl SystemOptions for ConfigLayer {
    fn system_layer(&self) -> ConfigLayer {
        self.clone()
    }
}

impl SystemOptions for parking_lot::RwLock<ConfigLayer> {
    fn system_layer(&self) -> ConfigLayer {
        self.read().clone()
    }
}

/// The four layers of one bootstrap request, lowest precedence first.
#[derive(Debug, Clone, Copy)]
pub struct LayerStack<'a> {
    /// System-wide options.
    pub system: &'a ConfigLayer,
    /// Options of the resolved execution context.
    pub context: &'a ConfigLayer,
    /// Per-principal overrides.
    pub principal: &'a ConfigLayer,
    /// Values computed for this request.
    pub computed: &'a ConfigLayer,
}

impl LayerStack<'_> {
    /// Merges the stack, last write wins per key.
    #[must_use]
    pub fn merge(&self) -> ConfigLayer {
        let mut merged = self.system.clone();
        merged.overlay(self.context);
        merged.overlay(self.principal);
        merged.overlay(self.computed);
        merged
    }
}
