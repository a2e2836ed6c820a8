//! Routable action identifiers for legacy clients.

use serde_json::{Map, Value};

/// Supplies the table of currently routable action identifiers.
///
/// The value is opaque here and passed through to the payload verbatim.
pub trait ActionRoutes: Send + Sync {
    fn action_ids(&self) -> Value;
}

/// [`ActionRoutes`] returning a fixed value.
#[derive(Debug, Clone)]
pub struct StaticActionRoutes(Value);

impl StaticActionRoutes {
    #[must_use]
    pub fn new(routes: Value) -> Self {
        Self(routes)
    }
}

impl Default for StaticActionRoutes {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl ActionRoutes for StaticActionRoutes {
    fn action_ids(&self) -> Value {
        self.0.clone()
    }
}
