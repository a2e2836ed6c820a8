//! Context lookup.

use super::ExecutionContext;
use keel_types::ContextKey;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Looks up execution contexts by key.
pub trait ContextStore: Send + Sync {
    /// Returns the context named `key`, if it exists.
    fn get_context(&self, key: &ContextKey) -> Option<Arc<ExecutionContext>>;
}

/// Thread-safe, in-memory context table.
///
/// ```
/// use keel_runtime::context::{ContextStore, ExecutionContext, InMemoryContextStore};
/// use keel_types::ContextKey;
///
/// let store = InMemoryContextStore::new();
/// store.insert(ExecutionContext::new("web"));
///
/// assert!(store.get_context(&ContextKey::new("web")).is_some());
/// assert!(store.get_context(&ContextKey::new("nope")).is_none());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryContextStore {
    contexts: RwLock<HashMap<ContextKey, Arc<ExecutionContext>>>,
}

impl InMemoryContextStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a context and returns the shared handle.
    pub fn insert(&self, context: ExecutionContext) -> Arc<ExecutionContext> {
        let context = Arc::new(context);
        self.contexts
            .write()
            .insert(context.key().clone(), Arc::clone(&context));
        context
    }

    /// Removes a context. Returns `true` if it existed.
    pub fn remove(&self, key: &ContextKey) -> bool {
        self.contexts.write().remove(key).is_some()
    }

    /// Number of stored contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.read().len()
    }

    /// Returns `true` if no context is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.read().is_empty()
    }
}

impl ContextStore for InMemoryContextStore {
    fn get_context(&self, key: &ContextKey) -> Option<Arc<ExecutionContext>> {
        self.contexts.read().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_same_key() {
        let store = InMemoryContextStore::new();
        store.insert(ExecutionContext::new("web").with_option("v", 1));
        store.insert(ExecutionContext::new("web").with_option("v", 2));

        assert_eq!(store.len(), 1);
        let ctx = store.get_context(&"web".into()).unwrap();
        assert_eq!(ctx.options().get("v"), Some(&serde_json::json!(2)));
    }

    #[test]
    fn remove_context() {
        let store = InMemoryContextStore::new();
        store.insert(ExecutionContext::new("web"));
        assert!(store.remove(&"web".into()));
        assert!(!store.remove(&"web".into()));
        assert!(store.is_empty());
    }
}
