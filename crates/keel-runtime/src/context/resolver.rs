//! Working-context and default-context resolution.
//!
//! | Request | Outcome |
//! |---------|---------|
//! | no key (or empty key) | caller's current context, not re-prepared |
//! | key → known, prepares | that context |
//! | key → unknown | `PermissionDenied` |
//! | key → known, prepare fails | `PermissionDenied` |
//!
//! A bad explicit key is refused rather than silently replaced by the
//! current context. The default context, used only for the entry URL,
//! degrades to `None` instead.

use super::{ContextStore, ExecutionContext};
use crate::lexicon::{Lexicon, PERMISSION_DENIED};
use keel_auth::AccessDenied;
use keel_types::ContextKey;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves the working context of a request.
pub struct ContextResolver<'a> {
    store: &'a dyn ContextStore,
    lexicon: &'a dyn Lexicon,
}

impl<'a> ContextResolver<'a> {
    /// Creates a resolver over `store`, localizing refusals through `lexicon`.
    pub fn new(store: &'a dyn ContextStore, lexicon: &'a dyn Lexicon) -> Self {
        Self { store, lexicon }
    }

    /// Resolves the working context.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied::PermissionDenied`] with the localized
    /// `permission_denied` text when an explicit key is unknown or its
    /// context fails to prepare.
    pub fn resolve(
        &self,
        requested: Option<&ContextKey>,
        current: &Arc<ExecutionContext>,
    ) -> Result<Arc<ExecutionContext>, AccessDenied> {
        let Some(key) = requested.filter(|k| !k.as_str().is_empty()) else {
            return Ok(Arc::clone(current));
        };

        let Some(context) = self.store.get_context(key) else {
            warn!(context = %key, "Requested context does not exist");
            return Err(self.denied());
        };

        if let Err(e) = context.prepare() {
            warn!(context = %key, error = %e, "Requested context failed to prepare");
            return Err(self.denied());
        }

        debug!(context = %key, "Working context resolved");
        Ok(context)
    }

    /// Resolves and prepares the default context.
    ///
    /// Returns `None` when it is missing or fails to prepare.
    #[must_use]
    pub fn resolve_default(&self, key: &ContextKey) -> Option<Arc<ExecutionContext>> {
        let context = self.store.get_context(key)?;
        match context.prepare() {
            Ok(()) => Some(context),
            Err(e) => {
                debug!(context = %key, error = %e, "Default context unavailable");
                None
            }
        }
    }

    fn denied(&self) -> AccessDenied {
        AccessDenied::permission_denied(self.lexicon.text(PERMISSION_DENIED))
    }
}
