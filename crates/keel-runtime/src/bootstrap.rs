//! The per-request bootstrap pipeline.
//!
//! ```text
//! authenticate ─┬─ no  → Empty
//!               └─ yes → resolve context ─ bad key → PermissionDenied
//!                          │
//!                          ├─ capabilities (registry)
//!                          ├─ namespace resolution
//!                          ▼
//!                        merge → filter → project permissions → render
//!                                                                  │
//!                                               release session lock
//! ```
//!
//! [`ConfigBootstrap`] is built once per process and shared; each call to
//! [`ConfigBootstrap::run`] handles one [`BootstrapRequest`].

use crate::config::KeelConfig;
use crate::context::{ContextResolver, ContextStore, ExecutionContext};
use crate::filter::{FilterError, SecurityFilter};
use crate::lexicon::Lexicon;
use crate::merge::{ConfigMerger, MergeInputs};
use crate::namespace::{NamespaceResolution, NamespaceStore};
use crate::options::{ConfigLayer, SystemOptions};
use crate::payload::{PayloadError, ScriptPayload};
use crate::permission::PermissionProjector;
use crate::registry::ResourceTypeRegistry;
use crate::routes::ActionRoutes;
use keel_auth::{
    AccessDenied, PermissionCatalog, PermissionPolicy, Session, SessionLock, SessionLockGuard,
};
use keel_types::{ContextKey, ErrorCode, RequestId};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

/// Failures of one bootstrap request.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The requested context is unknown or unavailable.
    #[error("{message}")]
    PermissionDenied { message: String },

    /// The security filter could not run; nothing was emitted.
    #[error("security filter failed: {0}")]
    Filter(#[from] FilterError),

    /// The payload could not be rendered.
    #[error("payload rendering failed: {0}")]
    Render(#[from] PayloadError),
}

impl BootstrapError {
    /// Creates a [`PermissionDenied`](Self::PermissionDenied) error.
    #[must_use]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }
}

impl From<AccessDenied> for BootstrapError {
    fn from(err: AccessDenied) -> Self {
        match err {
            AccessDenied::PermissionDenied(message) => Self::PermissionDenied { message },
            other => Self::PermissionDenied {
                message: other.to_string(),
            },
        }
    }
}

impl ErrorCode for BootstrapError {
    fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } => "BOOTSTRAP_PERMISSION_DENIED",
            Self::Filter(_) => "BOOTSTRAP_FILTER_FAILED",
            Self::Render(_) => "BOOTSTRAP_RENDER_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

/// Outcome of a successful request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapResponse {
    /// The caller is not authenticated; nothing is emitted.
    Empty,
    /// The rendered script payload.
    Script(ScriptPayload),
}

impl BootstrapResponse {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub fn payload(&self) -> Option<&ScriptPayload> {
        match self {
            Self::Empty => None,
            Self::Script(payload) => Some(payload),
        }
    }

    /// Response body; empty for [`Empty`](Self::Empty).
    #[must_use]
    pub fn body(&self) -> &str {
        self.payload().map_or("", ScriptPayload::body)
    }
}

/// Services the pipeline reads from.
#[derive(Clone)]
pub struct Collaborators {
    pub contexts: Arc<dyn ContextStore>,
    pub registry: Arc<ResourceTypeRegistry>,
    pub namespaces: Arc<dyn NamespaceStore>,
    pub catalog: Arc<dyn PermissionCatalog>,
    pub policy: Arc<dyn PermissionPolicy>,
    pub routes: Arc<dyn ActionRoutes>,
    pub lexicon: Arc<dyn Lexicon>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Inputs of one bootstrap request.
#[must_use]
pub struct BootstrapRequest {
    id: RequestId,
    session: Session,
    current_context: Arc<ExecutionContext>,
    user_settings: ConfigLayer,
    context_key: Option<ContextKey>,
    action: Option<String>,
    namespace: Option<String>,
    session_lock: Option<Box<dyn SessionLock>>,
}

impl BootstrapRequest {
    /// A request from `session`, issued inside `current_context`.
    pub fn new(session: Session, current_context: Arc<ExecutionContext>) -> Self {
        Self {
            id: RequestId::new(),
            session,
            current_context,
            user_settings: ConfigLayer::new(),
            context_key: None,
            action: None,
            namespace: None,
            session_lock: None,
        }
    }

    /// Per-principal setting overrides.
    pub fn with_user_settings(mut self, settings: ConfigLayer) -> Self {
        self.user_settings = settings;
        self
    }

    /// Explicit working context.
    pub fn with_context_key(mut self, key: impl Into<ContextKey>) -> Self {
        self.context_key = Some(key.into());
        self
    }

    /// Action identifier: numeric for the legacy table, any other text otherwise.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Namespace name used with a non-numeric action.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Session lock held by this request, released once the payload is built.
    pub fn with_session_lock(mut self, lock: Box<dyn SessionLock>) -> Self {
        self.session_lock = Some(lock);
        self
    }

    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }
}

impl std::fmt::Debug for BootstrapRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapRequest")
            .field("id", &self.id)
            .field("session", &self.session)
            .field("current_context", self.current_context.key())
            .field("context_key", &self.context_key)
            .field("action", &self.action)
            .field("namespace", &self.namespace)
            .field("session_lock", &self.session_lock.is_some())
            .finish_non_exhaustive()
    }
}

/// Builds bootstrap payloads.
pub struct ConfigBootstrap {
    settings: KeelConfig,
    system: Arc<dyn SystemOptions>,
    services: Collaborators,
    filter: SecurityFilter,
}

impl std::fmt::Debug for ConfigBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigBootstrap")
            .field("settings", &self.settings)
            .field("services", &self.services)
            .field("sensitive_keys", &self.filter.len())
            .finish_non_exhaustive()
    }
}

impl ConfigBootstrap {
    /// Creates the pipeline.
    ///
    /// # Errors
    ///
    /// [`FilterError::InvalidKey`] if `settings.security` lists a blank key.
    pub fn new(
        settings: KeelConfig,
        system: Arc<dyn SystemOptions>,
        services: Collaborators,
    ) -> Result<Self, FilterError> {
        let filter = SecurityFilter::with_extra_keys(&settings.security.extra_sensitive_keys)?;
        Ok(Self {
            settings,
            system,
            services,
            filter,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &KeelConfig {
        &self.settings
    }

    #[must_use]
    pub fn filter(&self) -> &SecurityFilter {
        &self.filter
    }

    /// Handles one request.
    ///
    /// The session lock is released after rendering on success and by the
    /// guard's drop on every other path.
    ///
    /// # Errors
    ///
    /// - [`BootstrapError::PermissionDenied`] for a bad explicit context key
    /// - [`BootstrapError::Filter`] if sanitizing fails
    /// - [`BootstrapError::Render`] if rendering fails
    pub fn run(&self, request: BootstrapRequest) -> Result<BootstrapResponse, BootstrapError> {
        let span = info_span!("bootstrap", request_id = %request.id);
        let _enter = span.enter();

        let lock = SessionLockGuard::new(request.session_lock);
        let realm = self.settings.realm.as_str();
        let session = &request.session;

        let Ok(identity) = session.require_authenticated(realm) else {
            debug!(realm, "Unauthenticated request, empty payload");
            return Ok(BootstrapResponse::Empty);
        };

        let svc = &self.services;
        let resolver = ContextResolver::new(svc.contexts.as_ref(), svc.lexicon.as_ref());
        let context = resolver.resolve(request.context_key.as_ref(), &request.current_context)?;

        let capabilities = svc.registry.capabilities();
        let namespace = NamespaceResolution::resolve(
            svc.namespaces.as_ref(),
            request.action.as_deref(),
            request.namespace.as_deref(),
            &self.settings.default_namespace,
        );
        let system = self.system.system_layer();
        let default_key = system
            .get_str("default_context")
            .filter(|key| !key.is_empty())
            .unwrap_or(self.settings.default_context.as_str());
        let default_context = resolver.resolve_default(&ContextKey::new(default_key));
        if default_context.is_none() {
            debug!(context = default_key, "No default site URL");
        }

        let merged = ConfigMerger::new(&self.settings).merge(&MergeInputs {
            system: &system,
            context: &context,
            principal: &request.user_settings,
            principal_id: Some(identity.id),
            capabilities: &capabilities,
            namespace: &namespace,
            default_context: default_context.as_deref(),
        });

        let sanitized = self.filter.apply(merged).inspect_err(|e| {
            warn!(error = %e, code = e.code(), "Security filter blocked the payload");
        })?;

        let permissions =
            PermissionProjector::new(svc.catalog.as_ref(), svc.policy.as_ref()).project(session, realm);

        let payload = ScriptPayload::render(
            &self.settings.payload,
            &sanitized,
            &svc.routes.action_ids(),
            &permissions,
            Some(identity),
        )?;
        lock.release();

        info!(
            user = %identity.id,
            context = %context.key(),
            config_keys = sanitized.as_layer().len(),
            permissions = permissions.len(),
            "Bootstrap payload built"
        );
        Ok(BootstrapResponse::Script(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_types::assert_error_codes;

    #[test]
    fn error_codes() {
        assert_error_codes(
            &[
                BootstrapError::permission_denied("no"),
                BootstrapError::Filter(FilterError::Leaked("dsn".into())),
                BootstrapError::Render(PayloadError::InvalidGlobal("1".into())),
            ],
            "BOOTSTRAP_",
        );
    }

    #[test]
    fn access_denied_keeps_message() {
        let err: BootstrapError = AccessDenied::permission_denied("Permission denied!").into();
        assert_eq!(err.to_string(), "Permission denied!");
        assert!(err.is_recoverable());
    }

    #[test]
    fn filter_failure_is_fatal() {
        let err: BootstrapError = FilterError::Leaked("password".into()).into();
        assert!(!err.is_recoverable());
        assert_eq!(err.code(), "BOOTSTRAP_FILTER_FAILED");
    }

    #[test]
    fn empty_response_has_no_body() {
        assert!(BootstrapResponse::Empty.is_empty());
        assert_eq!(BootstrapResponse::Empty.body(), "");
    }
}
