//! Keel Runtime - configuration bootstrap and permission projection.
//!
//! Given an authenticated session and an optional execution context, this
//! crate builds the script payload a client runtime reads at startup:
//! the merged and sanitized configuration, the routable action table, the
//! session's permission grants and a minimal identity record.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  keel-types : PrincipalId, ContextKey, Principal, ErrorCode │
//! │  keel-auth  : Session, PermissionPolicy, SessionLockGuard   │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Runtime Layer (THIS CRATE)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  context/   : ExecutionContext, ContextResolver             │
//! │  registry   : ResourceTypeRegistry, capability maps         │
//! │  merge      : ConfigMerger over four ConfigLayers           │
//! │  filter     : SecurityFilter, SanitizedConfig               │
//! │  permission : PermissionProjector, PermissionMap            │
//! │  payload    : ScriptPayload                                 │
//! │  bootstrap  : ConfigBootstrap (the pipeline)                │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │  keel-cli : manifest-driven `keel` binary                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! ## [`bootstrap`] - The Pipeline
//!
//! - [`ConfigBootstrap`]: runs one [`BootstrapRequest`]
//! - [`BootstrapResponse`]: `Empty` for unauthenticated callers, `Script` otherwise
//!
//! ## [`config`] - Process Settings
//!
//! - [`KeelConfig`](config::KeelConfig): realm, defaults, URLs, payload, security
//! - [`ConfigLoader`](config::ConfigLoader): defaults < global < project < env
//!
//! ## Collaborators
//!
//! Each external service is a trait with an in-memory implementation:
//! [`ContextStore`](context::ContextStore), [`NamespaceStore`](namespace::NamespaceStore),
//! [`ActionRoutes`](routes::ActionRoutes), [`Lexicon`](lexicon::Lexicon),
//! and in [`auth`] the permission catalog, grant table and session locks.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod context;
pub mod filter;
pub mod lexicon;
pub mod merge;
pub mod namespace;
pub mod options;
pub mod payload;
pub mod permission;
pub mod registry;
pub mod routes;

pub use auth::{GrantTable, HeldSessionLock, InMemoryPermissionCatalog, SessionLockTable};
pub use bootstrap::{
    BootstrapError, BootstrapRequest, BootstrapResponse, Collaborators, ConfigBootstrap,
};
pub use config::{
    default_config_dir, default_config_path, ConfigError, ConfigLoader, ConfigResolver,
    KeelConfig, NoOpResolver,
};
pub use context::{ContextResolver, ContextStore, ExecutionContext, InMemoryContextStore};
pub use filter::{FilterError, SanitizedConfig, SecurityFilter, SENSITIVE_KEYS};
pub use lexicon::{Lexicon, StaticLexicon};
pub use merge::{ConfigMerger, MergeInputs};
pub use namespace::{
    InMemoryNamespaceStore, LegacyAction, NamespaceRecord, NamespaceResolution, NamespaceStore,
};
pub use options::{ConfigLayer, LayerStack, SystemOptions};
pub use payload::{PayloadError, ScriptPayload, SCRIPT_CONTENT_TYPE};
pub use permission::{PermissionMap, PermissionProjector};
pub use registry::{
    DropPolicy, RegistryError, ResourceCapabilities, ResourceTypeDescriptor, ResourceTypeRegistry,
};
pub use routes::{ActionRoutes, StaticActionRoutes};

// Session and identity types are part of the public API.
pub use keel_auth::{
    AccessDenied, PermissionCatalog, PermissionPolicy, Session, SessionLock, SessionLockGuard,
};
pub use keel_types::{
    ContextKey, ErrorCode, Identity, PermissionName, Principal, PrincipalId, RequestId,
};
