//! Authentication and permission primitives for Keel.
//!
//! The authentication subsystem itself lives outside Keel. This crate
//! defines the boundary Keel consumes from it:
//!
//! | Type | Answers |
//! |------|---------|
//! | [`Session`] | Who is calling, and in which realms are they authenticated |
//! | [`PermissionPolicy`] | Does this session hold permission `name` |
//! | [`PermissionCatalog`] | Which permission names exist right now |
//! | [`SessionLock`] / [`SessionLockGuard`] | When may the session's write lock be let go |
//!
//! # Crate Architecture
//!
//! ```text
//! keel-types  (IDs, Principal)
//!     ↑
//! keel-auth   (Session, PermissionPolicy, PermissionCatalog, SessionLock)  ◄── THIS CRATE
//!     ↑
//! keel-runtime (GrantTable, InMemoryPermissionCatalog, SessionLockTable)
//! ```
//!
//! Trait definitions live here, implementations live in `keel-runtime`.

pub mod catalog;
pub mod error;
pub mod lock;
pub mod policy;
pub mod session;

pub use catalog::PermissionCatalog;
pub use error::AccessDenied;
pub use lock::{SessionLock, SessionLockGuard};
pub use policy::{DenyAll, PermissionPolicy};
pub use session::Session;

pub use keel_types::{Identity, PermissionName, Principal, PrincipalId};
