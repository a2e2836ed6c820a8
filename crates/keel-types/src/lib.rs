//! Core types for Keel.
//!
//! Keel produces the client-runtime bootstrap payload for an authenticated
//! manager principal. This crate holds the vocabulary every other crate
//! speaks and depends on nothing but `serde` and `uuid`.
//!
//! # Crate Architecture
//!
//! ```text
//! keel-types    : IDs, Principal, ErrorCode        ◄── HERE
//!     ↑
//! keel-auth     : Session, PermissionPolicy, PermissionCatalog, SessionLock
//!     ↑
//! keel-runtime  : context / registry / merge / filter / permission / payload
//!     ↑
//! keel-cli      : `keel` binary (site manifest → payload)
//! ```
//!
//! # Example
//!
//! ```
//! use keel_types::{ContextKey, PermissionName, Principal, PrincipalId};
//!
//! let user = Principal::user(PrincipalId::new(7), "editor");
//! assert_eq!(user.identity().map(|i| i.username.as_str()), Some("editor"));
//!
//! let ctx = ContextKey::new("web");
//! assert_eq!(ctx.as_str(), "web");
//!
//! let perm = PermissionName::new("edit_resource");
//! assert_eq!(perm.to_string(), "edit_resource");
//! ```

mod error;
mod id;
mod principal;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{ContextKey, PermissionName, PrincipalId, RequestId};
pub use principal::{Identity, Principal};
