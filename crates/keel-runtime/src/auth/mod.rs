//! In-process implementations of the authorization collaborators.
//!
//! ```text
//! PermissionPolicy  (keel-auth)  →  GrantTable
//! PermissionCatalog (keel-auth)  →  InMemoryPermissionCatalog
//! SessionLock       (keel-auth)  →  SessionLockTable / HeldSessionLock
//! ```

mod catalog;
mod grant_table;
mod session_lock;

pub use catalog::InMemoryPermissionCatalog;
pub use grant_table::GrantTable;
pub use session_lock::{HeldSessionLock, SessionLockTable};
