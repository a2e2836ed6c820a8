//! Permission policy trait.
//!
//! [`PermissionPolicy`] answers the `hasPermission(name)` question for a
//! session. Concrete policies (ACL tables, group/role resolution, test
//! doubles) live in consumers; `keel-runtime` ships `GrantTable`.

use crate::Session;
use keel_types::PermissionName;

/// Evaluates a single named permission for a session.
///
/// Implementations must be side-effect free: the projector calls
/// [`has_permission`](Self::has_permission) once per catalog entry on
/// every bootstrap request.
///
/// ```
/// use keel_auth::{PermissionPolicy, Session};
/// use keel_types::{PermissionName, Principal, PrincipalId};
///
/// struct ViewOnly;
///
/// impl PermissionPolicy for ViewOnly {
///     fn has_permission(&self, _session: &Session, permission: &PermissionName) -> bool {
///         permission.as_str().starts_with("view_")
///     }
/// }
///
/// let session = Session::new(Principal::user(PrincipalId::new(1), "ed")).authenticate("mgr");
/// assert!(ViewOnly.has_permission(&session, &"view_resource".into()));
/// assert!(!ViewOnly.has_permission(&session, &"edit_resource".into()));
/// ```
pub trait PermissionPolicy: Send + Sync {
    /// Returns `true` if `session` holds `permission`.
    fn has_permission(&self, session: &Session, permission: &PermissionName) -> bool;
}

/// Grants nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl PermissionPolicy for DenyAll {
    fn has_permission(&self, _session: &Session, _permission: &PermissionName) -> bool {
        false
    }
}
