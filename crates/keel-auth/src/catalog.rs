//! Permission catalog trait.

use keel_types::PermissionName;
use std::collections::BTreeSet;

/// The dynamically extensible set of grantable permission names.
///
/// The catalog grows as extensions install new permissions, so callers
/// must read it on every request instead of caching the result.
pub trait PermissionCatalog: Send + Sync {
    /// Returns every known permission name.
    ///
    /// May contain duplicates (the same name declared by several access
    /// policies); use [`distinct_names`](Self::distinct_names) to fold them.
    fn permission_names(&self) -> Vec<PermissionName>;

    /// Returns the distinct permission names in lexicographic order.
    fn distinct_names(&self) -> BTreeSet<PermissionName> {
        self.permission_names().into_iter().collect()
    }
}
