//! Per-principal permission grants.

use keel_auth::{PermissionPolicy, Session};
use keel_types::{PermissionName, PrincipalId};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// Thread-safe table of granted permission names per principal.
///
/// Principals marked with [`grant_all`](Self::grant_all) hold every
/// permission, including ones installed after the mark.
///
/// ```
/// use keel_auth::{PermissionPolicy, Session};
/// use keel_runtime::auth::GrantTable;
/// use keel_types::{Principal, PrincipalId};
///
/// let table = GrantTable::new();
/// table.grant(PrincipalId::new(5), "edit");
///
/// let session = Session::new(Principal::user(PrincipalId::new(5), "ed")).authenticate("mgr");
/// assert!(table.has_permission(&session, &"edit".into()));
/// assert!(!table.has_permission(&session, &"view".into()));
/// ```
#[derive(Debug, Default)]
pub struct GrantTable {
    grants: RwLock<HashMap<PrincipalId, HashSet<PermissionName>>>,
    sudo: RwLock<HashSet<PrincipalId>>,
}

impl GrantTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `permission` to `principal`.
    pub fn grant(&self, principal: PrincipalId, permission: impl Into<PermissionName>) {
        self.grants
            .write()
            .entry(principal)
            .or_default()
            .insert(permission.into());
    }

    /// Revokes `permission`. Returns `true` if it was granted.
    pub fn revoke(&self, principal: PrincipalId, permission: &PermissionName) -> bool {
        self.grants
            .write()
            .get_mut(&principal)
            .is_some_and(|set| set.remove(permission))
    }

    /// Grants every permission to `principal`.
    pub fn grant_all(&self, principal: PrincipalId) {
        self.sudo.write().insert(principal);
    }

    /// Removes every grant of `principal`, including [`grant_all`](Self::grant_all).
    pub fn clear(&self, principal: PrincipalId) {
        self.grants.write().remove(&principal);
        self.sudo.write().remove(&principal);
    }

    /// Explicit grants of `principal`, sorted.
    #[must_use]
    pub fn grants_for(&self, principal: PrincipalId) -> Vec<PermissionName> {
        let mut names: Vec<PermissionName> = self
            .grants
            .read()
            .get(&principal)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl PermissionPolicy for GrantTable {
    fn has_permission(&self, session: &Session, permission: &PermissionName) -> bool {
        let Some(id) = session.principal().id() else {
            return false;
        };

        if self.sudo.read().contains(&id) {
            return true;
        }

        self.grants
            .read()
            .get(&id)
            .is_some_and(|set| set.contains(permission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_types::Principal;

    fn session(id: u64) -> Session {
        Session::new(Principal::user(PrincipalId::new(id), "u")).authenticate("mgr")
    }

    #[test]
    fn grants_are_per_principal() {
        let table = GrantTable::new();
        table.grant(PrincipalId::new(1), "edit");

        assert!(table.has_permission(&session(1), &"edit".into()));
        assert!(!table.has_permission(&session(2), &"edit".into()));
    }

    #[test]
    fn anonymous_holds_nothing() {
        let table = GrantTable::new();
        table.grant_all(PrincipalId::new(1));
        assert!(!table.has_permission(&Session::anonymous(), &"edit".into()));
    }

    #[test]
    fn grant_all_covers_unknown_names() {
        let table = GrantTable::new();
        table.grant_all(PrincipalId::new(1));
        assert!(table.has_permission(&session(1), &"installed_later".into()));
    }

    #[test]
    fn revoke_and_clear() {
        let table = GrantTable::new();
        let id = PrincipalId::new(3);
        table.grant(id, "edit");
        table.grant(id, "view");

        assert!(table.revoke(id, &"edit".into()));
        assert!(!table.revoke(id, &"edit".into()));
        assert_eq!(table.grants_for(id), vec![PermissionName::new("view")]);

        table.grant_all(id);
        table.clear(id);
        assert!(table.grants_for(id).is_empty());
        assert!(!table.has_permission(&session(3), &"view".into()));
    }

    #[test]
    fn concurrent_grants() {
        use std::sync::Arc;
        use std::thread;

        let table = Arc::new(GrantTable::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let table = Arc::clone(&table);
                thread::spawn(move || table.grant(PrincipalId::new(1), format!("perm_{i}").as_str()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.grants_for(PrincipalId::new(1)).len(), 8);
    }
}
