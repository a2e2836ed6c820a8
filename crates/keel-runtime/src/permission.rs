//! Projection of a session's grants over the permission catalog.

use keel_auth::{PermissionCatalog, PermissionPolicy, Session};
use keel_types::PermissionName;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Permission name → granted, one entry per distinct catalog name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionMap(BTreeMap<PermissionName, bool>);

impl PermissionMap {
    /// Grant of `name`, or `None` if the name was not in the catalog.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<bool> {
        self.0.get(&PermissionName::new(name)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &PermissionName> {
        self.0.keys()
    }

    /// Names that are granted.
    pub fn granted(&self) -> impl Iterator<Item = &PermissionName> {
        self.0.iter().filter(|(_, g)| **g).map(|(n, _)| n)
    }
}

/// Evaluates every catalog permission for a session.
pub struct PermissionProjector<'a> {
    catalog: &'a dyn PermissionCatalog,
    policy: &'a dyn PermissionPolicy,
}

impl<'a> PermissionProjector<'a> {
    #[must_use]
    pub fn new(catalog: &'a dyn PermissionCatalog, policy: &'a dyn PermissionPolicy) -> Self {
        Self { catalog, policy }
    }

    /// Builds the map for `session` in `realm`.
    ///
    /// An unauthenticated session yields an empty map and the policy is
    /// never consulted. The catalog is read on every call.
    #[must_use]
    pub fn project(&self, session: &Session, realm: &str) -> PermissionMap {
        if !session.is_authenticated(realm) {
            return PermissionMap::default();
        }

        let map: BTreeMap<PermissionName, bool> = self
            .catalog
            .distinct_names()
            .into_iter()
            .map(|name| {
                let granted = self.policy.has_permission(session, &name);
                (name, granted)
            })
            .collect();

        debug!(
            total = map.len(),
            granted = map.values().filter(|g| **g).count(),
            "Permissions projected"
        );
        PermissionMap(map)
    }
}
