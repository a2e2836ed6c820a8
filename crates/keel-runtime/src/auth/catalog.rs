//! Growable permission catalog.

use keel_auth::PermissionCatalog;
use keel_types::PermissionName;
use parking_lot::RwLock;

/// [`PermissionCatalog`] backed by a list that extensions append to.
///
/// Duplicates are kept as declared; the projector folds them.
#[derive(Debug, Default)]
pub struct InMemoryPermissionCatalog {
    names: RwLock<Vec<PermissionName>>,
}

impl InMemoryPermissionCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares one permission.
    pub fn add(&self, name: impl Into<PermissionName>) {
        self.names.write().push(name.into());
    }

    /// Declares several permissions.
    pub fn extend<I, N>(&self, names: I)
    where
        I: IntoIterator<Item = N>,
        N: Into<PermissionName>,
    {
        self.names.write().extend(names.into_iter().map(Into::into));
    }
}

impl<N: Into<PermissionName>> FromIterator<N> for InMemoryPermissionCatalog {
    fn from_iter<I: IntoIterator<Item = N>>(iter: I) -> Self {
        let catalog = Self::new();
        catalog.extend(iter);
        catalog
    }
}

impl PermissionCatalog for InMemoryPermissionCatalog {
    fn permission_names(&self) -> Vec<PermissionName> {
        self.names.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growth_is_visible() {
        let catalog: InMemoryPermissionCatalog = ["view", "edit"].into_iter().collect();
        assert_eq!(catalog.distinct_names().len(), 2);

        catalog.add("publish");
        catalog.add("view");
        assert_eq!(catalog.permission_names().len(), 4);
        assert_eq!(catalog.distinct_names().len(), 3);
    }
}
