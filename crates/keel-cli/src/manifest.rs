//! Site manifest: the TOML file that stands in for a site's database.
//!
//! ```toml
//! current_context = "mgr"
//! permissions = ["edit_resource", "view_resource"]
//!
//! [system]
//! site_name = "Demo"
//!
//! [contexts.web]
//! site_start = "1"
//! aliases = { "1" = "index.html" }
//! options = { base_url = "/" }
//!
//! [users.ed]
//! id = 5
//! realms = ["mgr"]
//! permissions = ["edit_resource"]
//!
//! [[resource_types]]
//! class = "BlogPost"
//! menu_visible = true
//! menu_label = "Blog Post"
//! drop_policy = 2
//!
//! [namespaces.core]
//! path = "/srv/core/"
//! assets_url = "/assets/core/"
//!
//! [legacy_actions.12]
//! namespace = "gallery"
//! help_url = "/docs/gallery"
//!
//! [actions]
//! "12" = "gallery/index"
//!
//! [lexicon]
//! permission_denied = "Access refused."
//! ```

use anyhow::{bail, Context, Result};
use keel_runtime::{
    ConfigLayer, ContextKey, ContextStore, ExecutionContext, GrantTable, InMemoryContextStore,
    InMemoryNamespaceStore, InMemoryPermissionCatalog, LegacyAction, NamespaceRecord, Principal,
    PrincipalId, ResourceTypeDescriptor, ResourceTypeRegistry, Session, StaticActionRoutes,
    StaticLexicon,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

fn default_current_context() -> String {
    "mgr".into()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteManifest {
    #[serde(default = "default_current_context")]
    pub current_context: String,
    #[serde(default)]
    pub system: ConfigLayer,
    #[serde(default)]
    pub contexts: BTreeMap<String, ContextEntry>,
    #[serde(default)]
    pub users: BTreeMap<String, UserEntry>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub resource_types: Vec<ResourceTypeDescriptor>,
    #[serde(default)]
    pub namespaces: BTreeMap<String, NamespaceEntry>,
    #[serde(default)]
    pub legacy_actions: BTreeMap<String, LegacyEntry>,
    #[serde(default)]
    pub actions: Option<Value>,
    #[serde(default)]
    pub lexicon: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextEntry {
    #[serde(default)]
    pub options: ConfigLayer,
    pub site_start: Option<String>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default = "default_true")]
    pub available: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserEntry {
    pub id: u64,
    #[serde(default)]
    pub realms: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    /// Holds every permission.
    #[serde(default)]
    pub sudo: bool,
    #[serde(default)]
    pub settings: ConfigLayer,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamespaceEntry {
    pub path: String,
    #[serde(default)]
    pub assets_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegacyEntry {
    pub namespace: String,
    #[serde(default)]
    pub namespace_path: String,
    #[serde(default)]
    pub namespace_assets_path: String,
    #[serde(default)]
    pub help_url: String,
}

/// Collaborators built from a manifest.
pub struct Site {
    pub contexts: Arc<InMemoryContextStore>,
    pub namespaces: Arc<InMemoryNamespaceStore>,
    pub catalog: Arc<InMemoryPermissionCatalog>,
    pub grants: Arc<GrantTable>,
    pub routes: Arc<StaticActionRoutes>,
    pub lexicon: Arc<StaticLexicon>,
    pub system: ConfigLayer,
    pub current_context: Arc<ExecutionContext>,
    users: BTreeMap<String, UserEntry>,
}

impl SiteManifest {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read manifest {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid manifest {}", path.display()))
    }

    /// Builds the in-memory stores and registers resource types into `registry`.
    pub fn into_site(self, registry: &ResourceTypeRegistry) -> Result<Site> {
        let contexts = InMemoryContextStore::new();
        for (key, entry) in self.contexts {
            let mut context = ExecutionContext::new(key.as_str()).with_options(entry.options);
            if let Some(start) = entry.site_start {
                context = context.with_site_start(start);
            }
            for (resource, uri) in entry.aliases {
                context = context.with_alias(resource, uri);
            }
            if !entry.available {
                context = context.unavailable();
            }
            contexts.insert(context);
        }

        let current_key = ContextKey::new(self.current_context.as_str());
        let current_context = match contexts.get_context(&current_key) {
            Some(context) => context,
            None => contexts.insert(ExecutionContext::new(current_key.clone())),
        };
        current_context
            .prepare()
            .with_context(|| format!("current context '{current_key}' is unavailable"))?;

        for descriptor in self.resource_types {
            registry.register(descriptor)?;
        }

        let namespaces = InMemoryNamespaceStore::new();
        for (name, entry) in self.namespaces {
            namespaces.insert_namespace(NamespaceRecord::new(name, entry.path, entry.assets_url));
        }
        for (id, entry) in self.legacy_actions {
            let Ok(id) = id.parse::<u32>() else {
                bail!("legacy action id '{id}' is not numeric");
            };
            namespaces.insert_legacy_action(LegacyAction {
                id,
                namespace: entry.namespace,
                namespace_path: entry.namespace_path,
                namespace_assets_path: entry.namespace_assets_path,
                help_url: entry.help_url,
            });
        }

        let catalog: InMemoryPermissionCatalog = self.permissions.iter().map(String::as_str).collect();
        let grants = GrantTable::new();
        for user in self.users.values() {
            let id = PrincipalId::new(user.id);
            for permission in &user.permissions {
                grants.grant(id, permission.as_str());
            }
            if user.sudo {
                grants.grant_all(id);
            }
        }

        let routes = self
            .actions
            .map_or_else(StaticActionRoutes::default, StaticActionRoutes::new);

        let mut lexicon = StaticLexicon::english();
        lexicon.extend(self.lexicon);

        debug!(
            users = self.users.len(),
            resource_types = registry.len(),
            "Manifest loaded"
        );

        Ok(Site {
            contexts: Arc::new(contexts),
            namespaces: Arc::new(namespaces),
            catalog: Arc::new(catalog),
            grants: Arc::new(grants),
            routes: Arc::new(routes),
            lexicon: Arc::new(lexicon),
            system: self.system,
            current_context,
            users: self.users,
        })
    }
}

impl Site {
    /// Session of the named user, or an anonymous one for `None`.
    pub fn session(&self, user: Option<&str>) -> Result<(Session, ConfigLayer)> {
        let Some(name) = user else {
            return Ok((Session::anonymous(), ConfigLayer::new()));
        };
        let Some(entry) = self.users.get(name) else {
            bail!("unknown user '{name}'");
        };

        let session = entry.realms.iter().fold(
            Session::new(Principal::user(PrincipalId::new(entry.id), name)),
            |session, realm| session.authenticate(realm.as_str()),
        );
        Ok((session, entry.settings.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_runtime::PermissionCatalog;

    const MANIFEST: &str = r#"
permissions = ["edit_resource", "view_resource"]

[system]
site_name = "Demo"

[contexts.mgr]
options = { manager_theme = "dark" }

[contexts.web]
site_start = "1"
aliases = { "1" = "index.html" }

[contexts.closed]
available = false

[users.ed]
id = 5
realms = ["mgr"]
permissions = ["edit_resource"]
settings = { site_name = "Ed's" }

[[resource_types]]
class = "BlogPost"
menu_visible = true
menu_label = "Blog Post"
drop_policy = 2

[namespaces.core]
path = "/srv/core/"

[legacy_actions.12]
namespace = "gallery"

[actions]
"12" = "gallery/index"
"#;

    #[test]
    fn parses_and_builds() {
        let manifest = SiteManifest::from_toml(MANIFEST).unwrap();
        assert_eq!(manifest.current_context, "mgr");
        assert_eq!(manifest.system.get_str("site_name"), Some("Demo"));

        let registry = ResourceTypeRegistry::new();
        let site = manifest.into_site(&registry).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(site.contexts.len(), 3);
        assert!(site.current_context.is_prepared());
        assert_eq!(site.catalog.distinct_names().len(), 2);
        assert_eq!(site.grants.grants_for(PrincipalId::new(5)).len(), 1);
    }

    #[test]
    fn sessions() {
        let registry = ResourceTypeRegistry::new();
        let site = SiteManifest::from_toml(MANIFEST)
            .unwrap()
            .into_site(&registry)
            .unwrap();

        let (ed, settings) = site.session(Some("ed")).unwrap();
        assert!(ed.is_authenticated("mgr"));
        assert_eq!(settings.get_str("site_name"), Some("Ed's"));

        let (anon, _) = site.session(None).unwrap();
        assert!(!anon.is_authenticated("mgr"));

        assert!(site.session(Some("nobody")).is_err());
    }

    #[test]
    fn missing_current_context_is_created() {
        let registry = ResourceTypeRegistry::new();
        let site = SiteManifest::from_toml("current_context = \"admin\"")
            .unwrap()
            .into_site(&registry)
            .unwrap();
        assert_eq!(site.current_context.key().as_str(), "admin");
    }

    #[test]
    fn non_numeric_legacy_id_rejected() {
        let registry = ResourceTypeRegistry::new();
        let manifest =
            SiteManifest::from_toml("[legacy_actions.abc]\nnamespace = \"x\"\n").unwrap();
        assert!(manifest.into_site(&registry).is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(SiteManifest::from_toml("colour = \"red\"").is_err());
    }
}
