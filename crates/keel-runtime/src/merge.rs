//! Layered configuration merge.
//!
//! The merged mapping is a pure function of its inputs:
//!
//! ```text
//! system  <  context  <  principal overrides  <  computed
//! ```
//!
//! The computed layer is assembled here from the URL settings, the
//! resource capability maps, the namespace resolution and the default
//! context's entry URL.

use crate::config::KeelConfig;
use crate::context::ExecutionContext;
use crate::namespace::NamespaceResolution;
use crate::options::{ConfigLayer, LayerStack};
use crate::registry::ResourceCapabilities;
use keel_types::PrincipalId;
use serde_json::Value;
use tracing::trace;

/// Everything one merge reads.
#[derive(Debug, Clone, Copy)]
pub struct MergeInputs<'a> {
    pub system: &'a ConfigLayer,
    pub context: &'a ExecutionContext,
    pub principal: &'a ConfigLayer,
    pub principal_id: Option<PrincipalId>,
    pub capabilities: &'a ResourceCapabilities,
    pub namespace: &'a NamespaceResolution,
    /// Context whose start resource becomes `default_site_url`.
    pub default_context: Option<&'a ExecutionContext>,
}

/// Builds the computed layer and merges all four layers.
#[derive(Debug, Clone, Copy)]
pub struct ConfigMerger<'a> {
    settings: &'a KeelConfig,
}

impl<'a> ConfigMerger<'a> {
    #[must_use]
    pub fn new(settings: &'a KeelConfig) -> Self {
        Self { settings }
    }

    /// Merged mapping for `inputs`.
    #[must_use]
    pub fn merge(&self, inputs: &MergeInputs<'_>) -> ConfigLayer {
        let computed = self.computed_layer(inputs);
        let merged = LayerStack {
            system: inputs.system,
            context: inputs.context.options(),
            principal: inputs.principal,
            computed: &computed,
        }
        .merge();

        trace!(keys = merged.len(), computed = computed.len(), "Config merged");
        merged
    }

    /// Values computed for this request.
    #[must_use]
    pub fn computed_layer(&self, inputs: &MergeInputs<'_>) -> ConfigLayer {
        let urls = &self.settings.urls;
        let mut layer = ConfigLayer::new();

        for (key, fallback) in [
            ("base_url", &urls.base_url),
            ("connectors_url", &urls.connectors_url),
            ("manager_url", &urls.manager_url),
            ("site_url", &urls.site_url),
            ("http_host", &urls.http_host),
        ] {
            layer.insert(key, read_option(inputs, key, fallback));
        }

        let manager_url = read_option(inputs, "manager_url", &urls.manager_url);
        let theme = read_option(inputs, "manager_theme", &urls.manager_theme);
        let template_url = format!("{manager_url}templates/{theme}/");
        layer.insert("icons_url", format!("{template_url}images/ext/modext/"));
        layer.insert("template_url", template_url);

        let http_host = read_option(inputs, "http_host", &urls.http_host);
        layer.insert("http_host_remote", format!("{}{http_host}", urls.url_scheme));

        if let Some(id) = inputs.principal_id {
            layer.insert("user", id.get());
        }
        layer.insert("version", self.settings.version.as_str());

        layer.insert(
            "resource_classes",
            Value::Object(inputs.capabilities.menu_map.clone()),
        );
        layer.insert(
            "resource_classes_drop",
            Value::Object(inputs.capabilities.drop_map.clone()),
        );

        if let Some(url) = inputs
            .default_context
            .and_then(|ctx| ctx.entry_url(inputs.system))
        {
            layer.insert("default_site_url", url);
        }

        inputs.namespace.write_into(&mut layer);
        layer
    }
}

/// Principal override, then context option, then system option, then `fallback`.
fn read_option(inputs: &MergeInputs<'_>, name: &str, fallback: &str) -> String {
    let value = inputs
        .context
        .get_option(name, inputs.principal)
        .or_else(|| inputs.system.get(name));
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => fallback.to_string(),
        Some(other) => other.to_string(),
    }
}
