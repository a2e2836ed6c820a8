//! Execution contexts and their resolution.
//!
//! An execution context is a named site area (`web`, `mgr`, ...) with its
//! own option overlay. Its options are only trustworthy after
//! [`ExecutionContext::prepare`] succeeded.

mod resolver;
mod store;

pub use resolver::ContextResolver;
pub use store::{ContextStore, InMemoryContextStore};

use crate::options::ConfigLayer;
use keel_types::{ContextKey, ErrorCode};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::debug;

/// Why a context could not be prepared.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The context exists but is switched off.
    #[error("context '{0}' is unavailable")]
    Unavailable(ContextKey),
}

impl ErrorCode for ContextError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "CONTEXT_UNAVAILABLE",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// A named configuration scope.
///
/// ```
/// use keel_runtime::context::ExecutionContext;
/// use keel_runtime::options::ConfigLayer;
///
/// let web = ExecutionContext::new("web")
///     .with_option("base_url", "/")
///     .with_site_start("1")
///     .with_alias("1", "home.html");
///
/// web.prepare().expect("available");
/// assert_eq!(web.make_url("1", &ConfigLayer::new()), Some("/home.html".into()));
/// ```
#[derive(Debug)]
pub struct ExecutionContext {
    key: ContextKey,
    options: ConfigLayer,
    site_start: Option<String>,
    aliases: BTreeMap<String, String>,
    available: bool,
    prepared: AtomicBool,
}

impl ExecutionContext {
    /// Creates an available, unprepared context with no options.
    #[must_use]
    pub fn new(key: impl Into<ContextKey>) -> Self {
        Self {
            key: key.into(),
            options: ConfigLayer::new(),
            site_start: None,
            aliases: BTreeMap::new(),
            available: true,
            prepared: AtomicBool::new(false),
        }
    }

    /// Replaces the option overlay.
    #[must_use]
    pub fn with_options(mut self, options: ConfigLayer) -> Self {
        self.options = options;
        self
    }

    /// Sets a single option.
    #[must_use]
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name, value);
        self
    }

    /// Sets the start resource used for the default entry URL.
    #[must_use]
    pub fn with_site_start(mut self, resource: impl Into<String>) -> Self {
        self.site_start = Some(resource.into());
        self
    }

    /// Maps a resource id to its friendly URI.
    #[must_use]
    pub fn with_alias(mut self, resource: impl Into<String>, uri: impl Into<String>) -> Self {
        self.aliases.insert(resource.into(), uri.into());
        self
    }

    /// Marks the context as switched off; [`prepare`](Self::prepare) will fail.
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Returns the context key.
    #[must_use]
    pub fn key(&self) -> &ContextKey {
        &self.key
    }

    /// Returns the option overlay.
    #[must_use]
    pub fn options(&self) -> &ConfigLayer {
        &self.options
    }

    /// Returns the start resource, if configured.
    #[must_use]
    pub fn site_start(&self) -> Option<&str> {
        self.site_start.as_deref()
    }

    /// Returns `true` once [`prepare`](Self::prepare) has succeeded.
    #[must_use]
    pub fn is_prepared(&self) -> bool {
        self.prepared.load(Ordering::Acquire)
    }

    /// Prepares the context for use. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Unavailable`] for a switched-off context.
    pub fn prepare(&self) -> Result<(), ContextError> {
        if !self.available {
            return Err(ContextError::Unavailable(self.key.clone()));
        }
        if !self.prepared.swap(true, Ordering::AcqRel) {
            debug!(context = %self.key, options = self.options.len(), "Context prepared");
        }
        Ok(())
    }

    /// Reads an option: `overrides` first, then this context's overlay.
    #[must_use]
    pub fn get_option<'a>(&'a self, name: &str, overrides: &'a ConfigLayer) -> Option<&'a Value> {
        overrides.get(name).or_else(|| self.options.get(name))
    }

    /// Reads an option as a string, falling back to `default`.
    ///
    /// Non-string values are rendered as their JSON text; `null` counts as unset.
    #[must_use]
    pub fn option_or(&self, name: &str, default: &str, overrides: &ConfigLayer) -> String {
        match self.get_option(name, overrides) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => default.to_string(),
            Some(other) => other.to_string(),
        }
    }

    /// Reads an option from this context's overlay, then from `system`.
    fn inherited<'a>(&'a self, name: &str, system: &'a ConfigLayer) -> Option<&'a Value> {
        self.options
            .get(name)
            .or_else(|| system.get(name))
            .filter(|v| !v.is_null())
    }

    /// Builds a site-relative URL for `resource`.
    ///
    /// `base_url` comes from the context overlay, then `system`. Uses the
    /// friendly alias when one is mapped, `?id=<resource>` otherwise.
    /// Returns `None` while the context is unprepared.
    #[must_use]
    pub fn make_url(&self, resource: &str, system: &ConfigLayer) -> Option<String> {
        if !self.is_prepared() {
            return None;
        }
        let base = match self.inherited("base_url", system) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => "/".to_string(),
        };
        Some(match self.aliases.get(resource) {
            Some(alias) => format!("{base}{}", alias.trim_start_matches('/')),
            None => format!("{base}?id={resource}"),
        })
    }

    /// URL of the start resource, if the context is prepared and has one.
    ///
    /// `site_start` is read as a context option, then from `system`, then
    /// from [`with_site_start`](Self::with_site_start).
    #[must_use]
    pub fn entry_url(&self, system: &ConfigLayer) -> Option<String> {
        let start = match self.inherited("site_start", system) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => self.site_start()?.to_string(),
        };
        self.make_url(&start, system)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prepare_is_idempotent() {
        let ctx = ExecutionContext::new("web");
        assert!(!ctx.is_prepared());
        ctx.prepare().unwrap();
        ctx.prepare().unwrap();
        assert!(ctx.is_prepared());
    }

    #[test]
    fn unavailable_context_fails_to_prepare() {
        let ctx = ExecutionContext::new("web").unavailable();
        let err = ctx.prepare().unwrap_err();
        assert!(err.to_string().contains("web"));
        assert!(!ctx.is_prepared());
    }

    #[test]
    fn overrides_win_over_context_options() {
        let ctx = ExecutionContext::new("mgr").with_option("manager_theme", "ctx");
        let mut overrides = ConfigLayer::new();

        assert_eq!(ctx.option_or("manager_theme", "default", &overrides), "ctx");
        overrides.insert("manager_theme", "user");
        assert_eq!(ctx.option_or("manager_theme", "default", &overrides), "user");
        assert_eq!(ctx.option_or("missing", "default", &overrides), "default");
    }

    #[test]
    fn option_or_renders_non_strings_and_skips_null() {
        let ctx = ExecutionContext::new("mgr")
            .with_option("port", json!(8080))
            .with_option("nothing", Value::Null);
        let overrides = ConfigLayer::new();
        assert_eq!(ctx.option_or("port", "80", &overrides), "8080");
        assert_eq!(ctx.option_or("nothing", "fallback", &overrides), "fallback");
    }

    #[test]
    fn make_url_requires_preparation() {
        let ctx = ExecutionContext::new("web").with_site_start("1");
        let overrides = ConfigLayer::new();
        assert_eq!(ctx.entry_url(&overrides), None);

        ctx.prepare().unwrap();
        assert_eq!(ctx.entry_url(&overrides), Some("/?id=1".into()));
    }

    #[test]
    fn make_url_uses_alias_and_base_url() {
        let ctx = ExecutionContext::new("web")
            .with_option("base_url", "/site/")
            .with_alias("3", "/about.html");
        ctx.prepare().unwrap();
        assert_eq!(
            ctx.make_url("3", &ConfigLayer::new()),
            Some("/site/about.html".into())
        );
    }

    #[test]
    fn entry_url_reads_site_start_option_then_system() {
        let ctx = ExecutionContext::new("web")
            .with_site_start("9")
            .with_alias("1", "index.html")
            .with_alias("2", "news.html");
        ctx.prepare().unwrap();

        let mut system = ConfigLayer::new();
        system.insert("site_start", "1");
        assert_eq!(ctx.entry_url(&system), Some("/index.html".into()));

        system.insert("site_start", json!(2));
        assert_eq!(ctx.entry_url(&system), Some("/news.html".into()));

        let ctx = ctx.with_option("site_start", "2");
        ctx.prepare().unwrap();
        system.insert("site_start", "1");
        assert_eq!(ctx.entry_url(&system), Some("/news.html".into()));
    }

    #[test]
    fn make_url_base_url_prefers_context_over_system() {
        let ctx = ExecutionContext::new("web").with_alias("1", "index.html");
        ctx.prepare().unwrap();
        let mut system = ConfigLayer::new();
        system.insert("base_url", "/sys/");
        assert_eq!(ctx.make_url("1", &system), Some("/sys/index.html".into()));

        let ctx = ctx.with_option("base_url", "/ctx/");
        ctx.prepare().unwrap();
        assert_eq!(ctx.make_url("1", &system), Some("/ctx/index.html".into()));
    }

    #[test]
    fn entry_url_absent_without_site_start() {
        let ctx = ExecutionContext::new("web");
        ctx.prepare().unwrap();
        assert_eq!(ctx.entry_url(&ConfigLayer::new()), None);
    }
}
