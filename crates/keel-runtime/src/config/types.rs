//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use super::ConfigError;
use serde::{Deserialize, Serialize};

/// Process settings after merging all layers.
///
/// ```
/// use keel_runtime::config::KeelConfig;
///
/// let config = KeelConfig::default();
/// assert_eq!(config.realm, "mgr");
/// assert_eq!(config.default_context, "web");
/// assert_eq!(config.urls.manager_theme, "default");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeelConfig {
    /// Realm checked by the authentication gate.
    pub realm: String,

    /// Context whose start resource yields `default_site_url`.
    pub default_context: String,

    /// Namespace used when an action names no namespace.
    pub default_namespace: String,

    /// Version string emitted as `version`.
    pub version: String,

    /// Fallback URLs.
    pub urls: UrlConfig,

    /// Script payload settings.
    pub payload: PayloadConfig,

    /// Security filter settings.
    pub security: SecurityConfig,
}

impl Default for KeelConfig {
    fn default() -> Self {
        Self {
            realm: "mgr".into(),
            default_context: "web".into(),
            default_namespace: "core".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            urls: UrlConfig::default(),
            payload: PayloadConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl KeelConfig {
    /// Deserializes from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the document does not match the schema.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Merges another config into this one.
    ///
    /// Values from `other` win only where they differ from the default,
    /// which is what makes file layering work with `#[serde(default)]`.
    pub fn merge(&mut self, other: &Self) {
        let default = Self::default();

        if other.realm != default.realm {
            self.realm.clone_from(&other.realm);
        }
        if other.default_context != default.default_context {
            self.default_context.clone_from(&other.default_context);
        }
        if other.default_namespace != default.default_namespace {
            self.default_namespace.clone_from(&other.default_namespace);
        }
        if other.version != default.version {
            self.version.clone_from(&other.version);
        }

        self.urls.merge(&other.urls);
        self.payload.merge(&other.payload);
        self.security.merge(&other.security);
    }

    /// Checks invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSetting`] for an empty realm or a
    /// payload global that is not a plain identifier.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.realm.trim().is_empty() {
            return Err(ConfigError::invalid_setting("realm", "must not be empty"));
        }
        if !is_identifier(&self.payload.global) {
            return Err(ConfigError::invalid_setting(
                "payload.global",
                format!("'{}' is not a script identifier", self.payload.global),
            ));
        }
        Ok(())
    }
}

/// Returns `true` for `[A-Za-z_$][A-Za-z0-9_$]*`.
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Fallback URLs used when neither the user nor the context sets them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UrlConfig {
    /// Site base path.
    pub base_url: String,
    /// Connector endpoint path.
    pub connectors_url: String,
    /// Manager path.
    pub manager_url: String,
    /// Absolute site URL.
    pub site_url: String,
    /// Host name.
    pub http_host: String,
    /// Scheme prefix for `http_host_remote`.
    pub url_scheme: String,
    /// Manager theme directory under `templates/`.
    pub manager_theme: String,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            base_url: "/".into(),
            connectors_url: "/connectors/".into(),
            manager_url: "/manager/".into(),
            site_url: "http://localhost/".into(),
            http_host: "localhost".into(),
            url_scheme: "http://".into(),
            manager_theme: "default".into(),
        }
    }
}

impl UrlConfig {
    fn merge(&mut self, other: &Self) {
        let default = Self::default();

        macro_rules! take {
            ($field:ident) => {
                if other.$field != default.$field {
                    self.$field.clone_from(&other.$field);
                }
            };
        }

        take!(base_url);
        take!(connectors_url);
        take!(manager_url);
        take!(site_url);
        take!(http_host);
        take!(url_scheme);
        take!(manager_theme);
    }
}

/// Script payload settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PayloadConfig {
    /// Client-side global object that receives `config`, `perm`, `action`, `user`.
    pub global: String,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            global: "Keel".into(),
        }
    }
}

impl PayloadConfig {
    fn merge(&mut self, other: &Self) {
        if other.global != Self::default().global {
            self.global.clone_from(&other.global);
        }
    }
}

/// Security filter settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Keys stripped in addition to the built-in deny list.
    ///
    /// Layers can only add keys: the built-in list is not configurable.
    pub extra_sensitive_keys: Vec<String>,
}

impl SecurityConfig {
    fn merge(&mut self, other: &Self) {
        for key in &other.extra_sensitive_keys {
            if !self.extra_sensitive_keys.contains(key) {
                self.extra_sensitive_keys.push(key.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_partial_toml_keeps_defaults() {
        let config = KeelConfig::from_toml(
            r#"
default_context = "site"

[urls]
site_url = "https://example.org/"
"#,
        )
        .expect("parse");

        assert_eq!(config.default_context, "site");
        assert_eq!(config.realm, "mgr");
        assert_eq!(config.urls.site_url, "https://example.org/");
        assert_eq!(config.urls.manager_url, "/manager/");
    }

    #[test]
    fn merge_only_overrides_non_defaults() {
        let mut base = KeelConfig::default();
        base.realm = "admin".into();
        base.urls.http_host = "base.example".into();

        let mut overlay = KeelConfig::default();
        overlay.urls.http_host = "overlay.example".into();

        base.merge(&overlay);

        assert_eq!(base.realm, "admin");
        assert_eq!(base.urls.http_host, "overlay.example");
    }

    #[test]
    fn extra_sensitive_keys_accumulate() {
        let mut base = KeelConfig::default();
        base.security.extra_sensitive_keys = vec!["a".into()];

        let mut overlay = KeelConfig::default();
        overlay.security.extra_sensitive_keys = vec!["a".into(), "b".into()];

        base.merge(&overlay);
        assert_eq!(base.security.extra_sensitive_keys, vec!["a", "b"]);
    }

    #[test]
    fn validate_rejects_bad_global() {
        let mut config = KeelConfig::default();
        assert!(config.validate().is_ok());

        config.payload.global = "window.alert(1)".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn validate_rejects_empty_realm() {
        let mut config = KeelConfig::default();
        config.realm = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn identifier_detection() {
        assert!(is_identifier("Keel"));
        assert!(is_identifier("_app$1"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a.b"));
    }
}
