//! Removal of security-sensitive keys from the merged configuration.
//!
//! The deny list is compiled in and closed. Deployments may add keys
//! through `[security] extra_sensitive_keys` but can never remove one.
//! [`SecurityFilter::apply`] runs after every merge step and is the only
//! way to obtain a [`SanitizedConfig`], which is the only config type the
//! payload renderer accepts.

use crate::options::ConfigLayer;
use keel_types::ErrorCode;
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, error};

/// Keys that never leave the process: credentials, connection
/// parameters, internal filesystem paths, the session cookie name.
pub const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "username",
    "mail_smtp_pass",
    "mail_smtp_user",
    "proxy_password",
    "proxy_username",
    "connections",
    "connection_init",
    "connection_mutable",
    "dbname",
    "database",
    "table_prefix",
    "driverOptions",
    "dsn",
    "session_name",
    "assets_path",
    "base_path",
    "cache_path",
    "connectors_path",
    "core_path",
    "friendly_alias_translit_class_path",
    "manager_path",
    "processors_path",
];

/// Filter failures. Any of them blocks the payload.
#[derive(Debug, Error)]
pub enum FilterError {
    /// An extra deny-list entry was blank.
    #[error("invalid sensitive key: {0:?}")]
    InvalidKey(String),

    /// A deny-listed key survived removal.
    #[error("sensitive key '{0}' survived filtering")]
    Leaked(String),
}

impl ErrorCode for FilterError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidKey(_) => "FILTER_INVALID_KEY",
            Self::Leaked(_) => "FILTER_LEAKED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// A configuration mapping with every sensitive key removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SanitizedConfig(ConfigLayer);

impl SanitizedConfig {
    #[must_use]
    pub fn as_layer(&self) -> &ConfigLayer {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> ConfigLayer {
        self.0
    }
}

/// Deny-list filter over a merged [`ConfigLayer`].
///
/// ```
/// use keel_runtime::filter::SecurityFilter;
/// use keel_runtime::options::ConfigLayer;
///
/// let filter = SecurityFilter::new();
/// let merged: ConfigLayer = [("site_name", "Demo"), ("password", "hunter2")].into_iter().collect();
///
/// let clean = filter.apply(merged).unwrap();
/// assert!(clean.as_layer().contains_key("site_name"));
/// assert!(!clean.as_layer().contains_key("password"));
/// ```
#[derive(Debug, Clone)]
pub struct SecurityFilter {
    keys: BTreeSet<String>,
}

impl Default for SecurityFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityFilter {
    /// Filter over [`SENSITIVE_KEYS`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: SENSITIVE_KEYS.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    /// Filter over [`SENSITIVE_KEYS`] plus `extra`.
    ///
    /// # Errors
    ///
    /// [`FilterError::InvalidKey`] for a blank entry.
    pub fn with_extra_keys<I, S>(extra: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::new();
        for key in extra {
            let key = key.as_ref();
            if key.trim().is_empty() {
                return Err(FilterError::InvalidKey(key.to_string()));
            }
            filter.keys.insert(key.to_string());
        }
        Ok(filter)
    }

    /// Returns `true` if `key` is deny-listed.
    #[must_use]
    pub fn is_sensitive(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Number of deny-listed keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Removes every deny-listed key from `merged`.
    ///
    /// # Errors
    ///
    /// [`FilterError::Leaked`] if a deny-listed key is still present after
    /// removal.
    pub fn apply(&self, mut merged: ConfigLayer) -> Result<SanitizedConfig, FilterError> {
        let mut removed = 0usize;
        for key in &self.keys {
            if merged.remove(key).is_some() {
                removed += 1;
            }
        }

        if let Some(leaked) = merged.keys().find(|k| self.is_sensitive(k)) {
            error!(key = %leaked, "Sensitive key survived filtering");
            return Err(FilterError::Leaked(leaked.clone()));
        }

        debug!(removed, remaining = merged.len(), "Config sanitized");
        Ok(SanitizedConfig(merged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_types::assert_error_codes;
    use serde_json::json;

    #[test]
    fn removes_every_builtin_key() {
        let merged: ConfigLayer = SENSITIVE_KEYS
            .iter()
            .map(|k| (*k, json!("secret")))
            .chain([("site_name", json!("Demo"))])
            .collect();

        let clean = SecurityFilter::new().apply(merged).unwrap();
        assert_eq!(clean.as_layer().len(), 1);
        assert_eq!(clean.as_layer().get_str("site_name"), Some("Demo"));
    }

    #[test]
    fn absent_keys_are_fine() {
        let merged: ConfigLayer = [("a", 1)].into_iter().collect();
        let clean = SecurityFilter::new().apply(merged).unwrap();
        assert_eq!(clean.as_layer().len(), 1);
    }

    #[test]
    fn extra_keys_extend_the_list() {
        let filter = SecurityFilter::with_extra_keys(["smtp_relay_token"]).unwrap();
        assert_eq!(filter.len(), SENSITIVE_KEYS.len() + 1);
        assert!(filter.is_sensitive("password"));

        let merged: ConfigLayer = [("smtp_relay_token", "t"), ("x", "y")].into_iter().collect();
        let clean = filter.apply(merged).unwrap();
        assert!(!clean.as_layer().contains_key("smtp_relay_token"));
    }

    #[test]
    fn blank_extra_key_rejected() {
        let err = SecurityFilter::with_extra_keys(["ok", "  "]).unwrap_err();
        assert!(matches!(err, FilterError::InvalidKey(_)));
    }

    #[test]
    fn matching_is_exact() {
        let merged: ConfigLayer = [("Password", "x"), ("password_hint", "y")].into_iter().collect();
        let clean = SecurityFilter::new().apply(merged).unwrap();
        assert_eq!(clean.as_layer().len(), 2);
    }

    #[test]
    fn error_codes() {
        assert_error_codes(
            &[
                FilterError::InvalidKey(String::new()),
                FilterError::Leaked("dsn".into()),
            ],
            "FILTER_",
        );
    }

    mod proptest_filter {
        use super::*;
        use proptest::prelude::*;

        /// Strategy: a mix of deny-listed names and arbitrary option names
        fn key_strategy() -> impl Strategy<Value = String> {
            prop_oneof![
                prop::sample::select(SENSITIVE_KEYS).prop_map(str::to_string),
                prop::string::string_regex("[a-zA-Z_]{1,24}")
                    .expect("regex should be valid for key strategy"),
            ]
        }

        proptest! {
            /// No sensitive key survives, whatever the input holds
            #[test]
            fn output_has_no_sensitive_keys(keys in prop::collection::vec(key_strategy(), 0..64)) {
                let merged: ConfigLayer = keys.iter().map(|k| (k.as_str(), "v")).collect();
                let clean = SecurityFilter::new().apply(merged).unwrap();
                for key in clean.as_layer().keys() {
                    prop_assert!(!SENSITIVE_KEYS.contains(&key.as_str()), "leaked {}", key);
                }
            }

            /// Non-sensitive keys are kept
            #[test]
            fn other_keys_survive(keys in prop::collection::vec(key_strategy(), 0..64)) {
                let merged: ConfigLayer = keys.iter().map(|k| (k.as_str(), "v")).collect();
                let clean = SecurityFilter::new().apply(merged).unwrap();
                for key in keys.iter().filter(|k| !SENSITIVE_KEYS.contains(&k.as_str())) {
                    prop_assert!(clean.as_layer().contains_key(key));
                }
            }
        }
    }
}
