//! Process settings with hierarchical layering.
//!
//! [`KeelConfig`] carries the values the bootstrap treats as process-wide
//! constants (fallback URLs, realm, default context, version) plus the
//! payload and security knobs. It is not the option data that gets merged
//! into the payload; that comes from the system, context and user layers
//! (see [`crate::options`]).
//!
//! # Load Order
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌─────────────────────────────────────────┐
//! │  1. ConfigResolver overrides (CLI)      │
//! ├─────────────────────────────────────────┤
//! │  2. Environment Variables (KEEL_*)      │
//! ├─────────────────────────────────────────┤
//! │  3. Project Config (.keel/config.toml)  │
//! ├─────────────────────────────────────────┤
//! │  4. Global Config (~/.keel/config.toml) │
//! ├─────────────────────────────────────────┤
//! │  5. Default Values (compile-time)       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field |
//! |----------|--------------|
//! | `KEEL_REALM` | `realm` |
//! | `KEEL_DEFAULT_CONTEXT` | `default_context` |
//! | `KEEL_DEFAULT_NAMESPACE` | `default_namespace` |
//! | `KEEL_SITE_URL` | `urls.site_url` |
//! | `KEEL_MANAGER_URL` | `urls.manager_url` |
//! | `KEEL_HTTP_HOST` | `urls.http_host` |
//!
//! # Example Configuration
//!
//! ```toml
//! realm = "mgr"
//! default_context = "web"
//!
//! [urls]
//! site_url = "https://example.org/"
//! manager_theme = "default"
//!
//! [security]
//! extra_sensitive_keys = ["smtp_api_token"]
//! ```

mod error;
mod loader;
mod resolver;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use resolver::{ConfigResolver, NoOpResolver};
pub use types::{KeelConfig, PayloadConfig, SecurityConfig, UrlConfig};
pub(crate) use types::is_identifier;

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".keel")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".keel";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
