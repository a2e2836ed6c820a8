//! Configuration loader with hierarchical merging.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Global config (`~/.keel/config.toml`)
//! 3. Project config (`<root>/.keel/config.toml`)
//! 4. Environment variables (`KEEL_*`)
//!
//! Each layer overrides the previous. The merged result is validated
//! before it is returned.

use super::{default_config_path, ConfigError, KeelConfig, PROJECT_CONFIG_DIR, PROJECT_CONFIG_FILE};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads a non-empty string environment variable into a field.
macro_rules! env_string {
    ($field:expr, $var:literal) => {
        if let Ok(val) = std::env::var($var) {
            if val.trim().is_empty() {
                return Err(ConfigError::invalid_env_var($var, "must not be empty"));
            }
            $field = val;
        }
    };
}

/// Configuration loader with builder pattern.
///
/// ```ignore
/// use keel_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_project_root("/srv/site")
///     .skip_env_vars()
///     .load()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Global config file path (defaults to ~/.keel/config.toml).
    global_config_path: Option<PathBuf>,

    /// Project root directory.
    project_root: Option<PathBuf>,

    skip_env: bool,
    skip_global: bool,
    skip_project: bool,
}

impl ConfigLoader {
    /// Creates a new loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom global config path.
    #[must_use]
    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Sets the project root directory.
    ///
    /// Project config will be loaded from `<project_root>/.keel/config.toml`.
    #[must_use]
    pub fn with_project_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_root = Some(path.into());
        self
    }

    /// Skips environment variable loading.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Skips global config loading.
    #[must_use]
    pub fn skip_global_config(mut self) -> Self {
        self.skip_global = true;
        self
    }

    /// Skips project config loading.
    #[must_use]
    pub fn skip_project_config(mut self) -> Self {
        self.skip_project = true;
        self
    }

    /// Loads, merges and validates configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a config file exists but cannot be read or
    /// parsed, if an environment variable is invalid, or if the merged
    /// result fails [`KeelConfig::validate`]. Missing files are ignored.
    pub fn load(&self) -> Result<KeelConfig, ConfigError> {
        let mut config = KeelConfig::default();

        if !self.skip_global {
            let global_path = self
                .global_config_path
                .clone()
                .unwrap_or_else(default_config_path);

            if let Some(global_config) = self.load_file(&global_path)? {
                debug!(path = %global_path.display(), "Loaded global config");
                config.merge(&global_config);
            }
        }

        if !self.skip_project {
            if let Some(ref project_root) = self.project_root {
                let project_config_path = project_root
                    .join(PROJECT_CONFIG_DIR)
                    .join(PROJECT_CONFIG_FILE);

                if let Some(project_config) = self.load_file(&project_config_path)? {
                    debug!(path = %project_config_path.display(), "Loaded project config");
                    config.merge(&project_config);
                }
            }
        }

        if !self.skip_env {
            self.apply_env_vars(&mut config)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn load_file(&self, path: &Path) -> Result<Option<KeelConfig>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config =
            KeelConfig::from_toml(&content).map_err(|e| ConfigError::parse_toml(path, e))?;

        Ok(Some(config))
    }

    fn apply_env_vars(&self, config: &mut KeelConfig) -> Result<(), ConfigError> {
        env_string!(config.realm, "KEEL_REALM");
        env_string!(config.default_context, "KEEL_DEFAULT_CONTEXT");
        env_string!(config.default_namespace, "KEEL_DEFAULT_NAMESPACE");
        env_string!(config.urls.site_url, "KEEL_SITE_URL");
        env_string!(config.urls.manager_url, "KEEL_MANAGER_URL");
        env_string!(config.urls.http_host, "KEEL_HTTP_HOST");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn load_defaults_only() {
        let config = ConfigLoader::new()
            .skip_global_config()
            .skip_project_config()
            .skip_env_vars()
            .load()
            .unwrap();

        assert_eq!(config, KeelConfig::default());
    }

    #[test]
    fn load_global_config() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            r#"
default_context = "site"

[urls]
http_host = "global.example"
"#,
        );

        let config = ConfigLoader::new()
            .with_global_config(&path)
            .skip_project_config()
            .skip_env_vars()
            .load()
            .unwrap();

        assert_eq!(config.default_context, "site");
        assert_eq!(config.urls.http_host, "global.example");
    }

    #[test]
    fn project_overrides_global() {
        let global_temp = TempDir::new().unwrap();
        let project_temp = TempDir::new().unwrap();

        let keel_dir = project_temp.path().join(PROJECT_CONFIG_DIR);
        std::fs::create_dir_all(&keel_dir).unwrap();

        let global_path = write_config(
            global_temp.path(),
            r#"
default_context = "site"

[urls]
http_host = "global.example"
"#,
        );
        write_config(
            &keel_dir,
            r#"
[urls]
http_host = "project.example"
"#,
        );

        let config = ConfigLoader::new()
            .with_global_config(&global_path)
            .with_project_root(project_temp.path())
            .skip_env_vars()
            .load()
            .unwrap();

        assert_eq!(config.default_context, "site");
        assert_eq!(config.urls.http_host, "project.example");
    }

    #[test]
    fn missing_config_files_ok() {
        let config = ConfigLoader::new()
            .with_global_config("/nonexistent/keel/config.toml")
            .with_project_root("/nonexistent/project")
            .skip_env_vars()
            .load()
            .unwrap();

        assert_eq!(config, KeelConfig::default());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "realm = [not toml");

        let err = ConfigLoader::new()
            .with_global_config(&path)
            .skip_project_config()
            .skip_env_vars()
            .load()
            .unwrap_err();

        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }

    #[test]
    fn invalid_merged_config_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            r#"
[payload]
global = "not an identifier"
"#,
        );

        let err = ConfigLoader::new()
            .with_global_config(&path)
            .skip_project_config()
            .skip_env_vars()
            .load()
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidSetting { .. }));
    }

    #[test]
    fn env_var_override() {
        // mutates process env; the variable is unique to this test
        std::env::set_var("KEEL_DEFAULT_NAMESPACE", "blog");

        let config = ConfigLoader::new()
            .skip_global_config()
            .skip_project_config()
            .load()
            .unwrap();

        std::env::remove_var("KEEL_DEFAULT_NAMESPACE");

        assert_eq!(config.default_namespace, "blog");
    }
}
