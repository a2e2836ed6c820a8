//! Last-word overrides on top of loaded settings.
//!
//! The loader handles files and `KEEL_*` variables; anything the caller
//! knows better (command-line flags, an embedding host) goes through a
//! [`ConfigResolver`] afterwards:
//!
//! ```text
//! ConfigLoader::load() ─► KeelConfig ─► resolver.apply(&mut cfg) ─► validate()
//! ```

use super::KeelConfig;

/// Overrides applied after loading.
///
/// Implementations should touch only the fields they were given a value for.
pub trait ConfigResolver {
    fn apply(&self, config: &mut KeelConfig);
}

/// Leaves the settings as loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpResolver;

impl ConfigResolver for NoOpResolver {
    fn apply(&self, _config: &mut KeelConfig) {}
}
