//! Localized message lookup.

use std::collections::HashMap;

/// Lexicon key of the message shown for a refused context.
pub const PERMISSION_DENIED: &str = "permission_denied";

/// Translation lookup consumed by the bootstrap.
pub trait Lexicon: Send + Sync {
    /// Returns the localized text for `key`.
    ///
    /// Unknown keys come back unchanged so that a missing translation is
    /// visible but never fatal.
    fn text(&self, key: &str) -> String;
}

/// Fixed key → text table.
///
/// ```
/// use keel_runtime::lexicon::{Lexicon, StaticLexicon, PERMISSION_DENIED};
///
/// let lexicon = StaticLexicon::default().with_entry(PERMISSION_DENIED, "Zugriff verweigert");
/// assert_eq!(lexicon.text(PERMISSION_DENIED), "Zugriff verweigert");
/// assert_eq!(lexicon.text("unknown_key"), "unknown_key");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticLexicon {
    entries: HashMap<String, String>,
}

impl StaticLexicon {
    /// Creates a lexicon with the built-in English defaults.
    #[must_use]
    pub fn english() -> Self {
        Self::default().with_entry(PERMISSION_DENIED, "Permission denied!")
    }

    /// Adds or replaces an entry.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.entries.insert(key.into(), text.into());
        self
    }
}

impl Lexicon for StaticLexicon {
    fn text(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for StaticLexicon {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.entries
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}
