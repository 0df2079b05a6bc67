//! Parser warnings routed through `tracing`.
//!
//! Provides deduplication to avoid spamming the same warning multiple times.
//! Each parse call owns its own [`Warnings`] value, so concurrent parses
//! never share state.

use std::collections::HashSet;

/// Set of warnings already emitted during one call.
#[derive(Debug, Default)]
pub struct Warnings {
    seen: HashSet<String>,
}

impl Warnings {
    /// Create an empty warning set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Warn about a condition (logs once per unique message).
    ///
    /// # Example
    /// ```
    /// let mut warnings = quire_common::Warnings::new();
    /// warnings.warn_once("encoding", "unknown label 'x-foo'");
    /// warnings.warn_once("encoding", "unknown label 'x-foo'");
    /// assert_eq!(warnings.len(), 1);
    /// ```
    pub fn warn_once(&mut self, component: &str, message: &str) {
        let key = format!("[{component}] {message}");
        if self.seen.insert(key) {
            tracing::warn!(component, "{message}");
        }
    }

    /// Number of distinct warnings logged so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no warning has been logged yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
