//! Recipient locale resolution via the external user directory.

use std::collections::HashMap;

/// Lookup seam to whatever stores per-user locale preferences.
///
/// The dispatcher resolves every distinct recipient exactly once per flush;
/// implementations are free to batch the lookup however suits their backend.
pub trait UserDirectory {
    /// Resolve each address to its stored locale preference. An address that
    /// is unknown, or known but without a preference, maps to `None`.
    fn locales_for(&self, addresses: &[String]) -> HashMap<String, Option<String>>;
}

/// In-memory directory backed by a plain map. The smallest useful
/// implementation, also the test double.
#[derive(Debug, Default, Clone)]
pub struct MapDirectory {
    locales: HashMap<String, String>,
}

impl MapDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a locale preference for an address.
    pub fn insert(&mut self, address: &str, locale: &str) {
        self.locales.insert(address.to_string(), locale.to_string());
    }
}

impl UserDirectory for MapDirectory {
    fn locales_for(&self, addresses: &[String]) -> HashMap<String, Option<String>> {
        addresses
            .iter()
            .map(|a| (a.clone(), self.locales.get(a).cloned()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_addresses() {
        let mut directory = MapDirectory::new();
        directory.insert("alice@example.com", "de-DE");

        let resolved = directory.locales_for(&[
            "alice@example.com".to_string(),
            "bob@example.com".to_string(),
        ]);
        assert_eq!(
            resolved.get("alice@example.com"),
            Some(&Some("de-DE".to_string()))
        );
        assert_eq!(resolved.get("bob@example.com"), Some(&None));
    }
}
