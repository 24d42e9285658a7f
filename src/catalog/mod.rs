//! Per-locale catalog representation, caching, and scoped activation.
//!
//! A catalog is the translation dictionary for one (domain, locale) pair.
//! Two special cases need no file on disk: the reference locale is an
//! identity dictionary, and the locale the site is currently rendering in is
//! seeded from the template/rendering pairs observed during the cycle.
//!
//! The "currently active" locale and per-domain catalog are shared mutable
//! state. Reconstruction temporarily swaps them and the prior state must be
//! restored on every exit path, so the swap hands out a guard whose `Drop`
//! puts everything back.

pub mod loader;

use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Template -> translation map for one locale.
pub type Dictionary = HashMap<String, String>;

/// A loaded translation dictionary for one (domain, locale) pair.
#[derive(Debug, Clone)]
pub enum Catalog {
    /// Reference-locale dictionary: every lookup returns its input.
    Identity,
    /// Dictionary loaded from a catalog file or seeded from observed renders.
    Loaded(Dictionary),
}

impl Catalog {
    /// Translate a template, falling back to the untranslated text when the
    /// catalog has no entry for it.
    #[must_use]
    pub fn lookup<'a>(&'a self, original: &'a str) -> &'a str {
        match self {
            Self::Identity => original,
            Self::Loaded(map) => map.get(original).map_or(original, String::as_str),
        }
    }
}

/// What: Cache of loaded catalogs keyed by (domain, locale).
///
/// Details:
/// - A catalog is loaded at most once per pair; load failures are also
///   remembered so a missing file is probed only once per cycle.
/// - The reference locale materializes as `Catalog::Identity` without any
///   file access.
#[derive(Debug, Default)]
pub struct CatalogCache {
    loaded: HashMap<(String, String), Catalog>,
    failed: HashSet<(String, String)>,
}

impl CatalogCache {
    /// Pre-install a catalog for (domain, locale) without touching disk.
    /// An already cached entry is kept.
    pub fn seed(&mut self, domain: &str, locale: &str, catalog: Catalog) {
        self.loaded
            .entry((domain.to_string(), locale.to_string()))
            .or_insert(catalog);
    }

    /// What: Fetch the catalog for (domain, locale), loading it on first use.
    ///
    /// Inputs:
    /// - `domain`: Text domain name
    /// - `locale`: Requested locale code
    /// - `default_locale`: The reference locale (identity dictionary)
    /// - `reference`: The domain's recorded reference catalog path, if any
    ///
    /// Output:
    /// - `Some(&Catalog)` when available, `None` when no candidate file could
    ///   be loaded (remembered for the rest of the cycle)
    pub fn acquire(
        &mut self,
        domain: &str,
        locale: &str,
        default_locale: &str,
        reference: Option<&Path>,
    ) -> Option<&Catalog> {
        let key = (domain.to_string(), locale.to_string());
        if locale == default_locale {
            return Some(self.loaded.entry(key).or_insert(Catalog::Identity));
        }
        if self.failed.contains(&key) {
            return None;
        }
        if self.loaded.contains_key(&key) {
            return self.loaded.get(&key);
        }
        match loader::load_first_available(reference, domain, locale) {
            Ok(dict) => Some(self.loaded.entry(key).or_insert(Catalog::Loaded(dict))),
            Err(reason) => {
                tracing::warn!(
                    domain,
                    locale,
                    reason = %reason,
                    "catalog unavailable; affected text will pass through unmodified"
                );
                self.failed.insert(key);
                None
            }
        }
    }

    /// Whether a catalog is already cached for (domain, locale).
    #[must_use]
    pub fn contains(&self, domain: &str, locale: &str) -> bool {
        self.loaded
            .contains_key(&(domain.to_string(), locale.to_string()))
    }
}

/// The currently active locale and the active catalog per domain.
#[derive(Debug)]
pub struct ActiveState {
    locale: String,
    catalogs: HashMap<String, Catalog>,
}

impl ActiveState {
    /// Create the active state with the given site locale and no catalogs.
    #[must_use]
    pub fn new(locale: String) -> Self {
        Self {
            locale,
            catalogs: HashMap::new(),
        }
    }

    /// The locale the state is currently set to.
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Set the active locale directly (host-driven, outside any swap).
    pub fn set_locale(&mut self, locale: &str) {
        self.locale = locale.to_string();
    }

    /// What: Temporarily activate a catalog for a domain.
    ///
    /// Inputs:
    /// - `domain`: Text domain name
    /// - `locale`: Locale to activate
    /// - `catalog`: Catalog to install for the domain
    ///
    /// Output:
    /// - A guard exposing the active catalog; dropping it restores the prior
    ///   locale and the domain's prior catalog, on every exit path
    pub fn swap(&mut self, domain: &str, locale: &str, catalog: Catalog) -> ActiveSwap<'_> {
        let prior_locale = std::mem::replace(&mut self.locale, locale.to_string());
        let prior_catalog = self.catalogs.insert(domain.to_string(), catalog);
        ActiveSwap {
            domain: domain.to_string(),
            prior_locale,
            prior_catalog,
            state: self,
        }
    }
}

/// Guard over a temporary catalog activation. Restores the prior active
/// locale and catalog when dropped.
#[derive(Debug)]
pub struct ActiveSwap<'a> {
    domain: String,
    prior_locale: String,
    prior_catalog: Option<Catalog>,
    state: &'a mut ActiveState,
}

impl ActiveSwap<'_> {
    /// The catalog activated by this swap.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        self.state
            .catalogs
            .get(&self.domain)
            .expect("swapped-in catalog present while guard is alive")
    }
}

impl Drop for ActiveSwap<'_> {
    fn drop(&mut self) {
        self.state.locale = std::mem::take(&mut self.prior_locale);
        match self.prior_catalog.take() {
            Some(catalog) => {
                self.state.catalogs.insert(self.domain.clone(), catalog);
            }
            None => {
                self.state.catalogs.remove(&self.domain);
            }
        }
    }
}
