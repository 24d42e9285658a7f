//! The reconstruction engine: registration, render observation, and fragment
//! reconstruction.
//!
//! The engine never sees a template together with its arguments. It watches
//! finished renderings go by, remembers which template produced which text,
//! and later treats a finished piece of text as evidence: it infers the
//! template, extracts the substituted values, and re-renders through another
//! locale's catalog.

use std::path::PathBuf;

use crate::cache::RetranslationCache;
use crate::catalog::{ActiveState, Catalog, CatalogCache};
use crate::config::EngineConfig;
use crate::domain::TextDomain;
use crate::error::EngineError;
use crate::pattern;
use crate::urls;

/// Upper bound on reconstruction passes over one fragment. Concatenated
/// fragments converge long before this; the cap exists so a pathological
/// catalog (one whose translation re-matches its own pattern) cannot loop.
const MAX_PASSES: usize = 10;

/// The translation reconstruction engine.
///
/// One long-lived instance serves a whole render/dispatch cycle. All methods
/// take `&mut self`; the pipeline is single-threaded and synchronous.
pub struct Engine {
    config: EngineConfig,
    domains: Vec<TextDomain>,
    url_paths: Vec<String>,
    active: ActiveState,
    catalogs: CatalogCache,
    fragments: RetranslationCache,
    match_attempts: usize,
}

impl Engine {
    /// Create an engine. The active locale starts at the configured default
    /// and can be adjusted with [`Self::set_active_locale`] when the site
    /// renders in another language.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let active = ActiveState::new(config.default_locale.clone());
        Self {
            config,
            domains: Vec::new(),
            url_paths: Vec::new(),
            active,
            catalogs: CatalogCache::default(),
            fragments: RetranslationCache::new(),
            match_attempts: 0,
        }
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The locale the site is currently rendering in.
    #[must_use]
    pub fn active_locale(&self) -> &str {
        self.active.locale()
    }

    /// Tell the engine which locale the site is currently rendering in.
    pub fn set_active_locale(&mut self, locale: &str) {
        self.active.set_locale(locale);
    }

    /// What: Register a text domain for reconstruction.
    ///
    /// Inputs:
    /// - `domain`: Text domain name to monitor
    /// - `url_paths`: Site path prefixes whose URLs should be re-localized
    ///   inside reconstructed text (e.g., `"/forums/"`)
    /// - `priority_strings`: Templates to match before anything else
    ///
    /// Details:
    /// - Idempotent per domain; paths and priority strings accumulate across
    ///   repeated calls.
    /// - Registering a priority string only affects templates observed after
    ///   the call.
    pub fn register(&mut self, domain: &str, url_paths: &[&str], priority_strings: &[&str]) {
        if !self.domains.iter().any(|d| d.name() == domain) {
            self.domains.push(TextDomain::new(domain));
            tracing::debug!(domain, "registered text domain");
        }
        if let Some(d) = self.domains.iter_mut().find(|d| d.name() == domain) {
            for s in priority_strings {
                d.add_priority(s);
            }
        }
        for p in url_paths {
            let normalized = if p.starts_with('/') {
                urls::trailingslashit(p)
            } else {
                urls::trailingslashit(&format!("/{p}"))
            };
            if !self.url_paths.contains(&normalized) {
                self.url_paths.push(normalized);
            }
        }
    }

    /// Whether a domain has been registered.
    #[must_use]
    pub fn is_registered(&self, domain: &str) -> bool {
        self.domains.iter().any(|d| d.name() == domain)
    }

    /// Registered domain names in registration order.
    #[must_use]
    pub fn domain_names(&self) -> Vec<String> {
        self.domains.iter().map(|d| d.name().to_string()).collect()
    }

    /// What: Record one template rendering ("template rendered" hook).
    ///
    /// Inputs:
    /// - `domain`: Text domain the rendering belongs to
    /// - `original`: Untranslated template text
    /// - `rendered`: The translated rendering just produced
    ///
    /// Details:
    /// - Observations for unregistered domains are ignored; recording is
    ///   opt-in per domain.
    pub fn observe(&mut self, domain: &str, original: &str, rendered: &str) {
        if let Some(d) = self.domains.iter_mut().find(|d| d.name() == domain) {
            d.observe(original, rendered);
        } else {
            tracing::trace!(domain, "render observed for unregistered domain; ignoring");
        }
    }

    /// Remember the reference catalog file for a domain ("catalog loaded"
    /// hook). Target-locale candidate files are derived from this location.
    pub fn record_catalog_file(&mut self, domain: &str, path: PathBuf) {
        if let Some(d) = self.domains.iter_mut().find(|d| d.name() == domain) {
            d.set_catalog_file(path);
        }
    }

    /// Pre-install a catalog for (domain, locale) without any file access.
    /// Useful when the embedder already holds a dictionary in memory.
    ///
    /// # Errors
    /// - Returns [`EngineError::UnregisteredDomain`] for an unknown domain
    pub fn seed_catalog(
        &mut self,
        domain: &str,
        locale: &str,
        dictionary: crate::catalog::Dictionary,
    ) -> Result<(), EngineError> {
        if !self.is_registered(domain) {
            return Err(EngineError::UnregisteredDomain(domain.to_string()));
        }
        self.catalogs.seed(domain, locale, Catalog::Loaded(dictionary));
        Ok(())
    }

    /// What: Check that a catalog can be produced for (domain, locale).
    ///
    /// Output:
    /// - `Ok(())` when the catalog is cached or loads now
    ///
    /// # Errors
    /// - Returns [`EngineError::UnregisteredDomain`] for an unknown domain
    /// - Returns [`EngineError::CatalogUnavailable`] when no candidate
    ///   catalog file could be loaded
    pub fn ensure_catalog(&mut self, domain: &str, locale: &str) -> Result<(), EngineError> {
        let Some(idx) = self.domain_index(domain) else {
            return Err(EngineError::UnregisteredDomain(domain.to_string()));
        };
        let d = &self.domains[idx];
        if self
            .catalogs
            .acquire(
                d.name(),
                locale,
                &self.config.default_locale,
                d.catalog_file(),
            )
            .is_some()
        {
            Ok(())
        } else {
            Err(EngineError::CatalogUnavailable {
                domain: domain.to_string(),
                locale: locale.to_string(),
                reason: "no candidate catalog file could be loaded".to_string(),
            })
        }
    }

    /// Seed the catalog cache for the active locale from every domain's
    /// observed dictionary, so reconstruction back into the original locale
    /// needs no file load. Called by the dispatcher at flush time.
    pub fn seed_observed_catalogs(&mut self) {
        let locale = self.active.locale().to_string();
        for d in &self.domains {
            self.catalogs
                .seed(d.name(), &locale, Catalog::Loaded(d.observed().clone()));
        }
    }

    /// Number of pattern match attempts performed so far. Instrumentation
    /// for cache behavior; a cached reconstruction adds nothing here.
    #[must_use]
    pub fn match_attempts(&self) -> usize {
        self.match_attempts
    }

    /// What: Reconstruct a fragment into another locale.
    ///
    /// Inputs:
    /// - `fragment`: Any span of rendered text
    /// - `domain`: Registered text domain to match against
    /// - `target_locale`: Locale to re-render into
    ///
    /// Output:
    /// - The re-rendered text, or the fragment unchanged when nothing
    ///   matched (the common case for free text) or when the target-locale
    ///   catalog is unavailable
    ///
    /// Details:
    /// - Returns the fragment as-is when `target_locale` is already the
    ///   active locale.
    /// - Results are memoized per (domain, locale, fragment); unchanged
    ///   results are not cached.
    ///
    /// # Errors
    /// - Returns [`EngineError::UnregisteredDomain`] for an unknown domain;
    ///   a misspelled domain is a bug in the caller, not a soft miss
    pub fn reconstruct(
        &mut self,
        fragment: &str,
        domain: &str,
        target_locale: &str,
    ) -> Result<String, EngineError> {
        let Some(idx) = self.domain_index(domain) else {
            return Err(EngineError::UnregisteredDomain(domain.to_string()));
        };

        if target_locale == self.active.locale() {
            return Ok(fragment.to_string());
        }

        if let Some(hit) = self.fragments.get(domain, target_locale, fragment) {
            tracing::debug!(domain, locale = target_locale, "retranslation cache hit");
            return Ok(hit);
        }

        let reconstructed = self.reconstruct_recursive(fragment, idx, target_locale, 0);
        if reconstructed != fragment {
            self.fragments
                .put(domain, target_locale, fragment, &reconstructed);
        }
        Ok(reconstructed)
    }

    fn domain_index(&self, domain: &str) -> Option<usize> {
        self.domains.iter().position(|d| d.name() == domain)
    }

    /// One matching pass plus recursion on change. Each successful match
    /// replaces exactly the matched span; a pass that produces byte-identical
    /// output counts as no change and the walk continues with the next
    /// pattern.
    fn reconstruct_recursive(
        &mut self,
        fragment: &str,
        idx: usize,
        target_locale: &str,
        depth: usize,
    ) -> String {
        if depth >= MAX_PASSES {
            tracing::warn!(
                domain = self.domains[idx].name(),
                locale = target_locale,
                "reconstruction pass limit reached; stopping"
            );
            return fragment.to_string();
        }

        // Catalog absence behaves like "no pattern matched": the fragment
        // passes through unmodified.
        let catalog = {
            let d = &self.domains[idx];
            match self.catalogs.acquire(
                d.name(),
                target_locale,
                &self.config.default_locale,
                d.catalog_file(),
            ) {
                Some(c) => c.clone(),
                None => return fragment.to_string(),
            }
        };

        let domain_name = self.domains[idx].name().to_string();
        let swap = self.active.swap(&domain_name, target_locale, catalog);

        let mut next: Option<String> = None;
        for entry in self.domains[idx].patterns() {
            self.match_attempts += 1;
            let Some(caps) = entry.matcher().captures(fragment) else {
                continue;
            };
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let values: Vec<&str> = caps
                .iter()
                .skip(1)
                .map(|m| m.map_or("", |m| m.as_str()))
                .collect();

            let translated = swap.catalog().lookup(entry.original());
            let middle = pattern::fill(translated, &values);

            let mut candidate =
                String::with_capacity(fragment.len() + middle.len());
            candidate.push_str(&fragment[..whole.start()]);
            candidate.push_str(&middle);
            candidate.push_str(&fragment[whole.end()..]);

            let candidate = urls::localize_embedded_urls(
                &candidate,
                target_locale,
                &self.config,
                &self.url_paths,
            );

            if candidate != fragment {
                tracing::debug!(
                    domain = %domain_name,
                    locale = target_locale,
                    template = entry.original(),
                    "pattern matched; reconstructed fragment"
                );
                next = Some(candidate);
                break;
            }
        }
        drop(swap);

        match next {
            Some(candidate) => self.reconstruct_recursive(&candidate, idx, target_locale, depth + 1),
            None => fragment.to_string(),
        }
    }
}
