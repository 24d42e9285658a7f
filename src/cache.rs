//! Bounded LRU cache of fragment -> reconstructed-fragment results.
//!
//! The same notification text is typically reconstructed once per recipient;
//! memoizing the result skips the pattern search for every repeat. Only
//! fragments that actually *changed* are stored: an identical input/output
//! pair carries no information and would spend cache space on text outside
//! any template.

use std::num::NonZeroUsize;

use lru::LruCache;

const CACHE_CAPACITY: usize = 512;

/// Memoized reconstruction results keyed by (domain, locale, fragment).
#[derive(Debug)]
pub struct RetranslationCache {
    lru: LruCache<String, String>,
}

impl Default for RetranslationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RetranslationCache {
    /// Create an empty cache with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lru: LruCache::new(
                NonZeroUsize::new(CACHE_CAPACITY).expect("cache capacity is non-zero"),
            ),
        }
    }

    fn key(domain: &str, locale: &str, fragment: &str) -> String {
        format!("{domain}::{locale}::{fragment}")
    }

    /// Look up a previously reconstructed fragment.
    pub fn get(&mut self, domain: &str, locale: &str, fragment: &str) -> Option<String> {
        self.lru.get(&Self::key(domain, locale, fragment)).cloned()
    }

    /// Store a reconstruction result. Callers only store changed output.
    pub fn put(&mut self, domain: &str, locale: &str, fragment: &str, output: &str) {
        let _ = self
            .lru
            .put(Self::key(domain, locale, fragment), output.to_string());
    }

    /// Number of memoized fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lru.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lru.is_empty()
    }
}
