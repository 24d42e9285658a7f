//! Text domains: named template scopes observed during rendering.
//!
//! A domain mirrors one source of outgoing text (a plugin, a subsystem). It
//! accumulates the templates seen during the cycle as compiled pattern
//! entries, plus the dictionary of (template, rendering) pairs that doubles
//! as the active-locale catalog at flush time.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::catalog::Dictionary;
use crate::pattern::{self, PatternEntry};

/// One registered text domain and everything observed for it.
#[derive(Debug)]
pub struct TextDomain {
    name: String,
    patterns: Vec<PatternEntry>,
    priority: HashSet<String>,
    compiled: HashSet<String>,
    observed: Dictionary,
    catalog_file: Option<PathBuf>,
}

impl TextDomain {
    /// Create an empty domain.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            patterns: Vec::new(),
            priority: HashSet::new(),
            compiled: HashSet::new(),
            observed: Dictionary::new(),
            catalog_file: None,
        }
    }

    /// Domain name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compiled pattern entries in matching order: priority strings first,
    /// then observation order.
    #[must_use]
    pub fn patterns(&self) -> &[PatternEntry] {
        &self.patterns
    }

    /// The (template, rendering) pairs observed this cycle. This is the
    /// active-locale dictionary for the domain.
    #[must_use]
    pub fn observed(&self) -> &Dictionary {
        &self.observed
    }

    /// Recorded reference catalog file location, if the host reported one.
    #[must_use]
    pub fn catalog_file(&self) -> Option<&Path> {
        self.catalog_file.as_deref()
    }

    /// Remember where the domain's reference catalog lives. Target-locale
    /// candidates are derived from this location.
    pub fn set_catalog_file(&mut self, path: PathBuf) {
        self.catalog_file = Some(path);
    }

    /// What: Mark a template as a priority string.
    ///
    /// Details:
    /// - Priority strings are matched before anything else, regardless of
    ///   observation order. Short generic templates ("topic") otherwise
    ///   shadow the longer template a whole message was rendered from.
    /// - Must be registered before the template is observed to take effect
    ///   on its pattern position.
    pub fn add_priority(&mut self, original: &str) {
        self.priority.insert(original.to_string());
    }

    /// What: Record one (template, rendered translation) observation.
    ///
    /// Inputs:
    /// - `original`: Untranslated template text
    /// - `rendered`: Its rendering in the currently active locale
    ///
    /// Details:
    /// - The pair always refreshes the observed dictionary.
    /// - A pattern entry is compiled once per unique template; repeats of the
    ///   same template are cheap.
    /// - Priority strings are inserted at the front of the pattern list,
    ///   everything else is appended.
    pub fn observe(&mut self, original: &str, rendered: &str) {
        self.observed
            .insert(original.to_string(), rendered.to_string());

        if !self.compiled.insert(original.to_string()) {
            return;
        }

        match pattern::compile(original, rendered) {
            Ok(entry) => {
                if self.priority.contains(original) {
                    self.patterns.insert(0, entry);
                } else {
                    self.patterns.push(entry);
                }
            }
            Err(e) => {
                tracing::warn!(
                    domain = %self.name,
                    error = %e,
                    "failed to compile pattern for observed template"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observe_compiles_once_per_template() {
        let mut domain = TextDomain::new("forum");
        domain.observe("Hello, %s!", "Bonjour, %s!");
        domain.observe("Hello, %s!", "Bonjour, %s!");
        assert_eq!(domain.patterns().len(), 1);
    }

    #[test]
    fn test_observe_keeps_observation_order() {
        let mut domain = TextDomain::new("forum");
        domain.observe("first %s", "premier %s");
        domain.observe("second %s", "second %s");
        assert_eq!(domain.patterns()[0].original(), "first %s");
        assert_eq!(domain.patterns()[1].original(), "second %s");
    }

    #[test]
    fn test_priority_string_goes_in_front() {
        let mut domain = TextDomain::new("forum");
        domain.add_priority("the whole message %s");
        domain.observe("topic", "sujet");
        domain.observe("the whole message %s", "le message entier %s");
        assert_eq!(domain.patterns()[0].original(), "the whole message %s");
        assert_eq!(domain.patterns()[1].original(), "topic");
    }

    #[test]
    fn test_observed_dictionary_tracks_pairs() {
        let mut domain = TextDomain::new("forum");
        domain.observe("Hello, %s!", "Bonjour, %s!");
        assert_eq!(
            domain.observed().get("Hello, %s!"),
            Some(&"Bonjour, %s!".to_string())
        );
    }
}
