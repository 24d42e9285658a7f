//! Engine configuration: site identity, locales, and URL slug mapping.
//!
//! The configuration can be built in code (`EngineConfig::default()` plus
//! field assignment) or loaded from a YAML file:
//!
//! ```yaml
//! site_url: "https://example.com"
//! default_locale: en-US
//! locales:
//!   - en-US
//!   - de-DE
//!   - fr-FR
//! slugs:
//!   zh-Hans-CN: zh
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::urls::UrlParts;

/// Site and locale settings shared by the whole reconstruction pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Absolute site URL, e.g. `https://example.com` or
    /// `https://example.com/blog` when the site lives under a base path.
    pub site_url: String,
    /// Reference locale. Its catalog is the identity dictionary and its slug
    /// never appears in localized URL paths.
    pub default_locale: String,
    /// Locales the site serves. Their slugs are the ones recognized (and
    /// replaced) as leading URL path segments.
    pub locales: Vec<String>,
    /// Optional locale -> slug overrides. Locales without an override use
    /// their lowercased language subtag (`de-DE` -> `de`).
    pub slugs: HashMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            site_url: "http://localhost".to_string(),
            default_locale: "en-US".to_string(),
            locales: Vec::new(),
            slugs: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// What: Load an `EngineConfig` from a YAML file.
    ///
    /// Inputs:
    /// - `path`: Path to the configuration file
    ///
    /// Output:
    /// - `Result<EngineConfig, String>` with the parsed configuration
    ///
    /// # Errors
    /// - Returns `Err` when the file cannot be read (I/O error)
    /// - Returns `Err` when the YAML content cannot be parsed
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read config file {}: {e}", path.display()))?;
        serde_norway::from_str(&contents)
            .map_err(|e| format!("failed to parse config file {}: {e}", path.display()))
    }

    /// Host part of [`Self::site_url`], empty when the URL does not parse.
    #[must_use]
    pub fn site_host(&self) -> String {
        UrlParts::parse(&self.site_url).map_or_else(String::new, |p| p.host)
    }

    /// Base install path of the site, `/` when the site lives at the root.
    #[must_use]
    pub fn site_path(&self) -> String {
        match UrlParts::parse(&self.site_url) {
            Some(p) if !p.path.is_empty() && p.path != "/" => {
                p.path.trim_end_matches('/').to_string()
            }
            _ => "/".to_string(),
        }
    }

    /// What: Map a locale code to its URL slug.
    ///
    /// Inputs:
    /// - `locale`: Locale code (e.g., "de-DE")
    ///
    /// Output:
    /// - Slug string (e.g., "de"), from the override table when present,
    ///   otherwise the lowercased language subtag
    #[must_use]
    pub fn lang_slug(&self, locale: &str) -> String {
        if let Some(slug) = self.slugs.get(locale) {
            return slug.clone();
        }
        locale
            .split(['-', '_'])
            .next()
            .unwrap_or(locale)
            .to_lowercase()
    }

    /// Slugs of every configured locale, deduplicated, in configuration order.
    ///
    /// These are the path segments the URL rewriter recognizes as an existing
    /// locale prefix.
    #[must_use]
    pub fn known_slugs(&self) -> Vec<String> {
        let mut slugs = Vec::new();
        for locale in &self.locales {
            let slug = self.lang_slug(locale);
            if !slug.is_empty() && !slugs.contains(&slug) {
                slugs.push(slug);
            }
        }
        let default_slug = self.lang_slug(&self.default_locale);
        if !default_slug.is_empty() && !slugs.contains(&default_slug) {
            slugs.push(default_slug);
        }
        slugs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_site_host_and_path() {
        let mut config = EngineConfig::default();
        config.site_url = "https://example.com".to_string();
        assert_eq!(config.site_host(), "example.com");
        assert_eq!(config.site_path(), "/");

        config.site_url = "https://example.com/blog/".to_string();
        assert_eq!(config.site_host(), "example.com");
        assert_eq!(config.site_path(), "/blog");
    }

    #[test]
    fn test_lang_slug_defaults_to_language_subtag() {
        let config = EngineConfig::default();
        assert_eq!(config.lang_slug("de-DE"), "de");
        assert_eq!(config.lang_slug("pt_BR"), "pt");
        assert_eq!(config.lang_slug("fr"), "fr");
    }

    #[test]
    fn test_lang_slug_override_wins() {
        let mut config = EngineConfig::default();
        config
            .slugs
            .insert("zh-Hans-CN".to_string(), "zh".to_string());
        assert_eq!(config.lang_slug("zh-Hans-CN"), "zh");
    }

    #[test]
    fn test_known_slugs_deduplicates() {
        let mut config = EngineConfig::default();
        config.locales = vec![
            "de-DE".to_string(),
            "de-CH".to_string(),
            "fr-FR".to_string(),
        ];
        assert_eq!(config.known_slugs(), vec!["de", "fr", "en"]);
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for test");
        let config_path = temp_dir.path().join("relocale.yml");
        let yaml = r"
site_url: https://forum.example.org
default_locale: en-US
locales:
  - en-US
  - de-DE
";
        fs::write(&config_path, yaml).expect("Failed to write test config file");

        let config = EngineConfig::from_file(&config_path).expect("Failed to load config");
        assert_eq!(config.site_host(), "forum.example.org");
        assert_eq!(config.default_locale, "en-US");
        assert_eq!(config.locales.len(), 2);
    }

    #[test]
    fn test_from_file_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for test");
        let result = EngineConfig::from_file(&temp_dir.path().join("nope.yml"));
        assert!(result.is_err());
    }
}
