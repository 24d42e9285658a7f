//! Catalog file loading and candidate path resolution.
//!
//! A catalog file is a flat YAML mapping of untranslated template text to its
//! translation in one locale:
//!
//! ```yaml
//! "Hello, %s!": "Hallo, %s!"
//! "New reply to %1$s by %2$s": "Neue Antwort auf %1$s von %2$s"
//! ```
//!
//! Candidate files live next to the domain's reference catalog and are tried
//! domain-qualified first (`<domain>-<locale>.yml`), then locale-only
//! (`<locale>.yml`).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::Dictionary;

/// Derive the candidate catalog files for a (domain, locale) pair, in the
/// order they should be tried.
#[must_use]
pub fn candidate_paths(reference: &Path, domain: &str, locale: &str) -> Vec<PathBuf> {
    let dir = reference.parent().unwrap_or_else(|| Path::new("."));
    vec![
        dir.join(format!("{domain}-{locale}.yml")),
        dir.join(format!("{locale}.yml")),
    ]
}

/// What: Load a catalog YAML file and parse it into a `Dictionary`.
///
/// Inputs:
/// - `path`: Path to the catalog file
///
/// Output:
/// - `Result<Dictionary, String>` containing the template -> translation map
///
/// # Errors
/// - Returns `Err` when the file does not exist
/// - Returns `Err` when the file cannot be read (I/O error)
/// - Returns `Err` when the file is empty
/// - Returns `Err` when the YAML content cannot be parsed
pub fn load_catalog_file(path: &Path) -> Result<Dictionary, String> {
    if !path.exists() {
        return Err(format!("catalog file not found: {}", path.display()));
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| format!("failed to read catalog file {}: {e}", path.display()))?;

    if contents.trim().is_empty() {
        return Err(format!("catalog file is empty: {}", path.display()));
    }

    parse_catalog_yaml(&contents).map_err(|e| {
        format!(
            "failed to parse catalog file {}: {e}. Please check YAML syntax.",
            path.display()
        )
    })
}

/// Parse YAML content into a `Dictionary`. Non-string values are skipped;
/// a catalog only ever maps text to text.
fn parse_catalog_yaml(yaml_content: &str) -> Result<Dictionary, String> {
    let doc: serde_norway::Value =
        serde_norway::from_str(yaml_content).map_err(|e| format!("invalid YAML: {e}"))?;

    let mut dict = HashMap::new();
    if let Some(map) = doc.as_mapping() {
        for (key, value) in map {
            if let (Some(k), Some(v)) = (key.as_str(), value.as_str()) {
                dict.insert(k.to_string(), v.to_string());
            }
        }
    }
    Ok(dict)
}

/// What: Load the first available candidate catalog for (domain, locale).
///
/// Inputs:
/// - `reference`: The domain's recorded reference catalog path, if any
/// - `domain`: Text domain name
/// - `locale`: Target locale code
///
/// Output:
/// - `Result<Dictionary, String>` from the first candidate that loads
///
/// # Errors
/// - Returns `Err` when no reference catalog was ever recorded for the domain
/// - Returns `Err` (from the last candidate) when every candidate fails
pub fn load_first_available(
    reference: Option<&Path>,
    domain: &str,
    locale: &str,
) -> Result<Dictionary, String> {
    let Some(reference) = reference else {
        return Err(format!(
            "no reference catalog recorded for domain '{domain}'"
        ));
    };

    let mut last_err = String::new();
    for candidate in candidate_paths(reference, domain, locale) {
        match load_catalog_file(&candidate) {
            Ok(dict) => {
                tracing::debug!(
                    path = %candidate.display(),
                    keys = dict.len(),
                    "loaded catalog"
                );
                return Ok(dict);
            }
            Err(e) => {
                tracing::debug!(path = %candidate.display(), "catalog candidate unavailable");
                last_err = e;
            }
        }
    }
    Err(last_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_catalog_yaml() {
        let yaml = r#"
"Hello, %s!": "Hallo, %s!"
"New topic": "Neues Thema"
"#;
        let dict = parse_catalog_yaml(yaml).expect("Failed to parse test catalog YAML");
        assert_eq!(dict.get("Hello, %s!"), Some(&"Hallo, %s!".to_string()));
        assert_eq!(dict.get("New topic"), Some(&"Neues Thema".to_string()));
    }

    #[test]
    fn test_parse_catalog_yaml_invalid() {
        assert!(parse_catalog_yaml("key: [unterminated").is_err());
    }

    #[test]
    fn test_load_catalog_file_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for test");
        let result = load_catalog_file(&temp_dir.path().join("missing.yml"));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("not found"));
    }

    #[test]
    fn test_load_catalog_file_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for test");
        let path = temp_dir.path().join("empty.yml");
        fs::write(&path, "").expect("Failed to write empty test catalog");
        let result = load_catalog_file(&path);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("empty"));
    }

    #[test]
    fn test_candidate_order_domain_qualified_first() {
        let reference = Path::new("/srv/locales/forum.yml");
        let candidates = candidate_paths(reference, "forum", "de-DE");
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/srv/locales/forum-de-DE.yml"),
                PathBuf::from("/srv/locales/de-DE.yml"),
            ]
        );
    }

    #[test]
    fn test_load_first_available_falls_back() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for test");
        let reference = temp_dir.path().join("forum.yml");
        // Only the locale-only candidate exists.
        fs::write(
            temp_dir.path().join("de-DE.yml"),
            "\"Hello, %s!\": \"Hallo, %s!\"\n",
        )
        .expect("Failed to write test catalog");

        let dict = load_first_available(Some(&reference), "forum", "de-DE")
            .expect("locale-only candidate should load");
        assert_eq!(dict.get("Hello, %s!"), Some(&"Hallo, %s!".to_string()));
    }

    #[test]
    fn test_load_first_available_prefers_domain_qualified() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for test");
        let reference = temp_dir.path().join("forum.yml");
        fs::write(
            temp_dir.path().join("forum-de-DE.yml"),
            "\"Hello, %s!\": \"Hallo aus forum-de-DE, %s!\"\n",
        )
        .expect("Failed to write test catalog");
        fs::write(
            temp_dir.path().join("de-DE.yml"),
            "\"Hello, %s!\": \"Hallo aus de-DE, %s!\"\n",
        )
        .expect("Failed to write test catalog");

        let dict = load_first_available(Some(&reference), "forum", "de-DE")
            .expect("domain-qualified candidate should load");
        assert_eq!(
            dict.get("Hello, %s!"),
            Some(&"Hallo aus forum-de-DE, %s!".to_string())
        );
    }

    #[test]
    fn test_load_first_available_without_reference() {
        let result = load_first_available(None, "forum", "de-DE");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("no reference catalog"));
    }
}
