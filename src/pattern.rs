//! Pattern compilation: turning an observed rendering back into a matcher.
//!
//! During normal rendering the engine sees pairs of (untranslated template,
//! rendered translation). `compile` converts the rendered side into a regex
//! that recognizes *any* output of the same template, with the substituted
//! values exposed as capture groups. `fill` is the inverse direction: it
//! substitutes captured values into another locale's translation of the same
//! template.

use std::sync::OnceLock;

use regex::Regex;

/// Matches `%s` and numbered `%N$s` printf-style string placeholders.
fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%(?:\d+\$)?s").expect("placeholder regex is valid"))
}

/// One observed template: its untranslated reference text and a matcher
/// derived from its rendered translation.
///
/// Entries are immutable once compiled and live for the process lifetime.
#[derive(Debug, Clone)]
pub struct PatternEntry {
    original: String,
    matcher: Regex,
}

impl PatternEntry {
    /// The untranslated reference template, placeholders included.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The compiled matcher for the rendered form of this template.
    #[must_use]
    pub fn matcher(&self) -> &Regex {
        &self.matcher
    }
}

/// What: Compile a (template, rendered translation) pair into a `PatternEntry`.
///
/// Inputs:
/// - `original`: Untranslated template text (e.g., `"Hello, %s!"`)
/// - `rendered`: Its rendering in the currently active locale (e.g.,
///   `"Bonjour, %s!"`)
///
/// Output:
/// - `Result<PatternEntry, regex::Error>` with the compiled matcher
///
/// Details:
/// - Every regex metacharacter in `rendered` is escaped; only placeholder
///   positions become `(.*)` capture groups.
/// - Both `%s` and numbered `%N$s` placeholders collapse to the same capture
///   semantics. Matching relies on positional order of capture groups, which
///   is assumed to equal substitution order. A locale that reorders numbered
///   arguments defeats this; that is a known limitation of matching rendered
///   text, not something this function attempts to paper over.
///
/// # Errors
/// - Returns `Err` when the assembled pattern is rejected by the regex
///   engine (not expected for escaped input, but propagated rather than
///   panicking)
pub fn compile(original: &str, rendered: &str) -> Result<PatternEntry, regex::Error> {
    let mut pattern = String::with_capacity(rendered.len() + 16);
    let mut last = 0;
    for m in placeholder_regex().find_iter(rendered) {
        pattern.push_str(&regex::escape(&rendered[last..m.start()]));
        pattern.push_str("(.*)");
        last = m.end();
    }
    pattern.push_str(&regex::escape(&rendered[last..]));

    Ok(PatternEntry {
        original: original.to_string(),
        matcher: Regex::new(&pattern)?,
    })
}

/// What: Substitute captured values into a template, vsprintf-style.
///
/// Inputs:
/// - `template`: Target text containing `%s` / `%N$s` placeholders
/// - `values`: Captured values in match order
///
/// Output:
/// - The template with placeholders replaced
///
/// Details:
/// - `%N$s` picks value N (1-based); bare `%s` consumes values sequentially.
/// - A placeholder without a corresponding value is replaced with nothing,
///   so a translation with more placeholders than the match captured still
///   produces usable text.
#[must_use]
pub fn fill(template: &str, values: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut last = 0;
    let mut next = 0usize;
    for m in placeholder_regex().find_iter(template) {
        out.push_str(&template[last..m.start()]);
        let token = m.as_str();
        let index = if token.len() > 2 {
            // "%N$s": the digits sit between '%' and "$s".
            token[1..token.len() - 2]
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
        } else {
            let i = next;
            next += 1;
            Some(i)
        };
        if let Some(value) = index.and_then(|i| values.get(i)) {
            out.push_str(value);
        }
        last = m.end();
    }
    out.push_str(&template[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_escapes_metacharacters() {
        let entry = compile("Re: %s (%s)", "Re: %s (%s)").expect("compile");
        let caps = entry
            .matcher()
            .captures("Re: hello (world)")
            .expect("should match");
        assert_eq!(&caps[1], "hello");
        assert_eq!(&caps[2], "world");
    }

    #[test]
    fn test_compile_numbered_placeholders_collapse() {
        let entry = compile("%1$s replied to %2$s", "%1$s hat auf %2$s geantwortet")
            .expect("compile");
        let caps = entry
            .matcher()
            .captures("Alice hat auf Thema geantwortet")
            .expect("should match");
        assert_eq!(&caps[1], "Alice");
        assert_eq!(&caps[2], "Thema");
    }

    #[test]
    fn test_compile_no_placeholders() {
        let entry = compile("New topic", "Neues Thema").expect("compile");
        assert!(entry.matcher().is_match("Neues Thema"));
        assert!(!entry.matcher().is_match("Neues"));
    }

    #[test]
    fn test_fill_sequential() {
        assert_eq!(fill("Hello, %s!", &["Alice"]), "Hello, Alice!");
        assert_eq!(fill("%s and %s", &["a", "b"]), "a and b");
    }

    #[test]
    fn test_fill_numbered_reorders() {
        assert_eq!(fill("%2$s by %1$s", &["Alice", "Topic"]), "Topic by Alice");
    }

    #[test]
    fn test_fill_missing_value_drops_placeholder() {
        assert_eq!(fill("%s and %s", &["only"]), "only and ");
    }

    #[test]
    fn test_match_then_fill_round_trip() {
        let entry = compile("Hello, %s!", "Bonjour, %s!").expect("compile");
        let caps = entry
            .matcher()
            .captures("Bonjour, Alice!")
            .expect("should match");
        let values: Vec<&str> = caps
            .iter()
            .skip(1)
            .map(|m| m.map_or("", |m| m.as_str()))
            .collect();
        assert_eq!(fill("Hallo, %s!", &values), "Hallo, Alice!");
    }
}
