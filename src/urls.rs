//! URL detection and locale-slug path rewriting.
//!
//! Reconstructed text is free-form (message bodies, subjects), so URLs are
//! found by scanning raw text, not by walking structured markup. A found URL
//! is rewritten only when it points at the site's own host *and* its logical
//! path descends from one of the localization-enabled path prefixes; every
//! other URL passes through byte for byte.
//!
//! The slug convention: localized pages carry the locale's language slug as
//! the leading path segment (`/de/forums/...`), and the default locale never
//! appears in the path at all.

use std::fmt::Write;
use std::net::Ipv4Addr;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::EngineConfig;

/// Decomposed absolute URL. Carries exactly what the rewriter needs; this is
/// not a general-purpose URL type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    /// URL scheme without the `://` separator.
    pub scheme: String,
    /// Optional `user` or `user:pass` part before the host.
    pub userinfo: Option<String>,
    /// Host name or IPv4 literal.
    pub host: String,
    /// Optional explicit port.
    pub port: Option<u16>,
    /// Path including its leading slash, or empty when absent.
    pub path: String,
    /// Query string without the leading `?`.
    pub query: Option<String>,
    /// Fragment without the leading `#`.
    pub fragment: Option<String>,
}

impl UrlParts {
    /// What: Split an absolute URL into its components.
    ///
    /// Inputs:
    /// - `url`: Absolute URL text (`scheme://...`)
    ///
    /// Output:
    /// - `Some(UrlParts)` on success, `None` when the text has no scheme or
    ///   no host
    #[must_use]
    pub fn parse(url: &str) -> Option<Self> {
        let (scheme, rest) = url.split_once("://")?;
        if scheme.is_empty() {
            return None;
        }
        let (rest, fragment) = match rest.split_once('#') {
            Some((r, f)) => (r, Some(f.to_string())),
            None => (rest, None),
        };
        let (rest, query) = match rest.split_once('?') {
            Some((r, q)) => (r, Some(q.to_string())),
            None => (rest, None),
        };
        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], rest[i..].to_string()),
            None => (rest, String::new()),
        };
        let (userinfo, hostport) = match authority.rsplit_once('@') {
            Some((u, h)) => (Some(u.to_string()), h),
            None => (None, authority),
        };
        let (host, port) = match hostport.rsplit_once(':') {
            Some((h, p)) if !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()) => {
                (h.to_string(), p.parse::<u16>().ok())
            }
            _ => (hostport.to_string(), None),
        };
        if host.is_empty() {
            return None;
        }
        Some(Self {
            scheme: scheme.to_string(),
            userinfo,
            host,
            port,
            path,
            query,
            fragment,
        })
    }

    /// Reassemble the URL from its components.
    #[must_use]
    pub fn unparse(&self) -> String {
        let mut out = format!("{}://", self.scheme);
        if let Some(u) = &self.userinfo {
            out.push_str(u);
            out.push('@');
        }
        out.push_str(&self.host);
        if let Some(p) = self.port {
            let _ = write!(out, ":{p}");
        }
        out.push_str(&self.path);
        if let Some(q) = &self.query {
            out.push('?');
            out.push_str(q);
        }
        if let Some(f) = &self.fragment {
            out.push('#');
            out.push_str(f);
        }
        out
    }
}

/// Permissive absolute-URL scanner: scheme, optional userinfo, host name or
/// IPv4 literal or `localhost`, optional port, optional path up to the next
/// whitespace. Host plausibility (public vs. private address space) is
/// checked in code afterwards, not in the grammar.
fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(?:https?|ftp)://(?:[^\s/@]+(?::[^\s/@]*)?@)?(?:localhost|(?:\d{1,3}\.){3}\d{1,3}|(?:[\p{L}\p{N}](?:[\p{L}\p{N}-]*[\p{L}\p{N}])?\.)+\p{L}{2,})(?::\d{2,5})?(?:/\S*)?",
        )
        .expect("url regex is valid")
    })
}

/// What: Decide whether a host belongs to public address space.
///
/// Inputs:
/// - `host`: Host name or IPv4 literal from a scanned URL
///
/// Output:
/// - `true` for domain names and public IPv4 addresses; `localhost` is
///   accepted for local testing
///
/// Details:
/// - Loopback, RFC 1918 private, link-local, unspecified, broadcast, and
///   multicast IPv4 ranges are rejected so random dotted quads in text are
///   not mistaken for public hosts.
fn is_public_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return !(ip.is_loopback()
            || ip.is_private()
            || ip.is_link_local()
            || ip.is_unspecified()
            || ip.is_broadcast()
            || ip.is_multicast()
            || ip.octets()[0] == 0);
    }
    host.contains('.')
}

/// Ensure a path-like string ends with a single trailing slash.
#[must_use]
pub fn trailingslashit(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

/// Strip `base` from the front of `path` on a segment boundary. `/blog`
/// strips from `/blog/x` and `/blog`, never from `/blogging/x`.
fn strip_base_path<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(base)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Strip a recognized locale slug prefix from `path`, keeping the slash that
/// follows it. Returns `None` when no configured slug leads the path.
fn strip_lang_prefix<'a>(path: &'a str, config: &EngineConfig) -> Option<&'a str> {
    for slug in config.known_slugs() {
        let prefix = format!("/{slug}/");
        if path.starts_with(&prefix) {
            return Some(&path[prefix.len() - 1..]);
        }
    }
    None
}

/// What: Rewrite the locale slug segment of a URL's path.
///
/// Inputs:
/// - `url`: Absolute URL text
/// - `replacement`: Slug to install, or empty to remove any existing slug
/// - `config`: Site configuration (base path, default locale, known slugs)
///
/// Output:
/// - The rewritten URL, or the input unchanged when it does not parse
///
/// Details:
/// - The site's base install path is stripped before slug handling and
///   restored afterwards, so `/blog/de/forums/` round-trips correctly.
/// - The default locale's slug never appears in a path: asking for it is the
///   same as asking for removal.
fn replace_lang_path(url: &str, replacement: &str, config: &EngineConfig) -> String {
    let Some(mut parts) = UrlParts::parse(url) else {
        return url.to_string();
    };
    let site_path = config.site_path();

    // canonicalize to a leading slash
    let mut path = if parts.path.is_empty() {
        "/".to_string()
    } else {
        parts.path.clone()
    };

    if site_path != "/"
        && let Some(rest) = strip_base_path(&path, &site_path)
    {
        path = if rest.is_empty() {
            "/".to_string()
        } else {
            rest.to_string()
        };
    }

    let lang_path = if replacement.is_empty() || replacement == config.lang_slug(&config.default_locale)
    {
        String::new()
    } else {
        format!("/{replacement}")
    };

    let rewritten = match strip_lang_prefix(&path, config) {
        Some(rest) => format!("{lang_path}{rest}"),
        None => format!("{lang_path}{path}"),
    };

    parts.path = if site_path == "/" {
        rewritten
    } else {
        format!("{site_path}{rewritten}")
    };
    parts.unparse()
}

/// Rewrite a single URL to carry the slug of `locale` as its leading path
/// segment (removing the slug entirely when `locale` is the default locale).
#[must_use]
pub fn localize_url(url: &str, locale: &str, config: &EngineConfig) -> String {
    replace_lang_path(url, &config.lang_slug(locale), config)
}

/// Strip any locale slug from a URL's path.
#[must_use]
pub fn delocalize_url(url: &str, config: &EngineConfig) -> String {
    replace_lang_path(url, "", config)
}

/// What: Compute a URL's logical path on the site.
///
/// Inputs:
/// - `url`: Absolute URL text
/// - `config`: Site configuration
///
/// Output:
/// - The path with locale slug and site base path stripped, `/` at minimum
///
/// Details:
/// - This is the path compared against localization-enabled prefixes; it is
///   locale- and install-location-independent.
#[must_use]
pub fn component_path(url: &str, config: &EngineConfig) -> String {
    let delocalized = delocalize_url(url, config);
    let Some(parts) = UrlParts::parse(&delocalized) else {
        return "/".to_string();
    };
    let site_path = config.site_path();
    let mut path = if parts.path.is_empty() {
        "/".to_string()
    } else {
        parts.path
    };
    if site_path != "/"
        && let Some(rest) = strip_base_path(&path, &site_path)
    {
        path = if rest.is_empty() {
            "/".to_string()
        } else {
            rest.to_string()
        };
    }
    path
}

/// What: Re-localize every site-local URL embedded in free text.
///
/// Inputs:
/// - `text`: Arbitrary reconstructed text possibly containing URLs
/// - `target_locale`: Locale whose slug the rewritten URLs should carry
/// - `config`: Site configuration
/// - `enabled_paths`: Localization-enabled path prefixes (trailing-slashed)
///
/// Output:
/// - The text with qualifying URLs rewritten; everything else untouched
///
/// Details:
/// - A URL qualifies when its host is the site host (private/loopback
///   literals never qualify), it has a path, and its logical path descends
///   from one of `enabled_paths`.
#[must_use]
pub fn localize_embedded_urls(
    text: &str,
    target_locale: &str,
    config: &EngineConfig,
    enabled_paths: &[String],
) -> String {
    if enabled_paths.is_empty() {
        return text.to_string();
    }
    let site_host = config.site_host().to_ascii_lowercase();
    url_regex()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let url = &caps[0];
            let Some(parts) = UrlParts::parse(url) else {
                return url.to_string();
            };
            if !is_public_host(&parts.host) || parts.host.to_ascii_lowercase() != site_host {
                return url.to_string();
            }
            if parts.path.is_empty() {
                return url.to_string();
            }
            let component = trailingslashit(&component_path(url, config));
            if enabled_paths
                .iter()
                .any(|p| component.starts_with(p.as_str()))
            {
                let localized = localize_url(url, target_locale, config);
                tracing::debug!(from = url, to = %localized, "re-localized embedded url");
                localized
            } else {
                url.to_string()
            }
        })
        .into_owned()
}
