//! Site-relative URL paths and baseurl application.
//!
//! `UrlPath` is the stable key used everywhere a page or asset is
//! addressed by its rendered location: provenance records, the stored
//! page map, navigation helpers. It always begins with `/`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UrlPath(String);

impl UrlPath {
    /// Build a `UrlPath` from a page-ish string, running it through
    /// [`normalize_url`] with a trailing slash enforced (the convention
    /// for page permalinks, as opposed to asset paths).
    pub fn from_page(raw: &str) -> Self {
        Self(normalize_url(raw, true))
    }

    /// Build a `UrlPath` for a non-page resource (asset, feed, sitemap):
    /// normalized, but without forcing a trailing slash.
    pub fn from_asset(raw: &str) -> Self {
        Self(normalize_url(raw, false))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parent(&self) -> Option<UrlPath> {
        let trimmed = self.0.trim_end_matches('/');
        let idx = trimmed.rfind('/')?;
        if idx == 0 {
            Some(UrlPath("/".to_string()))
        } else {
            Some(UrlPath::from_page(&trimmed[..idx]))
        }
    }
}

impl std::fmt::Display for UrlPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize a site-relative or absolute URL.
///
/// - Empty string becomes `/`.
/// - Absolute URLs (`http://`, `https://`, `//host/...`) are returned
///   unchanged — they are never site-relative and normalizing their path
///   component would be incorrect.
/// - Otherwise: force a leading `/`, collapse any run of `/` (that is not
///   part of a URL scheme, which can't occur here since we already
///   excluded absolute URLs) into a single `/`, and optionally ensure a
///   trailing `/`.
///
/// Idempotent: `normalize_url(normalize_url(u, t), t) == normalize_url(u, t)`.
pub fn normalize_url(url: &str, ensure_trailing_slash: bool) -> String {
    if url.is_empty() {
        return "/".to_string();
    }
    if is_absolute(url) {
        return url.to_string();
    }

    let mut out = String::with_capacity(url.len() + 1);
    out.push('/');
    let mut last_was_slash = true; // the leading '/' we just pushed
    for c in url.chars() {
        if c == '/' {
            if !last_was_slash {
                out.push('/');
            }
            last_was_slash = true;
        } else {
            out.push(c);
            last_was_slash = false;
        }
    }

    if ensure_trailing_slash && !out.ends_with('/') {
        out.push('/');
    }
    if !ensure_trailing_slash {
        while out.len() > 1 && out.ends_with('/') {
            out.pop();
        }
    }
    out
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("//") || url.starts_with("http://") || url.starts_with("https://")
}

/// Apply a site baseurl to an already-normalized path.
///
/// Empty baseurl (or `"/"`) leaves `path` unchanged. Otherwise the
/// baseurl's trailing slash is trimmed, a leading `/` is forced onto it,
/// and it's concatenated with `path`. The result never contains a doubled
/// `//` except immediately after a URL scheme in an absolute baseurl.
pub fn apply_baseurl(baseurl: &str, path: &str) -> String {
    if baseurl.is_empty() || baseurl == "/" {
        return path.to_string();
    }

    let is_scheme_relative = baseurl.starts_with("http://")
        || baseurl.starts_with("https://")
        || baseurl.starts_with("//");

    let (scheme, rest) = if is_scheme_relative {
        let scheme_end = baseurl.find("//").map(|i| i + 2).unwrap_or(0);
        (&baseurl[..scheme_end], &baseurl[scheme_end..])
    } else {
        ("", baseurl)
    };

    let trimmed = rest.trim_end_matches('/');
    let trimmed = if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };

    let path_part = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    format!("{scheme}{trimmed}{path_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_becomes_root() {
        assert_eq!(normalize_url("", true), "/");
    }

    #[test]
    fn test_forces_leading_slash() {
        assert_eq!(normalize_url("about", true), "/about/");
    }

    #[test]
    fn test_collapses_double_slash() {
        assert_eq!(normalize_url("//about///team", false), "/about/team");
    }

    #[test]
    fn test_absolute_untouched() {
        assert_eq!(normalize_url("https://example.com/x", true), "https://example.com/x");
        assert_eq!(normalize_url("//cdn.example.com/x", true), "//cdn.example.com/x");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_url("/about//team", true);
        let twice = normalize_url(&once, true);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_apply_baseurl_empty_is_identity() {
        assert_eq!(apply_baseurl("", "/about/"), "/about/");
        assert_eq!(apply_baseurl("/", "/about/"), "/about/");
    }

    #[test]
    fn test_apply_baseurl_subdirectory() {
        assert_eq!(apply_baseurl("/docs/", "/about/"), "/docs/about/");
        assert_eq!(apply_baseurl("/docs", "/about/"), "/docs/about/");
    }

    #[test]
    fn test_apply_baseurl_absolute_host() {
        assert_eq!(
            apply_baseurl("https://example.com", "/about/"),
            "https://example.com/about/"
        );
    }

    #[test]
    fn test_apply_baseurl_never_doubles_slash_except_after_scheme() {
        let out = apply_baseurl("https://example.com/", "/about/");
        assert_eq!(out, "https://example.com/about/");
        assert_eq!(out.matches("//").count(), 1);
    }

    #[test]
    fn test_url_path_parent() {
        let p = UrlPath::from_page("/blog/post/");
        assert_eq!(p.parent().unwrap().as_str(), "/blog/");
    }
}
