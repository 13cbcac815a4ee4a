//! URL canonicalization and comparison.
//!
//! Every URL that is fetched, enqueued, or deduplicated goes through
//! [`canonicalize`] first: query string and fragment are dropped, a missing
//! scheme defaults to `https`, and the host is lower-cased (the `url` crate
//! does the latter for special schemes).

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{DocsiftError, Result};

/// Matches an explicit `scheme://` prefix, or an opaque `scheme:` like
/// `mailto:` (but not `host:port`).
static SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:(//|[^/0-9])").expect("scheme regex")
});

/// Canonicalize a URL string.
///
/// Fails with [`DocsiftError::InvalidUrl`] when no http(s) scheme and host can
/// be recovered; callers treat that as "skip, do not fetch".
pub fn canonicalize(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DocsiftError::invalid_url(input, "empty URL"));
    }

    let with_scheme = if SCHEME_RE.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed.trim_start_matches('/'))
    };

    let parsed =
        Url::parse(&with_scheme).map_err(|e| DocsiftError::invalid_url(input, e.to_string()))?;
    canonicalize_url(&parsed)
}

/// Canonicalize an already-parsed URL.
pub fn canonicalize_url(url: &Url) -> Result<Url> {
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(DocsiftError::invalid_url(
                url.as_str(),
                format!("unsupported scheme '{other}'"),
            ));
        }
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| DocsiftError::invalid_url(url.as_str(), "URL has no host"))?;

    let mut canonical = url.clone();
    canonical.set_query(None);
    canonical.set_fragment(None);

    let lowered = host.to_ascii_lowercase();
    if lowered != host {
        canonical
            .set_host(Some(&lowered))
            .map_err(|e| DocsiftError::invalid_url(url.as_str(), e.to_string()))?;
    }

    Ok(canonical)
}

/// Resolve `href` against `base` and canonicalize the result.
pub fn resolve(base: &Url, href: &str) -> Result<Url> {
    let joined = base
        .join(href.trim())
        .map_err(|e| DocsiftError::invalid_url(href, e.to_string()))?;
    canonicalize_url(&joined)
}

/// Compare scheme, host, and (effective) port only.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str().map(str::to_ascii_lowercase) == b.host_str().map(str::to_ascii_lowercase)
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Whether the candidate's path starts with `base_prefix`.
pub fn within_prefix(candidate: &Url, base_prefix: &str) -> bool {
    candidate.path().starts_with(base_prefix)
}

/// Key used for visited-sets and deduplication.
///
/// The canonical form with a trailing slash removed (except on the root
/// path), so `/docs` and `/docs/` collapse to one entry.
pub fn dedup_key(url: &Url) -> String {
    let canonical = canonicalize_url(url).unwrap_or_else(|_| url.clone());
    let s = canonical.to_string();
    if canonical.path() != "/" && s.ends_with('/') {
        s.trim_end_matches('/').to_string()
    } else {
        s
    }
}

/// `scheme://host[:port]` with no trailing slash.
pub fn origin_of(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    }
}

/// Normalize a user-supplied base URL: canonical form with a trailing slash.
pub fn normalize_base_url(input: &str) -> Result<Url> {
    let mut url = canonicalize(input)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Filesystem-safe directory name derived from a base URL (max 80 chars).
pub fn slug_for_url(url: &Url) -> String {
    static NON_ALNUM_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("non-alnum regex"));

    let mut host = url.host_str().unwrap_or("site").to_ascii_lowercase();
    if let Some(port) = url.port() {
        host = format!("{host}-{port}");
    }

    let path = url.path().trim_matches('/');
    let slug = if path.is_empty() {
        host
    } else {
        let safe = NON_ALNUM_RE
            .replace_all(path, "-")
            .trim_matches('-')
            .to_lowercase();
        format!("{host}-{safe}")
    };

    slug.chars().take(80).collect()
}
