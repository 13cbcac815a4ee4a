//! Link extraction from a published short index.

use std::collections::HashSet;
use std::sync::LazyLock;

use docsift_shared::canonical::{dedup_key, resolve};
use regex::Regex;
use url::Url;

/// `[text](target)`, target without whitespace.
static MD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]+\]\(([^)\s]+)\)").expect("markdown link regex"));

/// A bare absolute URL alone on its line.
static BARE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(https?://\S+)\s*$").expect("bare url regex"));

/// Markdown-link targets first, then bare URLs, resolved against `base`,
/// canonicalized, and deduplicated in first-seen order.
pub fn extract_index_links(text: &str, base: &Url) -> Vec<Url> {
    let raw = MD_LINK_RE
        .captures_iter(text)
        .chain(BARE_URL_RE.captures_iter(text))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim());

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for href in raw {
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        let Ok(url) = resolve(base, href) else {
            continue;
        };
        if seen.insert(dedup_key(&url)) {
            out.push(url);
        }
    }
    out
}
