//! Synchronous HTML helpers.
//!
//! `scraper::Html` is not `Send`, so documents are parsed and dropped inside
//! these functions and only owned data is returned.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use docsift_shared::canonical::resolve;

static HREF_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href], link[href]").expect("href selector"));
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector"));

/// Owned facts extracted from one HTML document.
#[derive(Debug, Clone, Default)]
pub struct HtmlSummary {
    pub title: Option<String>,
    /// Raw `href` values, in document order.
    pub hrefs: Vec<String>,
}

impl HtmlSummary {
    pub fn parse(html: &str) -> Self {
        let doc = Html::parse_document(html);
        Self {
            title: title_of(&doc),
            hrefs: hrefs_of(&doc),
        }
    }
}

/// All `href` values of `<a>` and `<link>` elements.
pub fn extract_hrefs(html: &str) -> Vec<String> {
    hrefs_of(&Html::parse_document(html))
}

/// Whitespace-collapsed `<title>` text, if non-empty.
pub fn extract_title(html: &str) -> Option<String> {
    title_of(&Html::parse_document(html))
}

/// Resolve hrefs against `base`, dropping fragment-only links, unusable
/// schemes, and anything that fails to canonicalize.
pub fn resolve_links(base: &Url, hrefs: &[String]) -> Vec<Url> {
    hrefs
        .iter()
        .map(|h| h.trim())
        .filter(|h| !h.is_empty() && !h.starts_with('#'))
        .filter(|h| {
            let lower = h.to_ascii_lowercase();
            !(lower.starts_with("javascript:")
                || lower.starts_with("mailto:")
                || lower.starts_with("tel:")
                || lower.starts_with("data:"))
        })
        .filter_map(|h| resolve(base, h).ok())
        .collect()
}

/// Title derived from the last path segment: separators become spaces and
/// each word is capitalized. Falls back to the host for root URLs.
pub fn fallback_title_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .unwrap_or_default();

    let stem = segment
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(segment);

    let words: Vec<String> = stem
        .split(['-', '_', ' ', '+'])
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect();

    if words.is_empty() {
        url.host_str().unwrap_or("Home").to_string()
    } else {
        words.join(" ")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn hrefs_of(doc: &Html) -> Vec<String> {
    doc.select(&HREF_SEL)
        .filter_map(|el| el.value().attr("href"))
        .map(str::to_string)
        .collect()
}

fn title_of(doc: &Html) -> Option<String> {
    doc.select(&TITLE_SEL)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_collects_title_and_hrefs() {
        let html = r##"<html><head>
            <title>
              Widget   Docs
            </title>
            <meta name="description" content="All about widgets.">
            <link rel="canonical" href="https://widget.dev/docs/">
        </head><body>
            <a href="/docs/intro">Intro</a>
            <a href="#top">Top</a>
        </body></html>"##;

        let summary = HtmlSummary::parse(html);
        assert_eq!(summary.title.as_deref(), Some("Widget Docs"));
        assert_eq!(
            summary.hrefs,
            vec!["https://widget.dev/docs/", "/docs/intro", "#top"]
        );
    }

    #[test]
    fn resolve_links_skips_anchors_and_foreign_schemes() {
        let base = Url::parse("https://docs.example.com/guide/").unwrap();
        let hrefs: Vec<String> = [
            "intro?x=1#part",
            "#section",
            "mailto:team@example.com",
            "javascript:void(0)",
            "https://external.com",
            "/reference/",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let resolved: Vec<String> = resolve_links(&base, &hrefs)
            .into_iter()
            .map(|u| u.to_string())
            .collect();

        assert_eq!(
            resolved,
            vec![
                "https://docs.example.com/guide/intro",
                "https://external.com/",
                "https://docs.example.com/reference/",
            ]
        );
    }

    #[test]
    fn empty_title_is_none() {
        assert_eq!(extract_title("<title>   </title>"), None);
        assert_eq!(extract_title("<p>no head</p>"), None);
    }

    #[test]
    fn fallback_title_uses_last_segment() {
        let url = Url::parse("https://example.com/docs/getting-started/").unwrap();
        assert_eq!(fallback_title_from_url(&url), "Getting Started");

        let url = Url::parse("https://example.com/docs/api_reference.html").unwrap();
        assert_eq!(fallback_title_from_url(&url), "Api Reference");

        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(fallback_title_from_url(&url), "example.com");
    }
}
