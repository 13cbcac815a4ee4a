//! Which URLs a crawl (or a sitemap listing) may include.

use std::collections::HashSet;
use std::sync::LazyLock;

use docsift_shared::Site;
use docsift_shared::canonical::{dedup_key, same_origin, within_prefix};
use regex::Regex;
use url::Url;

/// Static assets never worth fetching as documentation.
static ASSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(png|jpe?g|gif|svg|webp|ico|css|js|mjs|map|pdf|zip|gz|tgz|woff2?|ttf|mp4)$")
        .expect("asset extension regex")
});

/// Same origin as the site, under its base path, and not a static asset.
#[derive(Debug, Clone)]
pub struct CrawlScope {
    base: Url,
    prefix: String,
}

impl CrawlScope {
    pub fn new(site: &Site) -> Self {
        Self {
            base: site.base_url.clone(),
            prefix: site.base_prefix().to_string(),
        }
    }

    pub fn admits(&self, url: &Url) -> bool {
        same_origin(&self.base, url)
            && within_prefix(url, &self.prefix)
            && !ASSET_RE.is_match(url.path())
    }

    /// In-scope URLs, deduplicated by canonical form, at most `limit`.
    pub fn filter(&self, urls: impl IntoIterator<Item = Url>, limit: usize) -> Vec<Url> {
        let mut seen = HashSet::new();
        urls.into_iter()
            .filter(|u| self.admits(u))
            .filter(|u| seen.insert(dedup_key(u)))
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn confines_to_origin_prefix_and_pages() {
        let scope = CrawlScope::new(&Site::parse("https://example.com/docs/").unwrap());

        assert!(scope.admits(&url("https://example.com/docs/intro")));
        assert!(!scope.admits(&url("https://example.com/blog/post")));
        assert!(!scope.admits(&url("http://example.com/docs/intro")));
        assert!(!scope.admits(&url("https://cdn.example.com/docs/intro")));
        assert!(!scope.admits(&url("https://example.com/docs/logo.PNG")));
        assert!(!scope.admits(&url("https://example.com/docs/app.js")));
    }

    #[test]
    fn filter_dedups_and_caps() {
        let scope = CrawlScope::new(&Site::parse("https://example.com/").unwrap());
        let urls = vec![
            url("https://example.com/a"),
            url("https://example.com/a/"),
            url("https://other.com/b"),
            url("https://example.com/c"),
            url("https://example.com/d"),
        ];
        let kept: Vec<String> = scope
            .filter(urls, 2)
            .into_iter()
            .map(|u| u.to_string())
            .collect();
        assert_eq!(kept, vec!["https://example.com/a", "https://example.com/c"]);
    }
}
