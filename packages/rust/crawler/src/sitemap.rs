//! Sitemap discovery.
//!
//! Candidates are `sitemap.xml` under the base URL and at the origin root,
//! plus every `Sitemap:` line in `robots.txt`. They are fetched concurrently
//! and the first (in candidate order) that yields in-scope `<loc>` entries
//! wins. A sitemap index is followed one level down, a batch of nested
//! sitemaps at a time, until enough URLs are collected.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument};
use url::Url;

use docsift_fetch::{DEFAULT_MAX_BYTES, Fetcher, fan_out};
use docsift_shared::Site;
use docsift_shared::canonical::{canonicalize, dedup_key};

use crate::scope::CrawlScope;

const ROBOTS_MAX_BYTES: usize = 200_000;

/// Nested sitemaps followed from one index, at most.
pub const MAX_NESTED_SITEMAPS: usize = 50;

static LOC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<loc>\s*([^<\s]+)\s*</loc>").expect("loc regex"));

/// URLs found in a sitemap, and where.
#[derive(Debug, Clone)]
pub struct SitemapHit {
    pub sitemap_url: Url,
    /// In-scope page URLs, deduplicated, capped at the requested limit.
    pub urls: Vec<Url>,
}

/// `<loc>` values, canonicalized and deduplicated in document order.
pub fn parse_sitemap(xml: &str) -> Vec<Url> {
    let mut seen = HashSet::new();
    LOC_RE
        .captures_iter(xml)
        .filter_map(|caps| canonicalize(&unescape_xml(&caps[1])).ok())
        .filter(|u| seen.insert(dedup_key(u)))
        .collect()
}

fn is_sitemap_index(xml: &str) -> bool {
    xml.contains("<sitemapindex")
}

fn unescape_xml(raw: &str) -> String {
    raw.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

/// `Sitemap:` directives from a robots.txt body.
pub fn robots_sitemaps(robots: &str) -> Vec<Url> {
    robots
        .lines()
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case("sitemap")
                .then(|| value.trim())
        })
        .filter(|v| v.starts_with("http"))
        .filter_map(|v| canonicalize(v).ok())
        .collect()
}

/// Candidate sitemap URLs in probing order, deduplicated.
#[instrument(skip_all, fields(site = %site))]
pub async fn sitemap_candidates(fetcher: &Fetcher, site: &Site) -> Vec<Url> {
    let mut candidates: Vec<Url> = [&site.base_url, &site.origin]
        .into_iter()
        .filter_map(|root| root.join("sitemap.xml").ok())
        .collect();

    if let Ok(robots_url) = site.origin.join("robots.txt") {
        if let Some(robots) = fetcher.fetch_text(&robots_url, ROBOTS_MAX_BYTES).await {
            candidates.extend(robots_sitemaps(&robots));
        }
    }

    let mut seen = HashSet::new();
    candidates.retain(|u| seen.insert(dedup_key(u)));
    candidates
}

/// Fetch `urls` concurrently; bodies come back in input order.
async fn fetch_all(fetcher: &Fetcher, urls: Vec<Url>, concurrency: usize) -> Vec<Option<String>> {
    let fetcher = fetcher.clone();
    fan_out(urls, concurrency, move |url| {
        let fetcher = fetcher.clone();
        async move { fetcher.fetch_text(&url, DEFAULT_MAX_BYTES).await }
    })
    .await
    .into_iter()
    .map(Option::flatten)
    .collect()
}

/// Follow the nested sitemaps of an index, one batch of `concurrency` at a
/// time, until `max_urls` in-scope URLs are collected.
async fn follow_index(
    fetcher: &Fetcher,
    scope: &CrawlScope,
    nested: Vec<Url>,
    max_urls: usize,
    concurrency: usize,
) -> Vec<Url> {
    if nested.len() > MAX_NESTED_SITEMAPS {
        debug!(listed = nested.len(), followed = MAX_NESTED_SITEMAPS, "sitemap index truncated");
    }
    let nested: Vec<Url> = nested.into_iter().take(MAX_NESTED_SITEMAPS).collect();

    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for batch in nested.chunks(concurrency.max(1)) {
        if urls.len() >= max_urls {
            break;
        }
        for xml in fetch_all(fetcher, batch.to_vec(), concurrency).await.into_iter().flatten() {
            let fresh = parse_sitemap(&xml)
                .into_iter()
                .filter(|u| scope.admits(u) && seen.insert(dedup_key(u)));
            urls.extend(fresh.take(max_urls - urls.len()));
        }
    }
    urls
}

/// Find the site's sitemap and return up to `max_urls` in-scope page URLs.
#[instrument(skip_all, fields(site = %site, max_urls = max_urls))]
pub async fn discover_sitemap(
    fetcher: &Fetcher,
    site: &Site,
    max_urls: usize,
    concurrency: usize,
) -> Option<SitemapHit> {
    let scope = CrawlScope::new(site);
    let candidates = sitemap_candidates(fetcher, site).await;
    debug!(candidates = candidates.len(), "probing sitemaps");

    let bodies = fetch_all(fetcher, candidates.clone(), concurrency).await;

    for (sitemap_url, body) in candidates.into_iter().zip(bodies) {
        let Some(xml) = body else { continue };
        let locs = parse_sitemap(&xml);
        if locs.is_empty() {
            continue;
        }

        let urls = if is_sitemap_index(&xml) {
            follow_index(fetcher, &scope, locs, max_urls, concurrency).await
        } else {
            scope.filter(locs, max_urls)
        };

        if urls.is_empty() {
            info!(sitemap = %sitemap_url, "sitemap lists no pages in scope");
            continue;
        }

        info!(sitemap = %sitemap_url, urls = urls.len(), "sitemap found");
        return Some(SitemapHit { sitemap_url, urls });
    }

    debug!("no usable sitemap");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_fetch::FetchOptions;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        Fetcher::new(&FetchOptions::default()).unwrap()
    }

    #[test]
    fn parses_locs_with_whitespace_and_entities() {
        let xml = r#"<?xml version="1.0"?>
<urlset>
  <url><loc> https://example.com/docs/a?x=1&amp;y=2 </loc></url>
  <url><loc>https://example.com/docs/a#top</loc></url>
  <url><loc>https://example.com/docs/b</loc></url>
</urlset>"#;
        let urls: Vec<String> = parse_sitemap(xml).iter().map(|u| u.to_string()).collect();
        assert_eq!(urls, vec!["https://example.com/docs/a", "https://example.com/docs/b"]);
    }

    #[test]
    fn robots_directives_are_case_insensitive() {
        let robots = "User-agent: *\nDisallow: /private\nSITEMAP: https://example.com/s1.xml\nsitemap:https://example.com/s2.xml\nSitemap: /relative.xml\n";
        let urls: Vec<String> = robots_sitemaps(robots).iter().map(|u| u.to_string()).collect();
        assert_eq!(urls, vec!["https://example.com/s1.xml", "https://example.com/s2.xml"]);
    }

    #[tokio::test]
    async fn prefers_base_sitemap_over_origin() {
        let server = MockServer::start().await;
        let base_xml = format!("<urlset><url><loc>{}/docs/intro</loc></url></urlset>", server.uri());
        let root_xml = format!("<urlset><url><loc>{}/other</loc></url></urlset>", server.uri());
        Mock::given(method("GET"))
            .and(path("/docs/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(base_xml))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(root_xml))
            .mount(&server)
            .await;

        let site = Site::parse(&format!("{}/docs/", server.uri())).unwrap();
        let hit = discover_sitemap(&fetcher(), &site, 60, 4).await.unwrap();
        assert_eq!(hit.sitemap_url.path(), "/docs/sitemap.xml");
        assert_eq!(hit.urls.len(), 1);
        assert_eq!(hit.urls[0].path(), "/docs/intro");
    }

    #[tokio::test]
    async fn robots_sitemap_and_index_are_followed() {
        let server = MockServer::start().await;
        let uri = server.uri();
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(format!("Sitemap: {uri}/maps/index.xml\n")),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/maps/index.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "<sitemapindex><sitemap><loc>{uri}/maps/pages.xml</loc></sitemap></sitemapindex>"
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/maps/pages.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "<urlset><url><loc>{uri}/a</loc></url><url><loc>{uri}/b</loc></url></urlset>"
            )))
            .mount(&server)
            .await;

        let site = Site::parse(&uri).unwrap();
        let hit = discover_sitemap(&fetcher(), &site, 60, 4).await.unwrap();
        assert_eq!(hit.sitemap_url.path(), "/maps/index.xml");
        let paths: Vec<&str> = hit.urls.iter().map(|u| u.path()).collect();
        assert_eq!(paths, vec!["/a", "/b"]);
    }

    async fn nested_requests(server: &MockServer) -> usize {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path().starts_with("/maps/"))
            .count()
    }

    async fn mount_index(server: &MockServer, children: usize) {
        let uri = server.uri();
        let entries: String = (0..children)
            .map(|i| format!("<sitemap><loc>{uri}/maps/part-{i}.xml</loc></sitemap>"))
            .collect();
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(format!("<sitemapindex>{entries}</sitemapindex>")),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn large_index_is_followed_only_up_to_the_nested_cap() {
        let server = MockServer::start().await;
        mount_index(&server, 200).await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/maps/part-\d+\.xml$"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "<urlset><url><loc>{}/guide</loc></url></urlset>",
                server.uri()
            )))
            .mount(&server)
            .await;

        let site = Site::parse(&server.uri()).unwrap();
        let hit = discover_sitemap(&fetcher(), &site, 60, 4).await.unwrap();

        assert_eq!(hit.urls.len(), 1);
        assert_eq!(nested_requests(&server).await, MAX_NESTED_SITEMAPS);
    }

    #[tokio::test]
    async fn index_following_stops_once_enough_urls_are_collected() {
        let server = MockServer::start().await;
        let uri = server.uri();
        mount_index(&server, 10).await;
        for i in 0..10 {
            Mock::given(method("GET"))
                .and(path(format!("/maps/part-{i}.xml")))
                .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                    "<urlset><url><loc>{uri}/p{i}a</loc></url><url><loc>{uri}/p{i}b</loc></url></urlset>"
                )))
                .mount(&server)
                .await;
        }

        let site = Site::parse(&uri).unwrap();
        let hit = discover_sitemap(&fetcher(), &site, 3, 2).await.unwrap();

        let paths: Vec<&str> = hit.urls.iter().map(|u| u.path()).collect();
        assert_eq!(paths, vec!["/p0a", "/p0b", "/p1a"]);
        assert_eq!(nested_requests(&server).await, 2);
    }

    #[tokio::test]
    async fn out_of_scope_sitemap_falls_through_to_the_next_candidate() {
        let server = MockServer::start().await;
        let uri = server.uri();
        Mock::given(method("GET"))
            .and(path("/docs/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "<urlset><url><loc>{uri}/blog/post</loc></url></urlset>"
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "<urlset><url><loc>{uri}/blog/other</loc></url><url><loc>{uri}/docs/setup</loc></url></urlset>"
            )))
            .mount(&server)
            .await;

        let site = Site::parse(&format!("{uri}/docs/")).unwrap();
        let hit = discover_sitemap(&fetcher(), &site, 60, 4).await.unwrap();
        assert_eq!(hit.sitemap_url.path(), "/sitemap.xml");
        let paths: Vec<&str> = hit.urls.iter().map(|u| u.path()).collect();
        assert_eq!(paths, vec!["/docs/setup"]);
    }

    #[tokio::test]
    async fn no_sitemap_is_none() {
        let server = MockServer::start().await;
        let site = Site::parse(&server.uri()).unwrap();
        assert!(discover_sitemap(&fetcher(), &site, 60, 4).await.is_none());
    }
}
