//! Bounded breadth-first crawler.
//!
//! The crawl loop owns the frontier and the seen-set. Each depth level is
//! fetched concurrently (bounded by a semaphore) and the workers only report
//! back what they found; results are merged in submission order so the next
//! level is deterministic. A URL is marked seen when it is enqueued, so it is
//! fetched at most once per crawl.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use url::Url;

use docsift_fetch::{FetchResult, Fetcher, HtmlSummary, resolve_links};
use docsift_shared::canonical::dedup_key;
use docsift_shared::{RunConfig, Site};

use crate::scope::CrawlScope;

/// Byte cap for crawled pages.
const CRAWL_MAX_BYTES: usize = 600_000;

// ---------------------------------------------------------------------------
// Options & results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Stop once this many URLs have been fetched.
    pub max_pages: usize,
    /// Links are followed from pages shallower than this.
    pub max_depth: u32,
    /// Concurrent fetches within one level.
    pub concurrency: usize,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_pages: 60,
            max_depth: 3,
            concurrency: 8,
        }
    }
}

impl From<&RunConfig> for CrawlOptions {
    fn from(config: &RunConfig) -> Self {
        Self {
            max_pages: config.max_pages,
            max_depth: config.max_depth,
            concurrency: config.concurrency,
        }
    }
}

/// A successfully fetched HTML page.
#[derive(Debug, Clone)]
pub struct CrawledPage {
    pub url: Url,
    pub depth: u32,
    pub title: Option<String>,
}

/// Summary of a completed crawl.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// Successful HTML pages in visit order.
    pub pages: Vec<CrawledPage>,
    /// URLs fetched, whatever the outcome.
    pub visited: usize,
    /// Fetches that failed or were not HTML.
    pub skipped: usize,
    pub duration: Duration,
}

impl CrawlResult {
    pub fn urls(&self) -> Vec<Url> {
        self.pages.iter().map(|p| p.url.clone()).collect()
    }
}

/// What a worker reports for one URL.
#[derive(Debug)]
struct Visit {
    url: Url,
    status: u16,
    html: bool,
    title: Option<String>,
    links: Vec<Url>,
}

impl Visit {
    fn from_fetch(result: FetchResult) -> Self {
        let html = result.is_success() && result.is_html();
        let (title, links) = if html {
            let summary = HtmlSummary::parse(&result.text());
            (summary.title, resolve_links(&result.final_url, &summary.hrefs))
        } else {
            (None, Vec::new())
        };
        Self {
            url: result.url,
            status: result.status,
            html,
            title,
            links,
        }
    }
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Crawler {
    fetcher: Fetcher,
    opts: CrawlOptions,
}

impl Crawler {
    pub fn new(fetcher: Fetcher, opts: CrawlOptions) -> Self {
        Self { fetcher, opts }
    }

    /// Crawl `site` breadth-first from its base URL.
    #[instrument(skip_all, fields(site = %site, max_pages = self.opts.max_pages, max_depth = self.opts.max_depth))]
    pub async fn crawl(&self, site: &Site) -> CrawlResult {
        let started = Instant::now();
        let scope = CrawlScope::new(site);
        let semaphore = Arc::new(Semaphore::new(self.opts.concurrency.max(1)));

        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(dedup_key(&site.base_url));
        let mut level: Vec<Url> = vec![site.base_url.clone()];
        let mut depth: u32 = 0;

        let mut pages: Vec<CrawledPage> = Vec::new();
        let mut visited: usize = 0;
        let mut skipped: usize = 0;

        info!(concurrency = self.opts.concurrency, "starting crawl");

        while !level.is_empty() && visited < self.opts.max_pages {
            level.truncate(self.opts.max_pages - visited);
            visited += level.len();
            debug!(depth, urls = level.len(), "crawling level");

            let handles: Vec<_> = level
                .drain(..)
                .map(|url| {
                    let fetcher = self.fetcher.clone();
                    let sem = semaphore.clone();
                    tokio::spawn(async move {
                        let _permit = sem.acquire_owned().await.ok();
                        let result = fetcher.fetch(&url, CRAWL_MAX_BYTES).await;
                        Visit::from_fetch(result)
                    })
                })
                .collect();

            let mut next: Vec<Url> = Vec::new();
            for handle in handles {
                let visit = match handle.await {
                    Ok(visit) => visit,
                    Err(e) => {
                        warn!(error = %e, "crawl worker failed");
                        skipped += 1;
                        continue;
                    }
                };

                if !visit.html {
                    debug!(url = %visit.url, status = visit.status, "not an HTML page");
                    skipped += 1;
                    continue;
                }

                if depth < self.opts.max_depth {
                    for link in &visit.links {
                        if scope.admits(link) && seen.insert(dedup_key(link)) {
                            next.push(link.clone());
                        }
                    }
                }

                pages.push(CrawledPage {
                    url: visit.url,
                    depth,
                    title: visit.title,
                });
            }

            level = next;
            depth += 1;
        }

        let result = CrawlResult {
            pages,
            visited,
            skipped,
            duration: started.elapsed(),
        };

        info!(
            pages = result.pages.len(),
            visited = result.visited,
            skipped = result.skipped,
            duration_ms = result.duration.as_millis(),
            "crawl completed"
        );

        result
    }
}
