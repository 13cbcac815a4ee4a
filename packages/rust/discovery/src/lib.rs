//! Detection of published `llms.txt` / `llms-full.txt` artifacts.
//!
//! Before any repository or crawl work, docsift checks whether the site
//! already publishes a short index (per <https://llmstxt.org/>). A found index
//! is adopted byte-for-byte; a missing full bundle is synthesized later from
//! the index's links.

mod links;
mod parser;

use docsift_fetch::{DEFAULT_MAX_BYTES, FULL_INDEX_MAX_BYTES, Fetcher};
use docsift_shared::{FULL_BUNDLE_FILE, SHORT_INDEX_FILE, Site};
use tracing::{debug, info, instrument};
use url::Url;

pub use links::extract_index_links;
pub use parser::{IndexEntry, IndexSection, LlmsIndex, parse_llms_txt};

// ---------------------------------------------------------------------------
// ExistingArtifacts
// ---------------------------------------------------------------------------

/// A published artifact and where it was found.
#[derive(Debug, Clone)]
pub struct PublishedFile {
    pub url: Url,
    pub body: Vec<u8>,
}

impl PublishedFile {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// What the site already publishes.
#[derive(Debug, Clone)]
pub struct ExistingArtifacts {
    pub short_index: PublishedFile,
    pub full_bundle: Option<PublishedFile>,
}

impl ExistingArtifacts {
    /// Parsed view of the short index, if it follows the llms.txt format.
    pub fn parsed(&self) -> Option<LlmsIndex> {
        match parse_llms_txt(&self.short_index.text()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!(url = %self.short_index.url, error = %e, "short index is not well-formed");
                None
            }
        }
    }

    /// Links listed in the short index, resolved against its location.
    pub fn links(&self) -> Vec<Url> {
        extract_index_links(&self.short_index.text(), &self.short_index.url)
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Locations checked for `filename`: under the base URL, then the origin root.
pub fn candidate_urls(site: &Site, filename: &str) -> Vec<Url> {
    let mut out: Vec<Url> = Vec::new();
    for root in [&site.base_url, &site.origin] {
        if let Ok(url) = root.join(filename) {
            if !out.contains(&url) {
                out.push(url);
            }
        }
    }
    out
}

/// Look for a published short index and full bundle.
///
/// Each filename is probed at its candidate locations in order; the first
/// successful response with a non-empty body wins. Returns `None` when no
/// short index exists, whether or not a full bundle does.
#[instrument(skip_all, fields(site = %site))]
pub async fn detect(fetcher: &Fetcher, site: &Site) -> Option<ExistingArtifacts> {
    let short_candidates = candidate_urls(site, SHORT_INDEX_FILE);
    let full_candidates = candidate_urls(site, FULL_BUNDLE_FILE);

    let (short_index, full_bundle) = tokio::join!(
        first_published(fetcher, &short_candidates, DEFAULT_MAX_BYTES),
        first_published(fetcher, &full_candidates, FULL_INDEX_MAX_BYTES),
    );

    let Some(short_index) = short_index else {
        debug!("no published short index");
        return None;
    };

    info!(
        llms_txt = %short_index.url,
        llms_full = full_bundle.as_ref().map(|f| f.url.as_str()).unwrap_or("-"),
        "found published llms.txt"
    );

    Some(ExistingArtifacts {
        short_index,
        full_bundle,
    })
}

async fn first_published(
    fetcher: &Fetcher,
    candidates: &[Url],
    max_bytes: usize,
) -> Option<PublishedFile> {
    for url in candidates {
        let result = fetcher.fetch(url, max_bytes).await;
        debug!(%url, status = result.status, bytes = result.body.len(), "probed");
        if result.has_content() {
            return Some(PublishedFile {
                url: url.clone(),
                body: result.body,
            });
        }
    }
    None
}
