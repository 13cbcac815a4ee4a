//! Bounded HTTP fetching and light HTML extraction.
//!
//! [`Fetcher::fetch`] never fails: transport errors are reported as status `0`
//! and HTTP errors as their status code, so callers branch on the result
//! instead of handling errors. Bodies are truncated silently at the byte cap.
//! There are no retries; a failed fetch means "this candidate doesn't exist".

pub mod fanout;
pub mod html;

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, trace};
use url::Url;

use docsift_shared::{DocsiftError, Result, RunConfig};

pub use fanout::fan_out;
pub use html::{HtmlSummary, extract_hrefs, extract_title, fallback_title_from_url, resolve_links};

/// General byte cap for page fetches.
pub const DEFAULT_MAX_BYTES: usize = 2_000_000;

/// Byte cap for downloading a published full bundle.
pub const FULL_INDEX_MAX_BYTES: usize = 10_000_000;

/// Byte cap used by [`Fetcher::exists`].
pub const EXISTS_MAX_BYTES: usize = 1_000;

/// Byte cap used when only the `<title>` is needed.
pub const TITLE_MAX_BYTES: usize = 300_000;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

const ACCEPT_VALUE: &str = "text/plain,text/markdown,text/html,*/*";

// ---------------------------------------------------------------------------
// FetchResult
// ---------------------------------------------------------------------------

/// Outcome of one bounded GET.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The requested URL.
    pub url: Url,
    /// Where the response came from after redirects.
    pub final_url: Url,
    /// HTTP status, or `0` for a transport-level failure.
    pub status: u16,
    pub content_type: Option<String>,
    /// Body, truncated at the requested cap.
    pub body: Vec<u8>,
}

impl FetchResult {
    fn transport_failure(url: &Url) -> Self {
        Self {
            url: url.clone(),
            final_url: url.clone(),
            status: 0,
            content_type: None,
            body: Vec::new(),
        }
    }

    /// `200 <= status < 400`.
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }

    /// The request never produced an HTTP response.
    pub fn is_transport_failure(&self) -> bool {
        self.status == 0
    }

    /// Successful with a non-empty body.
    pub fn has_content(&self) -> bool {
        self.is_success() && !self.body.is_empty()
    }

    /// HTML, or no content type at all.
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            None => true,
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                ct.trim().is_empty() || ct.contains("text/html")
            }
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Options for building a [`Fetcher`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("docsift/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl From<&RunConfig> for FetchOptions {
    fn from(config: &RunConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Shared, cheaply clonable HTTP fetcher.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    /// Build a fetcher with a single pooled client.
    pub fn new(opts: &FetchOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(opts.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(opts.timeout)
            .build()
            .map_err(|e| DocsiftError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout: opts.timeout,
        })
    }

    /// GET `url` with the default timeout, keeping at most `max_bytes`.
    pub async fn fetch(&self, url: &Url, max_bytes: usize) -> FetchResult {
        self.fetch_with_timeout(url, self.timeout, max_bytes).await
    }

    /// GET `url` with an explicit timeout, keeping at most `max_bytes`.
    pub async fn fetch_with_timeout(
        &self,
        url: &Url,
        timeout: Duration,
        max_bytes: usize,
    ) -> FetchResult {
        match tokio::time::timeout(timeout, self.fetch_inner(url, timeout, max_bytes)).await {
            Ok(result) => result,
            Err(_) => {
                debug!(%url, ?timeout, "fetch timed out");
                FetchResult::transport_failure(url)
            }
        }
    }

    async fn fetch_inner(&self, url: &Url, timeout: Duration, max_bytes: usize) -> FetchResult {
        let response = self
            .client
            .get(url.as_str())
            .header(ACCEPT, ACCEPT_VALUE)
            .timeout(timeout)
            .send()
            .await;

        let mut response = match response {
            Ok(response) => response,
            Err(e) => {
                debug!(%url, error = %e, "transport failure");
                return FetchResult::transport_failure(url);
            }
        };

        let final_url = response.url().clone();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut body: Vec<u8> = Vec::new();
        while body.len() < max_bytes {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let remaining = max_bytes - body.len();
                    let take = chunk.len().min(remaining);
                    body.extend_from_slice(&chunk[..take]);
                }
                Ok(None) => break,
                Err(e) => {
                    debug!(%url, error = %e, "body read failed");
                    return FetchResult::transport_failure(url);
                }
            }
        }

        trace!(%url, %final_url, status, bytes = body.len(), "fetched");

        FetchResult {
            url: url.clone(),
            final_url,
            status,
            content_type,
            body,
        }
    }

    /// Whether `url` answers with `200 <= status < 400`.
    pub async fn exists(&self, url: &Url) -> bool {
        self.fetch(url, EXISTS_MAX_BYTES).await.is_success()
    }

    /// Body text when the fetch succeeds with content.
    pub async fn fetch_text(&self, url: &Url, max_bytes: usize) -> Option<String> {
        let result = self.fetch(url, max_bytes).await;
        result.has_content().then(|| result.text())
    }

    /// The page's `<title>`, or a title derived from the URL path.
    pub async fn title_for(&self, url: &Url) -> String {
        let result = self.fetch(url, TITLE_MAX_BYTES).await;
        if result.has_content() {
            if let Some(title) = extract_title(&result.text()) {
                return title;
            }
        }
        fallback_title_from_url(url)
    }
}
