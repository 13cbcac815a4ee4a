//! Turning documentation URLs into bundle text.
//!
//! Tried in order, first non-empty result wins:
//! 1. URLs that already point at text (`.md`, `.markdown`, `.rst`, `.txt`) are fetched as-is.
//! 2. A `.md` sibling of the page (`/guide/setup` -> `/guide/setup.md`).
//! 3. HTML conversion, in-process or through `uvx markitdown`.
//! 4. The raw response body.

use std::process::Stdio;
use std::time::Duration;

use docsift_artifacts::BundleDoc;
use docsift_fetch::{DEFAULT_MAX_BYTES, FetchResult, Fetcher, fan_out};
use docsift_shared::{HtmlConverterKind, RunConfig};
use tokio::process::Command;
use tracing::{debug, instrument, warn};
use url::Url;


const TEXT_EXTENSIONS: &[&str] = &[".md", ".markdown", ".rst", ".txt"];

/// How HTML pages are turned into Markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlConverter {
    /// `htmd` with content extraction and cleanup.
    Builtin,
    /// An external command given the page URL as its last argument.
    Command { program: String, args: Vec<String> },
}

impl HtmlConverter {
    pub fn markitdown() -> Self {
        HtmlConverter::Command {
            program: "uvx".to_string(),
            args: vec!["markitdown".to_string()],
        }
    }
}

impl From<HtmlConverterKind> for HtmlConverter {
    fn from(kind: HtmlConverterKind) -> Self {
        match kind {
            HtmlConverterKind::Builtin => HtmlConverter::Builtin,
            HtmlConverterKind::Markitdown => HtmlConverter::markitdown(),
        }
    }
}

/// A page to convert, with the title its bundle section gets.
#[derive(Debug, Clone)]
pub struct PageRef {
    pub title: String,
    pub url: Url,
}

/// Converts web pages to text for the full bundle.
#[derive(Debug, Clone)]
pub struct ContentConverter {
    fetcher: Fetcher,
    html: HtmlConverter,
    command_timeout: Duration,
}

impl ContentConverter {
    pub fn new(fetcher: Fetcher, html: HtmlConverter, command_timeout: Duration) -> Self {
        Self {
            fetcher,
            html,
            command_timeout,
        }
    }

    pub fn from_config(fetcher: Fetcher, config: &RunConfig) -> Self {
        Self::new(
            fetcher,
            config.html_converter.into(),
            Duration::from_secs(config.timeout_secs.saturating_mul(4)),
        )
    }

    /// Text for `url`, or an empty string when every step came up empty.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn convert(&self, url: &Url) -> String {
        let path = url.path().to_lowercase();
        if TEXT_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            if let Some(text) = self.fetcher.fetch_text(url, DEFAULT_MAX_BYTES).await {
                debug!("fetched text directly");
                return text;
            }
        }

        if let Some(md_url) = markdown_sibling(url) {
            if self.fetcher.exists(&md_url).await {
                if let Some(text) = self.fetcher.fetch_text(&md_url, DEFAULT_MAX_BYTES).await {
                    debug!(md_url = %md_url, "using markdown sibling");
                    return text;
                }
            }
        }

        let mut fetched: Option<FetchResult> = None;
        match &self.html {
            HtmlConverter::Builtin => {
                let page = self.fetcher.fetch(url, DEFAULT_MAX_BYTES).await;
                if page.has_content() && page.is_html() {
                    match docsift_markdown::html_to_markdown(&page.text(), url) {
                        Ok(md) if !md.is_blank() => return md.markdown,
                        Ok(_) => debug!("converted page is blank"),
                        Err(e) => warn!(error = %e, "html conversion failed"),
                    }
                }
                fetched = Some(page);
            }
            HtmlConverter::Command { program, args } => {
                if let Some(text) = self.run_command(program, args, url).await {
                    return text;
                }
            }
        }

        let page = match fetched {
            Some(page) => page,
            None => self.fetcher.fetch(url, DEFAULT_MAX_BYTES).await,
        };
        if page.has_content() {
            debug!("falling back to raw body");
            return page.text();
        }

        debug!(status = page.status, "nothing to convert");
        String::new()
    }

    async fn run_command(&self, program: &str, args: &[String], url: &Url) -> Option<String> {
        let child = Command::new(program)
            .args(args)
            .arg(url.as_str())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.command_timeout, child).await {
            Ok(Ok(output)) if output.status.success() => {
                let text = String::from_utf8_lossy(&output.stdout).into_owned();
                (!text.trim().is_empty()).then_some(text)
            }
            Ok(Ok(output)) => {
                warn!(%program, status = %output.status, "converter exited unsuccessfully");
                None
            }
            Ok(Err(e)) => {
                warn!(%program, error = %e, "converter could not run");
                None
            }
            Err(_) => {
                warn!(%program, timeout = ?self.command_timeout, "converter timed out");
                None
            }
        }
    }

    /// Convert `pages` concurrently, keeping their order.
    pub async fn convert_all(&self, pages: Vec<PageRef>, concurrency: usize) -> Vec<BundleDoc> {
        let converter = self.clone();
        let bodies = fan_out(pages.clone(), concurrency, move |page: PageRef| {
            let converter = converter.clone();
            async move { converter.convert(&page.url).await }
        })
        .await;

        pages
            .into_iter()
            .zip(bodies)
            .map(|(page, body)| BundleDoc {
                title: page.title,
                source_url: page.url.to_string(),
                body: body.unwrap_or_default(),
            })
            .collect()
    }
}

/// `<path>.md` next to a non-root page.
pub fn markdown_sibling(url: &Url) -> Option<Url> {
    let path = url.path();
    if path.is_empty() || path == "/" {
        return None;
    }
    let mut sibling = url.clone();
    sibling.set_query(None);
    sibling.set_fragment(None);
    sibling.set_path(&format!("{}.md", path.trim_end_matches('/')));
    Some(sibling)
}
