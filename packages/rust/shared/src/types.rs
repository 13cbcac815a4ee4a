//! Core domain types shared across the docsift pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::canonical::{dedup_key, normalize_base_url, origin_of};
use crate::error::Result;

/// Version of the `metadata.json` layout.
pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// File name of the short curated index.
pub const SHORT_INDEX_FILE: &str = "llms.txt";

/// File name of the full-text bundle.
pub const FULL_BUNDLE_FILE: &str = "llms-full.txt";

/// File name of the run metadata record.
pub const METADATA_FILE: &str = "metadata.json";

// ---------------------------------------------------------------------------
// Site
// ---------------------------------------------------------------------------

/// The site a run targets. Immutable once derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    /// Canonical base URL, always ending in `/`.
    pub base_url: Url,
    /// `scheme://host[:port]/`.
    pub origin: Url,
}

impl Site {
    /// Derive a site from user input (scheme defaulted, trailing slash forced).
    pub fn parse(input: &str) -> Result<Self> {
        let base_url = normalize_base_url(input)?;
        Ok(Self::from_base(base_url))
    }

    fn from_base(base_url: Url) -> Self {
        let mut origin = base_url.clone();
        origin.set_path("/");
        Self { base_url, origin }
    }

    /// Path prefix every crawled URL must share (e.g. `/docs/`).
    pub fn base_prefix(&self) -> &str {
        self.base_url.path()
    }

    /// Origin as `scheme://host[:port]`, without a trailing slash.
    pub fn origin_str(&self) -> String {
        origin_of(&self.base_url)
    }

    /// Whether the base URL is the origin root.
    pub fn is_root(&self) -> bool {
        self.base_url.path() == "/"
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url)
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Section a curated link is filed under in the short index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Docs,
    Guides,
    Reference,
    Examples,
    #[serde(rename = "FAQ")]
    Faq,
    Optional,
}

impl Category {
    /// Fixed section order used when rendering the short index.
    pub const RENDER_ORDER: [Category; 6] = [
        Category::Docs,
        Category::Guides,
        Category::Reference,
        Category::Examples,
        Category::Faq,
        Category::Optional,
    ];

    /// Display name (also the lexical tie-break key).
    pub fn name(self) -> &'static str {
        match self {
            Category::Docs => "Docs",
            Category::Guides => "Guides",
            Category::Reference => "Reference",
            Category::Examples => "Examples",
            Category::Faq => "FAQ",
            Category::Optional => "Optional",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// CandidatePage
// ---------------------------------------------------------------------------

/// Where a candidate page's content lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    /// A web page, fetched over HTTP.
    Web { url: Url },
    /// A file inside a cloned repository.
    Repo {
        /// Path relative to the repository root (`/`-separated).
        source_path: String,
        /// Browsable source URL (e.g. a GitHub blob URL).
        blob_url: String,
        /// URL the file is expected to be published at on the site.
        site_url: Option<Url>,
    },
}

/// A page or file considered for the curated set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatePage {
    pub title: String,
    pub category: Category,
    pub source: PageSource,
    /// URL written into the short index for this entry.
    pub link: String,
}

impl CandidatePage {
    /// A web page candidate; the link is the page URL itself.
    pub fn web(url: Url, title: impl Into<String>, category: Category) -> Self {
        let link = url.to_string();
        Self {
            title: title.into(),
            category,
            source: PageSource::Web { url },
            link,
        }
    }

    /// A repository file candidate; the link defaults to the blob URL.
    pub fn repo(
        source_path: impl Into<String>,
        blob_url: impl Into<String>,
        site_url: Option<Url>,
        title: impl Into<String>,
        category: Category,
    ) -> Self {
        let blob_url = blob_url.into();
        Self {
            title: title.into(),
            category,
            link: blob_url.clone(),
            source: PageSource::Repo {
                source_path: source_path.into(),
                blob_url,
                site_url,
            },
        }
    }

    /// Repository-relative path, for repo candidates.
    pub fn source_path(&self) -> Option<&str> {
        match &self.source {
            PageSource::Repo { source_path, .. } => Some(source_path),
            PageSource::Web { .. } => None,
        }
    }

    /// Path used for keyword scoring and depth: the repo path, or the URL path.
    pub fn scoring_path(&self) -> &str {
        match &self.source {
            PageSource::Repo { source_path, .. } => source_path,
            PageSource::Web { url } => url.path(),
        }
    }

    /// Identity used to collapse duplicates during curation.
    pub fn dedup_key(&self) -> String {
        match Url::parse(&self.link) {
            Ok(url) => dedup_key(&url),
            Err(_) => self.link.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Strategy & run metadata
// ---------------------------------------------------------------------------

/// Discovery strategy, in pipeline priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ExistingLlms,
    Repo,
    SitemapOrCrawl,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::ExistingLlms => "existing_llms",
            Strategy::Repo => "repo",
            Strategy::SitemapOrCrawl => "sitemap_or_crawl",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a strategy attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Found,
    NotApplicable,
    Failed,
    Disabled,
}

/// One strategy attempt, recorded in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAttempt {
    pub strategy: Strategy,
    pub outcome: AttemptOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Full-bundle provenance and sizing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FullMeta {
    /// `downloaded`, `generated_from_links`, `repo_pack`, or `converted_pages`.
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_files: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_pages: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropped_pages: Option<usize>,
    /// Final bundle size in bytes.
    pub bytes: u64,
}

/// Checksum record for a written artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub filename: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// The `metadata.json` record, one per run, written last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub schema_version: u32,
    pub run_id: String,
    pub base_url: String,
    pub generated_at: String,
    pub generator: String,
    /// `existing_llms`, `repo`, `sitemap`, or `crawl`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default)]
    pub attempts: Vec<StrategyAttempt>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llms_txt_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llms_full_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovered_urls: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llms_links: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full: Option<FullMeta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<ArtifactMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunMetadata {
    /// Start a fresh record for `site`.
    pub fn new(site: &Site, generator: &str) -> Self {
        Self {
            schema_version: METADATA_SCHEMA_VERSION,
            run_id: uuid::Uuid::now_v7().to_string(),
            base_url: site.base_url.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            generator: generator.to_string(),
            method: None,
            attempts: Vec::new(),
            llms_txt_url: None,
            llms_full_url: None,
            title: None,
            repo: None,
            branch: None,
            docs_root: None,
            discovered_urls: None,
            llms_links: None,
            full: None,
            artifacts: Vec::new(),
            error: None,
        }
    }
}
