//! Discovery strategies, tried in priority order by the pipeline.
//!
//! Each strategy builds its artifacts in memory and reports a tagged
//! [`Outcome`]; nothing is written to disk until the pipeline has a winner.

mod crawl;
mod existing;
mod repo;

use std::path::PathBuf;

use docsift_fetch::Fetcher;
use docsift_shared::{DocsiftError, FullMeta, RunConfig, RunMetadata, Site};

use crate::convert::ContentConverter;
use crate::pipeline::ProgressReporter;

pub use crawl::from_sitemap_or_crawl;
pub use existing::from_existing;
pub use repo::from_repo;

/// Summary line of generated short indexes.
pub(crate) fn site_summary(site: &Site) -> String {
    format!("Documentation extracted from {}", site.base_url)
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of one strategy attempt.
#[derive(Debug)]
pub enum Outcome {
    /// Usable artifacts were produced.
    Found(Generated),
    /// The strategy's precondition did not hold (nothing published, no repository).
    NotApplicable(String),
    /// The strategy applied but could not finish.
    Failed(DocsiftError),
}

/// Strategy-specific fields recorded in `metadata.json`.
#[derive(Debug, Clone, Default)]
pub struct MethodDetails {
    pub llms_txt_url: Option<String>,
    pub llms_full_url: Option<String>,
    pub repo: Option<String>,
    pub branch: Option<String>,
    pub docs_root: Option<String>,
    pub discovered_urls: Option<usize>,
}

/// Artifacts produced by a successful strategy.
#[derive(Debug, Clone)]
pub struct Generated {
    /// `existing_llms`, `repo`, `sitemap` or `crawl`.
    pub method: &'static str,
    pub title: Option<String>,
    pub short_index: Vec<u8>,
    pub full_bundle: Vec<u8>,
    pub llms_links: usize,
    pub full: FullMeta,
    pub details: MethodDetails,
}

impl Generated {
    /// Copy everything but the artifact bytes into `meta`.
    pub fn annotate(&self, meta: &mut RunMetadata) {
        meta.method = Some(self.method.to_string());
        meta.title = self.title.clone();
        meta.llms_links = Some(self.llms_links);
        meta.full = Some(FullMeta {
            bytes: self.full_bundle.len() as u64,
            ..self.full.clone()
        });
        meta.llms_txt_url = self.details.llms_txt_url.clone();
        meta.llms_full_url = self.details.llms_full_url.clone();
        meta.repo = self.details.repo.clone();
        meta.branch = self.details.branch.clone();
        meta.docs_root = self.details.docs_root.clone();
        meta.discovered_urls = self.details.discovered_urls;
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// What every strategy gets to work with.
pub struct StrategyContext<'a> {
    pub site: &'a Site,
    pub config: &'a RunConfig,
    pub fetcher: Fetcher,
    pub converter: ContentConverter,
    /// `<out_dir>/<slug>`, where the repository checkout is cached.
    pub site_dir: PathBuf,
    pub progress: &'a dyn ProgressReporter,
}
