//! Finding the source repository a documentation site is built from.

use std::collections::HashMap;

use docsift_fetch::{DEFAULT_MAX_BYTES, Fetcher, extract_hrefs};
use docsift_shared::Site;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

/// A repository on the configured forge host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    /// `https://<host>/<owner>/<repo>`
    pub url: String,
}

impl RepoRef {
    pub fn new(host: &str, owner: &str, repo: &str) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            url: format!("https://{host}/{owner}/{repo}"),
        }
    }

    /// Browsable URL of `rel_path` at `branch`.
    pub fn blob_url(&self, branch: &str, rel_path: &str) -> String {
        format!("{}/blob/{branch}/{rel_path}", self.url)
    }

    /// `<owner>/<repo>`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn score(&self, occurrences: usize) -> usize {
        let name = self.repo.to_lowercase();
        let mut score = occurrences;
        // "doc" also covers "docs" and "documentation".
        if name.contains("doc") {
            score += 3;
        }
        // "site" also covers "website".
        if name.contains("site") {
            score += 2;
        }
        score
    }
}

fn repo_pattern(host: &str) -> Option<Regex> {
    let pattern = format!(
        r"(?i)(?:https?:)?//(?:www\.)?{}/([A-Za-z0-9_.\-]+)/([A-Za-z0-9_.\-]+)",
        regex::escape(host)
    );
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(host, error = %e, "cannot build repository pattern");
            None
        }
    }
}

/// Every repository reference in `text`, best first.
///
/// Ranking: occurrence count, +3 when the name mentions docs, +2 when it
/// mentions a site; ties go to the lexically smaller URL.
pub fn extract_repo_refs(text: &str, host: &str) -> Vec<RepoRef> {
    let Some(re) = repo_pattern(host) else {
        return Vec::new();
    };

    let mut counts: HashMap<(String, String), usize> = HashMap::new();
    for caps in re.captures_iter(text) {
        let owner = &caps[1];
        let repo = caps[2].trim_end_matches(".git");
        if owner.is_empty() || repo.is_empty() || repo.starts_with('.') {
            continue;
        }
        *counts
            .entry((owner.to_string(), repo.to_string()))
            .or_default() += 1;
    }

    let mut scored: Vec<(usize, RepoRef)> = counts
        .into_iter()
        .map(|((owner, repo), count)| {
            let r = RepoRef::new(host, &owner, &repo);
            (r.score(count), r)
        })
        .collect();
    scored.sort_by(|(sa, ra), (sb, rb)| sb.cmp(sa).then_with(|| ra.url.cmp(&rb.url)));
    scored.into_iter().map(|(_, r)| r).collect()
}

/// Look for a repository link on the base page, then on the origin root.
#[instrument(skip_all, fields(site = %site, host))]
pub async fn discover_repo(fetcher: &Fetcher, site: &Site, host: &str) -> Option<RepoRef> {
    let mut pages = vec![site.base_url.clone()];
    if site.origin != site.base_url {
        pages.push(site.origin.clone());
    }

    for page in pages {
        let result = fetcher.fetch(&page, DEFAULT_MAX_BYTES).await;
        if !result.has_content() {
            debug!(url = %page, status = result.status, "no page to scan for repositories");
            continue;
        }

        let html = result.text();
        let mut haystack = extract_hrefs(&html);
        haystack.push(html);
        let refs = extract_repo_refs(&haystack.join("\n"), host);

        if let Some(best) = refs.into_iter().next() {
            info!(url = %page, repo = %best.url, "repository discovered");
            return Some(best);
        }
    }

    debug!("no repository reference found");
    None
}
