//! Strategy 2: build both artifacts from the site's source repository.

use std::collections::HashSet;

use docsift_artifacts::{IndexHeader, Packer, choose_repo_scope, render_short_index, repo_bundle_header};
use docsift_fetch::fan_out;
use docsift_repo::{DocsFile, clone_destination, clone_repo, collect_docs_files, locate_docs_root};
use docsift_repo::{discover_repo, site_url_for, title_from_markdown_file};
use docsift_shared::{CandidatePage, DocsiftError, FullMeta, PageSource};
use tracing::{debug, info, instrument};

use super::{Generated, MethodDetails, Outcome, StrategyContext, site_summary};
use crate::curate::{classify, select};

#[instrument(skip_all, fields(site = %ctx.site))]
pub async fn from_repo(ctx: &StrategyContext<'_>) -> Outcome {
    let config = ctx.config;

    ctx.progress.phase("Looking for a source repository");
    let Some(repo) = discover_repo(&ctx.fetcher, ctx.site, &config.repo_host).await else {
        return Outcome::NotApplicable("no repository link found".to_string());
    };

    ctx.progress.phase(&format!("Cloning {}", repo.full_name()));
    let dest = clone_destination(&ctx.site_dir, &repo);
    let cloned = match clone_repo(&repo, &dest, &config.git_program).await {
        Ok(cloned) => cloned,
        Err(e) => return Outcome::Failed(e),
    };

    ctx.progress.phase("Locating documentation root");
    let Some(root) = locate_docs_root(&cloned, ctx.site) else {
        return Outcome::Failed(DocsiftError::NoDocsRoot(repo.url.clone()));
    };
    let files = match collect_docs_files(&cloned.local_path, &root) {
        Ok(files) if files.is_empty() => {
            return Outcome::Failed(DocsiftError::NoDocsFiles(root.relative.clone()));
        }
        Ok(files) => files,
        Err(e) => return Outcome::Failed(e),
    };
    info!(
        repo = %repo.url,
        branch = %cloned.default_branch,
        docs_root = %root.relative,
        files = files.len(),
        "documentation root located"
    );

    ctx.progress.phase("Curating links");
    let candidates: Vec<CandidatePage> = files
        .iter()
        .map(|file| {
            let title = title_from_markdown_file(&file.path);
            let category = classify(&title, &file.repo_path);
            CandidatePage::repo(
                file.repo_path.clone(),
                repo.blob_url(&cloned.default_branch, &file.repo_path),
                site_url_for(&ctx.site.base_url, &file.root_path),
                title,
                category,
            )
        })
        .collect();
    let curated = prefer_site_links(ctx, select(candidates, config.max_links)).await;

    let curated_paths: HashSet<&str> = curated.iter().filter_map(|page| page.source_path()).collect();
    let curated_files: Vec<DocsFile> = files
        .iter()
        .filter(|file| curated_paths.contains(file.repo_path.as_str()))
        .cloned()
        .collect();

    let header = IndexHeader {
        title: ctx.fetcher.title_for(&ctx.site.base_url).await,
        summary: site_summary(ctx.site),
        full_hint: None,
    };
    let short_index = render_short_index(&header, &curated, config.include_source_links);

    ctx.progress.phase("Packing llms-full.txt");
    let scope = choose_repo_scope(
        &files,
        &curated_files,
        config.full_scope,
        config.max_full_bytes,
        config.force_full,
    );
    let bundle_header = repo_bundle_header(&repo.url, &root.relative, &chrono::Utc::now().to_rfc3339());
    let packer = Packer::from(config.packer);
    let full_bundle = match packer
        .pack_or_builtin(&bundle_header, &scope.files, &ctx.site_dir)
        .await
    {
        Ok(text) => text,
        Err(e) => return Outcome::Failed(e),
    };

    Outcome::Found(Generated {
        method: "repo",
        title: Some(header.title),
        short_index: short_index.into_bytes(),
        full_bundle: full_bundle.into_bytes(),
        llms_links: curated.len(),
        full: FullMeta {
            source: "repo_pack".to_string(),
            scope_used: Some(scope.scope_used.as_str().to_string()),
            docs_files: Some(scope.files.len()),
            estimated_bytes: Some(scope.estimated_bytes),
            ..FullMeta::default()
        },
        details: MethodDetails {
            repo: Some(repo.url.clone()),
            branch: Some(cloned.default_branch.clone()),
            docs_root: Some(root.relative.clone()),
            ..MethodDetails::default()
        },
    })
}

/// Link curated files to their published page when it exists.
///
/// Site URLs are probed concurrently. A page already linked by a
/// higher-ranked entry keeps its blob link instead.
async fn prefer_site_links(ctx: &StrategyContext<'_>, curated: Vec<CandidatePage>) -> Vec<CandidatePage> {
    let site_urls: Vec<_> = curated
        .iter()
        .map(|page| match &page.source {
            PageSource::Repo { site_url, .. } => site_url.clone(),
            PageSource::Web { .. } => None,
        })
        .collect();

    let fetcher = ctx.fetcher.clone();
    let live = fan_out(site_urls.clone(), ctx.config.concurrency, move |url| {
        let fetcher = fetcher.clone();
        async move {
            match url {
                Some(url) => fetcher.exists(&url).await,
                None => false,
            }
        }
    })
    .await;

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(curated.len());
    for ((mut page, site_url), live) in curated.into_iter().zip(site_urls).zip(live) {
        if let (Some(url), Some(true)) = (site_url, live) {
            let candidate = CandidatePage { link: url.to_string(), ..page.clone() };
            if !seen.contains(&candidate.dedup_key()) {
                page = candidate;
            } else {
                debug!(link = %url, "site page already linked, keeping blob link");
            }
        }
        seen.insert(page.dedup_key());
        out.push(page);
    }
    out
}
