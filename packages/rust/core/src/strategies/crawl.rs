//! Strategy 3: find pages through a sitemap or a bounded crawl, curate them,
//! and convert the curated pages into the full bundle.

use docsift_artifacts::{IndexHeader, assemble_web_bundle, render_short_index};
use docsift_crawler::{CrawlOptions, Crawler, discover_sitemap};
use docsift_fetch::{fallback_title_from_url, fan_out};
use docsift_shared::{CandidatePage, DocsiftError, FullMeta};
use tracing::{info, instrument};
use url::Url;

use super::{Generated, MethodDetails, Outcome, StrategyContext, site_summary};
use crate::convert::PageRef;
use crate::curate::{classify, select};

#[instrument(skip_all, fields(site = %ctx.site))]
pub async fn from_sitemap_or_crawl(ctx: &StrategyContext<'_>) -> Outcome {
    let config = ctx.config;

    let (method, pages) = match sitemap_pages(ctx).await {
        Some(pages) => ("sitemap", pages),
        None => ("crawl", crawl_pages(ctx).await),
    };
    if pages.is_empty() {
        return Outcome::Failed(DocsiftError::Transport(format!(
            "no pages reachable from {}",
            ctx.site.base_url
        )));
    }
    let discovered = pages.len();
    info!(method, discovered, "pages discovered");

    ctx.progress.phase("Curating links");
    let candidates: Vec<CandidatePage> = pages
        .into_iter()
        .map(|page| {
            let category = classify(&page.title, page.url.path());
            CandidatePage::web(page.url, page.title, category)
        })
        .collect();
    let curated = select(candidates, config.max_links);

    let header = IndexHeader {
        title: ctx.fetcher.title_for(&ctx.site.base_url).await,
        summary: site_summary(ctx.site),
        full_hint: None,
    };
    let short_index = render_short_index(&header, &curated, false);

    ctx.progress
        .phase(&format!("Converting {} pages for llms-full.txt", curated.len()));
    let refs: Vec<PageRef> = curated
        .iter()
        .filter_map(|page| {
            Url::parse(&page.link).ok().map(|url| PageRef {
                title: page.title.clone(),
                url,
            })
        })
        .collect();
    let docs = ctx.converter.convert_all(refs, config.concurrency).await;
    let bundle = assemble_web_bundle(docs, config.max_full_bytes, config.force_full);

    Outcome::Found(Generated {
        method,
        title: Some(header.title),
        short_index: short_index.into_bytes(),
        full_bundle: bundle.text.into_bytes(),
        llms_links: curated.len(),
        full: FullMeta {
            source: "converted_pages".to_string(),
            converted_pages: Some(bundle.included),
            dropped_pages: Some(bundle.dropped),
            ..FullMeta::default()
        },
        details: MethodDetails {
            discovered_urls: Some(discovered),
            ..MethodDetails::default()
        },
    })
}

/// A discovered page and its title.
struct TitledPage {
    url: Url,
    title: String,
}

/// In-scope sitemap URLs, titled, or `None` when no sitemap lists any.
async fn sitemap_pages(ctx: &StrategyContext<'_>) -> Option<Vec<TitledPage>> {
    ctx.progress.phase("Looking for a sitemap");
    let hit = discover_sitemap(&ctx.fetcher, ctx.site, ctx.config.max_pages, ctx.config.concurrency).await?;
    let urls = hit.urls;

    ctx.progress.phase(&format!("Fetching titles for {} pages", urls.len()));
    let fetcher = ctx.fetcher.clone();
    let titles = fan_out(urls.clone(), ctx.config.concurrency, move |url| {
        let fetcher = fetcher.clone();
        async move { fetcher.title_for(&url).await }
    })
    .await;

    Some(
        urls.into_iter()
            .zip(titles)
            .map(|(url, title)| TitledPage {
                title: title.unwrap_or_else(|| fallback_title_from_url(&url)),
                url,
            })
            .collect(),
    )
}

async fn crawl_pages(ctx: &StrategyContext<'_>) -> Vec<TitledPage> {
    ctx.progress.phase(&format!(
        "Crawling (max {} pages, depth {})",
        ctx.config.max_pages, ctx.config.max_depth
    ));
    let crawler = Crawler::new(ctx.fetcher.clone(), CrawlOptions::from(ctx.config));
    let result = crawler.crawl(ctx.site).await;
    info!(
        visited = result.visited,
        skipped = result.skipped,
        pages = result.pages.len(),
        duration_ms = result.duration.as_millis() as u64,
        "crawl complete"
    );

    result
        .pages
        .into_iter()
        .take(ctx.config.max_pages)
        .map(|page| TitledPage {
            title: page.title.unwrap_or_else(|| fallback_title_from_url(&page.url)),
            url: page.url,
        })
        .collect()
}
