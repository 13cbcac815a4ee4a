//! Strategy 1: adopt a published `llms.txt`.

use docsift_artifacts::assemble_web_bundle;
use docsift_fetch::{fallback_title_from_url, fan_out};
use docsift_shared::FullMeta;
use docsift_shared::canonical::dedup_key;
use tracing::{info, instrument};

use super::{Generated, MethodDetails, Outcome, StrategyContext};
use crate::convert::PageRef;

/// Copy a published short index byte-for-byte.
///
/// A published full bundle is used as-is; otherwise one is synthesized by
/// converting the index's links, capped at `max_pages`.
#[instrument(skip_all, fields(site = %ctx.site))]
pub async fn from_existing(ctx: &StrategyContext<'_>) -> Outcome {
    ctx.progress.phase("Checking for a published llms.txt");
    let Some(existing) = docsift_discovery::detect(&ctx.fetcher, ctx.site).await else {
        return Outcome::NotApplicable("no llms.txt found".to_string());
    };

    let parsed = existing.parsed();
    let links = existing.links();
    let mut details = MethodDetails {
        llms_txt_url: Some(existing.short_index.url.to_string()),
        ..MethodDetails::default()
    };

    let (full_bundle, full) = match &existing.full_bundle {
        Some(published) => {
            details.llms_full_url = Some(published.url.to_string());
            let full = FullMeta {
                source: "downloaded".to_string(),
                ..FullMeta::default()
            };
            (published.body.clone(), full)
        }
        None => {
            let pages: Vec<_> = links.iter().take(ctx.config.max_pages).cloned().collect();
            ctx.progress
                .phase(&format!("Synthesizing llms-full.txt from {} links", pages.len()));

            let known = parsed
                .as_ref()
                .map(|index| index.titles_by_key(&existing.short_index.url))
                .unwrap_or_default();

            // Index link text names the document; otherwise ask the page.
            let fetcher = ctx.fetcher.clone();
            let titles = fan_out(pages.clone(), ctx.config.concurrency, move |url| {
                let fetcher = fetcher.clone();
                let known = known.get(&dedup_key(&url)).cloned();
                async move {
                    match known {
                        Some(title) => title,
                        None => fetcher.title_for(&url).await,
                    }
                }
            })
            .await;

            let refs: Vec<PageRef> = pages
                .into_iter()
                .zip(titles)
                .map(|(url, title)| PageRef {
                    title: title.unwrap_or_else(|| fallback_title_from_url(&url)),
                    url,
                })
                .collect();

            let docs = ctx.converter.convert_all(refs, ctx.config.concurrency).await;
            let bundle = assemble_web_bundle(docs, ctx.config.max_full_bytes, ctx.config.force_full);
            let full = FullMeta {
                source: "generated_from_links".to_string(),
                converted_pages: Some(bundle.included),
                dropped_pages: Some(bundle.dropped),
                ..FullMeta::default()
            };
            (bundle.text.into_bytes(), full)
        }
    };

    info!(
        links = links.len(),
        full_source = %full.source,
        full_bytes = full_bundle.len(),
        "adopted published llms.txt"
    );

    Outcome::Found(Generated {
        method: "existing_llms",
        title: parsed.map(|index| index.title),
        short_index: existing.short_index.body.clone(),
        full_bundle,
        llms_links: links.len(),
        full,
        details,
    })
}
