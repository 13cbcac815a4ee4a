//! Short-index (`llms.txt`) renderer.

use std::collections::HashMap;

use docsift_shared::{CandidatePage, Category, PageSource};

/// Line placed between the header and the first section.
pub const INDEX_GUIDANCE: &str =
    "Use the links below as the canonical entry points. Prefer docs pages over blog/marketing pages.";

/// Title block of a rendered index.
#[derive(Debug, Clone)]
pub struct IndexHeader {
    pub title: String,
    pub summary: String,
    /// Where the full bundle lives, when it is worth advertising.
    pub full_hint: Option<String>,
}

/// Render curated items as an `llms.txt` document.
///
/// Sections follow [`Category::RENDER_ORDER`], empty ones are omitted, and
/// entries within a section are sorted by lower-cased title. With
/// `include_source_links`, repository items whose link is not their blob URL
/// get a ` (source: <blob>)` suffix.
pub fn render_short_index(header: &IndexHeader, items: &[CandidatePage], include_source_links: bool) -> String {
    let mut by_category: HashMap<Category, Vec<&CandidatePage>> = HashMap::new();
    for item in items {
        by_category.entry(item.category).or_default().push(item);
    }

    let mut lines: Vec<String> = vec![
        format!("# {}", header.title),
        format!("> {}", header.summary),
        String::new(),
    ];
    if let Some(hint) = &header.full_hint {
        lines.push(format!("Full text bundle: {hint}"));
        lines.push(String::new());
    }
    lines.push(INDEX_GUIDANCE.to_string());
    lines.push(String::new());

    for category in Category::RENDER_ORDER {
        let Some(section) = by_category.get_mut(&category) else {
            continue;
        };
        section.sort_by_cached_key(|item| item.title.to_lowercase());

        lines.push(format!("## {category}"));
        lines.extend(section.iter().map(|item| bullet(item, include_source_links)));
        lines.push(String::new());
    }

    format!("{}\n", lines.join("\n").trim_end())
}

fn bullet(item: &CandidatePage, include_source_links: bool) -> String {
    let mut line = format!("- [{}]({})", item.title, item.link);
    if include_source_links {
        if let PageSource::Repo { blob_url, .. } = &item.source {
            if *blob_url != item.link {
                line.push_str(&format!(" (source: {blob_url})"));
            }
        }
    }
    line
}
