//! llms.txt format parser.
//!
//! Reads the format described at <https://llmstxt.org/>:
//! - `# Title`
//! - optional `> summary` blockquote (may span lines)
//! - `## Section` headings followed by Markdown link lists
//! - entries: `- [Name](url)` or `- [Name](url): notes`
//!
//! Published files are often looser than that; nested bullets and relative
//! URLs are accepted, and unrecognised lines are skipped.

use std::collections::HashMap;
use std::sync::LazyLock;

use docsift_shared::canonical::{dedup_key, resolve};
use docsift_shared::{DocsiftError, Result};
use regex::Regex;
use url::Url;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Parsed representation of an llms.txt file.
#[derive(Debug, Clone, Default)]
pub struct LlmsIndex {
    pub title: String,
    pub summary: Option<String>,
    pub sections: Vec<IndexSection>,
    /// Entries across all sections, plus any that appear before the first `##`.
    pub entries: Vec<IndexEntry>,
}

/// A `##` section and its entries.
#[derive(Debug, Clone)]
pub struct IndexSection {
    pub title: String,
    pub entries: Vec<IndexEntry>,
}

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub name: String,
    /// Target as written (may be relative).
    pub url: String,
    pub notes: Option<String>,
}

impl LlmsIndex {
    /// Entry names keyed by the dedup key of their resolved URL.
    ///
    /// The first entry wins when a URL is listed more than once.
    pub fn titles_by_key(&self, base: &Url) -> HashMap<String, String> {
        let mut titles = HashMap::new();
        for entry in &self.entries {
            if let Ok(url) = resolve(base, &entry.url) {
                titles
                    .entry(dedup_key(&url))
                    .or_insert_with(|| entry.name.clone());
            }
        }
        titles
    }
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static H1_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#\s+(.+)$").expect("H1 regex"));

static H2_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^##\s+(.+)$").expect("H2 regex"));

static BLOCKQUOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^>\s*(.*)$").expect("blockquote regex"));

/// `- [Name](url)` with optional `: notes`; `*` bullets allowed.
static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-*+]\s+\[([^\]]+)\]\(([^)\s]+)\)(?:\s*:\s*(.+))?$").expect("entry regex")
});

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse llms.txt content.
///
/// Fails only when there is no leading `# Title`.
pub fn parse_llms_txt(content: &str) -> Result<LlmsIndex> {
    let mut lines = content.lines().map(str::trim).peekable();

    let title = loop {
        match lines.next() {
            Some("") => continue,
            Some(line) => match H1_RE.captures(line) {
                Some(caps) => break caps[1].trim().to_string(),
                None => return Err(DocsiftError::parse("llms.txt must start with '# Title'")),
            },
            None => return Err(DocsiftError::parse("llms.txt is empty")),
        }
    };

    let mut summary_parts: Vec<String> = Vec::new();
    while let Some(&line) = lines.peek() {
        if line.is_empty() {
            lines.next();
            continue;
        }
        match BLOCKQUOTE_RE.captures(line) {
            Some(caps) => {
                let part = caps[1].trim();
                if !part.is_empty() {
                    summary_parts.push(part.to_string());
                }
                lines.next();
            }
            None => break,
        }
    }
    let summary = (!summary_parts.is_empty()).then(|| summary_parts.join(" "));

    let mut index = LlmsIndex {
        title,
        summary,
        ..LlmsIndex::default()
    };
    let mut current: Option<IndexSection> = None;

    for line in lines.filter(|l| !l.is_empty()) {
        if let Some(caps) = H2_RE.captures(line) {
            index.sections.extend(current.take());
            current = Some(IndexSection {
                title: caps[1].trim().to_string(),
                entries: Vec::new(),
            });
        } else if let Some(caps) = ENTRY_RE.captures(line) {
            let entry = IndexEntry {
                name: caps[1].trim().to_string(),
                url: caps[2].trim().to_string(),
                notes: caps.get(3).map(|m| m.as_str().trim().to_string()),
            };
            if let Some(section) = current.as_mut() {
                section.entries.push(entry.clone());
            }
            index.entries.push(entry);
        }
    }
    index.sections.extend(current);

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDGET_INDEX: &str = "\
# Widget Docs

> Everything about widgets.
> Second summary line.

Some intro prose that is ignored.

## Getting Started

- [Installation](https://widget.dev/docs/install): How to install
- [Quickstart](/docs/quickstart)

## Reference

  - [API](api/index.md): Full API
* [CLI](https://widget.dev/docs/cli)
";

    #[test]
    fn parses_title_summary_sections_and_entries() {
        let parsed = parse_llms_txt(WIDGET_INDEX).unwrap();

        assert_eq!(parsed.title, "Widget Docs");
        assert_eq!(
            parsed.summary.as_deref(),
            Some("Everything about widgets. Second summary line.")
        );
        assert_eq!(parsed.sections.len(), 2);
        assert_eq!(parsed.sections[0].title, "Getting Started");
        assert_eq!(parsed.sections[0].entries.len(), 2);
        assert_eq!(parsed.sections[1].entries.len(), 2);
        assert_eq!(parsed.entries.len(), 4);

        let first = &parsed.entries[0];
        assert_eq!(first.name, "Installation");
        assert_eq!(first.url, "https://widget.dev/docs/install");
        assert_eq!(first.notes.as_deref(), Some("How to install"));
        assert!(parsed.entries[1].notes.is_none());
    }

    #[test]
    fn entries_before_first_section_are_kept() {
        let parsed = parse_llms_txt("# Minimal\n> tiny\n- [Home](https://m.dev/)\n").unwrap();
        assert!(parsed.sections.is_empty());
        assert_eq!(parsed.entries.len(), 1);
    }

    #[test]
    fn missing_h1_is_a_parse_error() {
        assert!(matches!(
            parse_llms_txt("just text\n- [A](a)"),
            Err(DocsiftError::Parse { .. })
        ));
        assert!(parse_llms_txt("   \n\n").is_err());
    }

    #[test]
    fn titles_are_keyed_by_resolved_url() {
        let parsed = parse_llms_txt(WIDGET_INDEX).unwrap();
        let base = Url::parse("https://widget.dev/llms.txt").unwrap();
        let titles = parsed.titles_by_key(&base);

        assert_eq!(
            titles.get("https://widget.dev/docs/quickstart").map(String::as_str),
            Some("Quickstart")
        );
        assert_eq!(
            titles.get("https://widget.dev/api/index.md").map(String::as_str),
            Some("API")
        );
    }
}
