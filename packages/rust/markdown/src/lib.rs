//! In-process HTML-to-Markdown conversion.
//!
//! Used when a documentation page has no Markdown sibling and no external
//! converter is configured. The page's main content container is picked out,
//! tables are rendered by hand (`htmd` does not handle them), the rest goes
//! through `htmd`, and the result is tidied by a fixed series of cleanup passes.

mod cleanup;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use docsift_shared::{DocsiftError, Result};

pub use cleanup::tidy;

/// Tags dropped wholesale during conversion.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "nav", "iframe", "noscript", "svg", "footer", "button", "form",
];

// ---------------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------------

/// Content containers of common documentation generators, most specific first.
static CONTENT_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        ".theme-doc-markdown",
        "article .markdown",
        ".vp-doc",
        ".md-content",
        ".markdown-section",
        ".rst-content [role=\"main\"]",
        "[role=\"main\"]",
        "article",
        "main",
        ".content",
        "body",
    ]
    .iter()
    .map(|s| Selector::parse(s).expect("content selector"))
    .collect()
});

static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").expect("table selector"));
static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("row selector"));
static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th, td").expect("cell selector"));
static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").expect("title selector"));

static H1_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^# (.+)$").expect("h1 regex"));

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// A converted page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownPage {
    /// Cleaned Markdown body, ending in a single newline.
    pub markdown: String,
    /// First H1 of the converted body, else the document `<title>`.
    pub title: Option<String>,
}

impl MarkdownPage {
    pub fn is_blank(&self) -> bool {
        self.markdown.trim().is_empty()
    }
}

/// Convert an HTML document to Markdown, resolving relative links against
/// `source_url`.
#[instrument(skip(html), fields(url = %source_url, html_len = html.len()))]
pub fn html_to_markdown(html: &str, source_url: &Url) -> Result<MarkdownPage> {
    let (content_html, doc_title) = extract_content(html);
    let (content_html, tables) = stash_tables(&content_html);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build();
    let raw = converter
        .convert(&content_html)
        .map_err(|e| DocsiftError::Conversion(format!("htmd failed for {source_url}: {e}")))?;

    let markdown = tidy(&restore_tables(&raw, &tables), Some(source_url));
    let title = H1_RE
        .captures(&markdown)
        .map(|c| c[1].trim().to_string())
        .filter(|t| !t.is_empty())
        .or(doc_title);

    debug!(raw_len = raw.len(), md_len = markdown.len(), "converted page");
    Ok(MarkdownPage { markdown, title })
}

// ---------------------------------------------------------------------------
// Content extraction
// ---------------------------------------------------------------------------

/// Inner HTML of the first matching content container, plus the `<title>`.
fn extract_content(html: &str) -> (String, Option<String>) {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&TITLE_SEL)
        .next()
        .map(|t| t.text().collect::<Vec<_>>().join(" "))
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty());

    let content = CONTENT_SELECTORS
        .iter()
        .find_map(|sel| doc.select(sel).next())
        .map(|el| el.inner_html())
        .unwrap_or_else(|| html.to_string());

    (content, title)
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Swap every `<table>` for a placeholder paragraph; the pipe tables are
/// spliced back in after `htmd` has run.
fn stash_tables(html: &str) -> (String, Vec<String>) {
    let fragment = Html::parse_fragment(html);
    let tables: Vec<(String, String)> = fragment
        .select(&TABLE_SEL)
        .map(|table| (table.html(), pipe_table(&table)))
        .collect();

    if tables.is_empty() {
        return (html.to_string(), Vec::new());
    }

    // Re-serialise so the outer HTML of each table matches byte for byte.
    let mut out = fragment.root_element().inner_html();
    let mut stashed = Vec::with_capacity(tables.len());
    for (i, (table_html, markdown)) in tables.into_iter().enumerate() {
        out = out.replacen(&table_html, &format!("<p>{}</p>", placeholder(i)), 1);
        stashed.push(markdown);
    }
    (out, stashed)
}

fn placeholder(i: usize) -> String {
    format!("DOCSIFTTABLE{i}X")
}

fn restore_tables(markdown: &str, tables: &[String]) -> String {
    tables
        .iter()
        .enumerate()
        .fold(markdown.to_string(), |md, (i, table)| md.replacen(&placeholder(i), table.trim(), 1))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

fn pipe_table(table: &ElementRef<'_>) -> String {
    let mut header: Option<Vec<String>> = None;
    let mut body: Vec<Vec<String>> = Vec::new();

    for row in table.select(&ROW_SEL) {
        let cells: Vec<ElementRef<'_>> = row.select(&CELL_SEL).collect();
        if cells.is_empty() {
            continue;
        }
        let all_heads = cells.iter().all(|c| c.value().name() == "th");
        let texts: Vec<String> = cells.into_iter().map(cell_text).collect();
        if all_heads && header.is_none() && body.is_empty() {
            header = Some(texts);
        } else {
            body.push(texts);
        }
    }

    let header = match header {
        Some(h) => h,
        None if !body.is_empty() => body.remove(0),
        None => return String::new(),
    };

    let width = body
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);
    if width == 0 {
        return String::new();
    }

    let line = |cells: &[String]| {
        let mut padded: Vec<&str> = cells.iter().map(String::as_str).collect();
        padded.resize(width, "");
        format!("| {} |\n", padded.join(" | "))
    };

    let mut md = line(&header);
    md.push_str(&line(&vec!["---".to_string(); width]));
    for row in &body {
        md.push_str(&line(row));
    }
    md
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert(html: &str, url: &str) -> MarkdownPage {
        html_to_markdown(html, &Url::parse(url).unwrap()).unwrap()
    }

    #[test]
    fn prefers_main_content_over_chrome() {
        let page = convert(
            r#"<html><head><title>Install | Widget</title></head><body>
                <nav><a href="/">Home</a></nav>
                <main><h1>Install</h1><p>Run the <strong>installer</strong>.</p></main>
                <footer><p>Copyright 2026</p></footer>
            </body></html>"#,
            "https://docs.example.com/install/",
        );

        assert!(page.markdown.starts_with("# Install\n"));
        assert!(page.markdown.contains("**installer**"));
        assert!(!page.markdown.contains("Home"));
        assert!(!page.markdown.contains("Copyright"));
        assert_eq!(page.title.as_deref(), Some("Install"));
    }

    #[test]
    fn generator_container_beats_generic_main() {
        let page = convert(
            r#"<html><body><main>
                <div class="sidebar">Sidebar links</div>
                <div class="vp-doc"><h1>Guide</h1><p>Body text.</p></div>
            </main></body></html>"#,
            "https://docs.example.com/guide/",
        );
        assert!(page.markdown.contains("Body text."));
        assert!(!page.markdown.contains("Sidebar links"));
    }

    #[test]
    fn falls_back_to_document_title_and_body() {
        let page = convert(
            "<html><head><title>  Plain\n Page </title></head><body><p>Only a paragraph.</p></body></html>",
            "https://example.com/plain",
        );
        assert_eq!(page.title.as_deref(), Some("Plain Page"));
        assert!(page.markdown.contains("Only a paragraph."));
    }

    #[test]
    fn renders_tables_as_pipe_tables() {
        let page = convert(
            r#"<html><body><main>
                <h1>Options</h1>
                <table>
                    <thead><tr><th>Name</th><th>Default</th></tr></thead>
                    <tbody>
                        <tr><td>verbose</td><td>false</td></tr>
                        <tr><td>a|b</td></tr>
                    </tbody>
                </table>
            </main></body></html>"#,
            "https://example.com/options",
        );

        assert!(page.markdown.contains("| Name | Default |"));
        assert!(page.markdown.contains("| --- | --- |"));
        assert!(page.markdown.contains("| verbose | false |\n"));
        assert!(page.markdown.contains(r"| a\|b |  |"));
        assert!(!page.markdown.contains("DOCSIFTTABLE"));
    }

    #[test]
    fn headerless_table_promotes_first_row() {
        let fragment = Html::parse_fragment("<table><tr><td>k</td><td>v</td></tr><tr><td>x</td><td>y</td></tr></table>");
        let table = fragment.select(&TABLE_SEL).next().unwrap();
        assert_eq!(pipe_table(&table), "| k | v |\n| --- | --- |\n| x | y |\n");
    }

    #[test]
    fn relative_links_are_resolved() {
        let page = convert(
            r##"<html><body><article><p>See <a href="../api/">the API</a> and <a href="#opts">options</a>.</p></article></body></html>"##,
            "https://docs.example.com/guide/setup/",
        );
        assert!(page.markdown.contains("[the API](https://docs.example.com/guide/api/)"));
        assert!(page.markdown.contains("[options](#opts)"));
    }

    #[test]
    fn code_blocks_survive() {
        let page = convert(
            r#"<html><body><main><h1>Run</h1><pre><code>cargo install widget</code></pre></main></body></html>"#,
            "https://example.com/run",
        );
        assert!(page.markdown.contains("```"));
        assert!(page.markdown.contains("cargo install widget"));
    }

    #[test]
    fn empty_body_is_blank() {
        let page = convert("<html><body></body></html>", "https://example.com/empty");
        assert!(page.is_blank());
        assert_eq!(page.title, None);
    }
}
