//! Inventory of documentation files under a docs root.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use docsift_shared::{DocsiftError, Result};
use regex::Regex;
use url::Url;

use crate::docs_root::{DocsRoot, docs_file_paths};

/// Only the head of a file is read when looking for its title.
const TITLE_SCAN_BYTES: u64 = 80_000;

static H1_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s+(.+?)\s*$").expect("h1 line regex"));

static DOC_EXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(md|mdx|markdown|rst)$").expect("doc extension regex"));

/// One documentation file in a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsFile {
    pub path: PathBuf,
    /// Relative to the checkout root, `/`-separated.
    pub repo_path: String,
    /// Relative to the docs root, `/`-separated.
    pub root_path: String,
    pub size: u64,
}

fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// All documentation files under `docs_root`, sorted by path.
pub fn collect_docs_files(checkout: &Path, docs_root: &DocsRoot) -> Result<Vec<DocsFile>> {
    docs_file_paths(&docs_root.path)
        .into_iter()
        .map(|path| {
            let size = std::fs::metadata(&path)
                .map_err(|e| DocsiftError::io(&path, e))?
                .len();
            let repo_path = slash_path(path.strip_prefix(checkout).unwrap_or(&path));
            let root_path = slash_path(path.strip_prefix(&docs_root.path).unwrap_or(&path));
            Ok(DocsFile {
                path,
                repo_path,
                root_path,
                size,
            })
        })
        .collect()
}

/// First `# ` heading after any `---`/`+++` frontmatter, else the file stem
/// with separators as spaces and words capitalized.
pub fn title_from_markdown_file(path: &Path) -> String {
    let mut head = String::new();
    if let Ok(file) = std::fs::File::open(path) {
        let mut bytes = Vec::new();
        if file.take(TITLE_SCAN_BYTES).read_to_end(&mut bytes).is_ok() {
            head = String::from_utf8_lossy(&bytes).into_owned();
        }
    }

    title_from_markdown(&head).unwrap_or_else(|| title_from_stem(path))
}

fn title_from_markdown(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let mut start = 0;
    if let Some(first) = lines.first().map(|l| l.trim()) {
        if first == "---" || first == "+++" {
            start = lines[1..]
                .iter()
                .position(|l| l.trim() == first)
                .map(|i| i + 2)
                .unwrap_or(lines.len());
        }
    }

    lines[start..]
        .iter()
        .find_map(|line| H1_LINE_RE.captures(line).map(|c| c[1].trim().to_string()))
        .filter(|t| !t.is_empty())
}

fn title_from_stem(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let words: Vec<String> = stem
        .split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect();
    if words.is_empty() {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        words.join(" ")
    }
}

/// URL a docs-root-relative file is expected to be published at.
///
/// The extension is dropped, `README` becomes `index`, a trailing `index`
/// maps to its directory, and a trailing slash is kept.
pub fn site_url_for(base_url: &Url, root_path: &str) -> Option<Url> {
    let without_ext = DOC_EXT_RE.replace(root_path, "");
    let mut segments: Vec<String> = without_ext
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.eq_ignore_ascii_case("readme") {
                "index".to_string()
            } else {
                s.to_string()
            }
        })
        .collect();
    if segments.last().is_some_and(|s| s == "index") {
        segments.pop();
    }

    let rel = if segments.is_empty() {
        String::new()
    } else {
        format!("{}/", segments.join("/"))
    };
    base_url.join(&rel).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docs_root::DocsRootRule;

    #[test]
    fn title_skips_frontmatter() {
        let text = "---\ntitle: ignored\n# not this\n---\n\nIntro\n# Real Title  \n";
        assert_eq!(title_from_markdown(text).as_deref(), Some("Real Title"));
        assert_eq!(title_from_markdown("+++\na = 1\n+++\n# Toml"), Some("Toml".into()));
        assert_eq!(title_from_markdown("## Only h2\n"), None);
    }

    #[test]
    fn title_falls_back_to_stem() {
        assert_eq!(title_from_stem(Path::new("docs/getting_started-guide.md")), "Getting Started Guide");
        assert_eq!(
            title_from_markdown_file(Path::new("/definitely/missing/quick-start.md")),
            "Quick Start"
        );
    }

    #[test]
    fn site_url_mapping() {
        let base = Url::parse("https://docs.example.com/").unwrap();
        let map = |p: &str| site_url_for(&base, p).unwrap().to_string();

        assert_eq!(map("guide/install.md"), "https://docs.example.com/guide/install/");
        assert_eq!(map("README.md"), "https://docs.example.com/");
        assert_eq!(map("api/README.mdx"), "https://docs.example.com/api/");
        assert_eq!(map("api/index.rst"), "https://docs.example.com/api/");
        assert_eq!(map("Intro.MARKDOWN"), "https://docs.example.com/Intro/");
    }

    #[test]
    fn collects_relative_paths() {
        let dir = std::env::temp_dir().join(format!("docsift-files-{}", uuid::Uuid::now_v7()));
        let docs = dir.join("site/docs");
        std::fs::create_dir_all(docs.join("guide")).unwrap();
        std::fs::write(docs.join("index.md"), "# Home\n").unwrap();
        std::fs::write(docs.join("guide/setup.md"), "# Setup\nbody\n").unwrap();

        let root = DocsRoot {
            path: docs.clone(),
            relative: "site/docs".into(),
            file_count: 2,
            rule: DocsRootRule::NestedSearch,
        };
        let files = collect_docs_files(&dir, &root).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].repo_path, "site/docs/guide/setup.md");
        assert_eq!(files[0].root_path, "guide/setup.md");
        assert_eq!(files[0].size, 13);
        assert_eq!(files[1].root_path, "index.md");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
