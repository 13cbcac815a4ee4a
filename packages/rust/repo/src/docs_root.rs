//! Locating the documentation subtree of a checkout.
//!
//! Candidates are tried in a fixed order and the first that holds at least
//! [`MIN_DOCS_FILES`] documentation files wins:
//!
//! 1. the site's URL path, as a whole and as its last one to three segments
//! 2. `docs_dir` from an `mkdocs.yml` at the repository root
//! 3. conventional top-level directories (`docs`, `doc`, ...)
//! 4. any `docs`/`doc`/`documentation` directory up to four levels deep
//!
//! Within steps 3 and 4 the directory with the most files wins, then the
//! shallowest, then the lexically smallest path.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use docsift_shared::Site;
use regex::Regex;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use crate::clone::ClonedRepo;

/// Extensions counted as documentation (compared case-insensitively).
pub const DOC_EXTENSIONS: &[&str] = &["md", "mdx", "markdown", "rst"];

/// Directory names never descended into.
pub const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "dist",
    "build",
    "_build",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    "__pycache__",
    ".next",
    ".turbo",
    ".cache",
    "target",
];

/// A candidate must contain at least this many documentation files.
pub const MIN_DOCS_FILES: usize = 3;

const CONVENTIONAL_DIRS: &[&str] = &["docs", "doc", "documentation", "website", "site", "content"];
const NESTED_DOC_DIRS: &[&str] = &["docs", "doc", "documentation"];
const NESTED_SEARCH_DEPTH: usize = 4;
const URL_SUFFIX_SEGMENTS: usize = 3;

static MKDOCS_DOCS_DIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*docs_dir:[ \t]*([^\n#]+)").expect("mkdocs docs_dir regex")
});

/// Which rule picked the docs root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocsRootRule {
    UrlPath,
    GeneratorConfig,
    Conventional,
    NestedSearch,
}

/// The chosen documentation directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsRoot {
    pub path: PathBuf,
    /// Path relative to the checkout, `/`-separated (`.` for the root).
    pub relative: String,
    pub file_count: usize,
    pub rule: DocsRootRule,
}

// ---------------------------------------------------------------------------
// Walking
// ---------------------------------------------------------------------------

pub(crate) fn is_skipped_dir(name: &OsStr) -> bool {
    name.to_str().is_some_and(|n| SKIP_DIRS.contains(&n))
}

pub(crate) fn is_doc_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| DOC_EXTENSIONS.iter().any(|d| ext.eq_ignore_ascii_case(d)))
}

/// Documentation files under `root`, skipping [`SKIP_DIRS`], sorted.
pub fn docs_file_paths(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !(e.depth() > 0 && e.file_type().is_dir() && is_skipped_dir(e.file_name())))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_doc_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

pub fn count_docs_files(root: &Path) -> usize {
    docs_file_paths(root).len()
}

fn relative_display(repo: &Path, dir: &Path) -> String {
    let rel = dir.strip_prefix(repo).unwrap_or(dir);
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// A relative path that stays inside the checkout.
fn safe_relative(raw: &str) -> Option<PathBuf> {
    let path = Path::new(raw);
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        .then(|| path.to_path_buf())
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Relative directories derived from the site's URL path.
pub fn url_path_candidates(site: &Site) -> Vec<String> {
    let segments: Vec<&str> = site
        .base_url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();
    if segments.is_empty() {
        return Vec::new();
    }

    let mut out = vec![segments.join("/")];
    for k in 1..=segments.len().min(URL_SUFFIX_SEGMENTS) {
        let suffix = segments[segments.len() - k..].join("/");
        if !out.contains(&suffix) {
            out.push(suffix);
        }
    }
    out
}

/// `docs_dir` declared in `mkdocs.yml` / `mkdocs.yaml`.
pub fn mkdocs_docs_dir(repo: &Path) -> Option<PathBuf> {
    for name in ["mkdocs.yml", "mkdocs.yaml"] {
        let Ok(text) = std::fs::read_to_string(repo.join(name)) else {
            continue;
        };
        let Some(caps) = MKDOCS_DOCS_DIR_RE.captures(&text) else {
            continue;
        };
        let raw = caps[1].trim().trim_matches(|c| c == '"' || c == '\'');
        if raw.is_empty() {
            continue;
        }
        if let Some(rel) = safe_relative(raw) {
            return Some(repo.join(rel));
        }
    }
    None
}

fn qualify(repo: &Path, dir: PathBuf, rule: DocsRootRule) -> Option<DocsRoot> {
    if !dir.is_dir() {
        return None;
    }
    let file_count = count_docs_files(&dir);
    debug!(dir = %dir.display(), file_count, ?rule, "docs root candidate");
    (file_count >= MIN_DOCS_FILES).then(|| DocsRoot {
        relative: relative_display(repo, &dir),
        path: dir,
        file_count,
        rule,
    })
}

fn best_of(candidates: impl Iterator<Item = DocsRoot>) -> Option<DocsRoot> {
    candidates.min_by(|a, b| {
        b.file_count
            .cmp(&a.file_count)
            .then_with(|| a.path.components().count().cmp(&b.path.components().count()))
            .then_with(|| a.path.cmp(&b.path))
    })
}

fn nested_doc_dirs(repo: &Path) -> Vec<PathBuf> {
    WalkDir::new(repo)
        .min_depth(1)
        .max_depth(NESTED_SEARCH_DEPTH)
        .into_iter()
        .filter_entry(|e| e.file_type().is_dir() && !is_skipped_dir(e.file_name()))
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .is_some_and(|n| NESTED_DOC_DIRS.iter().any(|d| n.eq_ignore_ascii_case(d)))
        })
        .map(|e| e.into_path())
        .collect()
}

/// Find the documentation root of `repo` for `site`.
#[instrument(skip_all, fields(repo = %repo.local_path.display()))]
pub fn locate_docs_root(repo: &ClonedRepo, site: &Site) -> Option<DocsRoot> {
    let root = repo.local_path.as_path();

    let found = url_path_candidates(site)
        .into_iter()
        .filter_map(|rel| safe_relative(&rel))
        .find_map(|rel| qualify(root, root.join(rel), DocsRootRule::UrlPath))
        .or_else(|| {
            mkdocs_docs_dir(root).and_then(|dir| qualify(root, dir, DocsRootRule::GeneratorConfig))
        })
        .or_else(|| {
            best_of(
                CONVENTIONAL_DIRS
                    .iter()
                    .filter_map(|d| qualify(root, root.join(d), DocsRootRule::Conventional)),
            )
        })
        .or_else(|| {
            best_of(
                nested_doc_dirs(root)
                    .into_iter()
                    .filter_map(|d| qualify(root, d, DocsRootRule::NestedSearch)),
            )
        });

    match &found {
        Some(docs) => info!(
            docs_root = %docs.relative,
            files = docs.file_count,
            rule = ?docs.rule,
            "docs root located"
        ),
        None => debug!("no directory qualified as docs root"),
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        dir: PathBuf,
    }

    impl Fixture {
        fn new(tag: &str) -> Self {
            let dir = std::env::temp_dir().join(format!("docsift-{tag}-{}", uuid::Uuid::now_v7()));
            std::fs::create_dir_all(&dir).unwrap();
            Self { dir }
        }

        fn file(&self, rel: &str) -> &Self {
            let path = self.dir.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, "# Title\n").unwrap();
            self
        }

        fn docs(&self, dir: &str, n: usize) -> &Self {
            for i in 0..n {
                self.file(&format!("{dir}/page-{i}.md"));
            }
            self
        }

        fn repo(&self) -> ClonedRepo {
            ClonedRepo {
                local_path: self.dir.clone(),
                default_branch: "main".into(),
                reused: false,
            }
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.dir);
        }
    }

    fn site(url: &str) -> Site {
        Site::parse(url).unwrap()
    }

    #[test]
    fn url_candidates_are_full_path_then_suffixes() {
        let s = site("https://example.com/a/b/c/d/");
        assert_eq!(url_path_candidates(&s), vec!["a/b/c/d", "d", "c/d", "b/c/d"]);
        assert!(url_path_candidates(&site("https://example.com/")).is_empty());
    }

    #[test]
    fn url_path_wins_over_conventional_dirs() {
        let fx = Fixture::new("root-url");
        fx.docs("docs", 10).docs("api", 3);

        let found = locate_docs_root(&fx.repo(), &site("https://example.com/v2/api/")).unwrap();
        assert_eq!(found.relative, "api");
        assert_eq!(found.rule, DocsRootRule::UrlPath);
    }

    #[test]
    fn url_path_needs_three_files() {
        let fx = Fixture::new("root-url-small");
        fx.docs("api", 2).docs("docs", 4);

        let found = locate_docs_root(&fx.repo(), &site("https://example.com/api/")).unwrap();
        assert_eq!(found.relative, "docs");
        assert_eq!(found.rule, DocsRootRule::Conventional);
    }

    #[test]
    fn mkdocs_docs_dir_is_honoured() {
        let fx = Fixture::new("root-mkdocs");
        fx.docs("manual", 3).docs("docs", 8);
        std::fs::write(fx.dir.join("mkdocs.yml"), "site_name: X\ndocs_dir: 'manual' # custom\n")
            .unwrap();

        let found = locate_docs_root(&fx.repo(), &site("https://example.com/")).unwrap();
        assert_eq!(found.relative, "manual");
        assert_eq!(found.rule, DocsRootRule::GeneratorConfig);
    }

    #[test]
    fn conventional_dirs_pick_most_files() {
        let fx = Fixture::new("root-conv");
        fx.docs("docs", 3).docs("website", 5);

        let found = locate_docs_root(&fx.repo(), &site("https://example.com/")).unwrap();
        assert_eq!(found.relative, "website");
        assert_eq!(found.file_count, 5);
    }

    #[test]
    fn nested_search_prefers_shallowest_on_tie() {
        let fx = Fixture::new("root-nested");
        fx.docs("packages/core/docs", 3).docs("packages/docs", 3);

        let found = locate_docs_root(&fx.repo(), &site("https://example.com/")).unwrap();
        assert_eq!(found.relative, "packages/docs");
        assert_eq!(found.rule, DocsRootRule::NestedSearch);
    }

    #[test]
    fn skip_dirs_are_not_counted() {
        let fx = Fixture::new("root-skip");
        fx.docs("docs", 2).docs("docs/node_modules/pkg", 5);

        assert_eq!(count_docs_files(&fx.dir.join("docs")), 2);
        assert!(locate_docs_root(&fx.repo(), &site("https://example.com/")).is_none());
    }

    #[test]
    fn only_doc_extensions_count() {
        let fx = Fixture::new("root-ext");
        fx.file("docs/a.md")
            .file("docs/b.MDX")
            .file("docs/c.rst")
            .file("docs/d.markdown")
            .file("docs/e.txt")
            .file("docs/f.html");

        assert_eq!(count_docs_files(&fx.dir.join("docs")), 4);
    }
}
