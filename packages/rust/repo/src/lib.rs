//! Repository-backed documentation: find the site's source repository,
//! shallow-clone it, and locate the documentation inside.

mod clone;
mod discover;
mod docs_files;
mod docs_root;

pub use clone::{ClonedRepo, FALLBACK_BRANCH, clone_destination, clone_repo, read_default_branch};
pub use discover::{RepoRef, discover_repo, extract_repo_refs};
pub use docs_files::{DocsFile, collect_docs_files, site_url_for, title_from_markdown_file};
pub use docs_root::{
    DOC_EXTENSIONS, DocsRoot, DocsRootRule, MIN_DOCS_FILES, SKIP_DIRS, count_docs_files,
    docs_file_paths, locate_docs_root, mkdocs_docs_dir, url_path_candidates,
};
