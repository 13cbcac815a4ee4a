//! Full-bundle assembly and byte budgeting.

use docsift_repo::DocsFile;
use docsift_shared::FullScope;
use tracing::{debug, info};

/// Marker placed between documents of a web bundle.
const SEPARATOR: &str = "\n---\n\n";

/// One converted document.
#[derive(Debug, Clone)]
pub struct BundleDoc {
    pub title: String,
    pub source_url: String,
    pub body: String,
}

impl BundleDoc {
    /// `# title`, a `Source:` line, then the trimmed body.
    pub fn render(&self) -> String {
        format!("# {}\n\nSource: {}\n\n{}\n", self.title, self.source_url, self.body.trim())
    }
}

/// A web bundle and how much of its input made it in.
#[derive(Debug, Clone, Default)]
pub struct WebBundle {
    pub text: String,
    pub included: usize,
    /// Skipped because they had no content.
    pub empty: usize,
    /// Left out once the byte budget was reached.
    pub dropped: usize,
}

/// Concatenate documents in order under a byte budget.
///
/// Documents with a blank body are skipped. Once appending the next document
/// would take the bundle past `max_bytes`, it and everything after it are
/// dropped, unless `force` is set.
pub fn assemble_web_bundle(docs: impl IntoIterator<Item = BundleDoc>, max_bytes: u64, force: bool) -> WebBundle {
    let mut bundle = WebBundle::default();
    let mut full = false;

    for doc in docs {
        if doc.body.trim().is_empty() {
            bundle.empty += 1;
            continue;
        }
        if full {
            bundle.dropped += 1;
            continue;
        }

        let part = doc.render();
        let added = if bundle.text.is_empty() { part.len() } else { SEPARATOR.len() + part.len() };
        if !force && (bundle.text.len() + added) as u64 > max_bytes {
            debug!(title = %doc.title, bytes = part.len(), "bundle budget reached");
            full = true;
            bundle.dropped += 1;
            continue;
        }

        if !bundle.text.is_empty() {
            bundle.text.push_str(SEPARATOR);
        }
        bundle.text.push_str(&part);
        bundle.included += 1;
    }

    info!(
        included = bundle.included,
        empty = bundle.empty,
        dropped = bundle.dropped,
        bytes = bundle.text.len(),
        "assembled web bundle"
    );
    bundle
}

/// Files chosen for a repository bundle.
#[derive(Debug, Clone)]
pub struct RepoScope {
    pub files: Vec<DocsFile>,
    pub scope_used: FullScope,
    /// Sum of the chosen files' sizes.
    pub estimated_bytes: u64,
}

fn total_size(files: &[DocsFile]) -> u64 {
    files.iter().map(|f| f.size).sum()
}

/// Pick the files for a repository bundle.
///
/// `All` uses every docs file unless their total exceeds `max_bytes` and
/// `force` is off, in which case the curated files are used and the scope
/// is reported as `Selected`.
pub fn choose_repo_scope(
    all: &[DocsFile],
    curated: &[DocsFile],
    requested: FullScope,
    max_bytes: u64,
    force: bool,
) -> RepoScope {
    let chosen = match requested {
        FullScope::All => all,
        FullScope::Selected => curated,
    };
    let estimated_bytes = total_size(chosen);

    if requested == FullScope::All && estimated_bytes > max_bytes && !force {
        info!(
            all_bytes = estimated_bytes,
            max_bytes,
            curated = curated.len(),
            "docs tree over budget, narrowing to curated files"
        );
        return RepoScope {
            files: curated.to_vec(),
            scope_used: FullScope::Selected,
            estimated_bytes: total_size(curated),
        };
    }

    RepoScope {
        files: chosen.to_vec(),
        scope_used: requested,
        estimated_bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn doc(title: &str, body: &str) -> BundleDoc {
        BundleDoc {
            title: title.into(),
            source_url: format!("https://docs.example.com/{}", title.to_lowercase()),
            body: body.into(),
        }
    }

    fn file(rel: &str, size: u64) -> DocsFile {
        DocsFile {
            path: PathBuf::from("/checkout").join(rel),
            repo_path: rel.into(),
            root_path: rel.trim_start_matches("docs/").into(),
            size,
        }
    }

    #[test]
    fn documents_are_separated_by_rules() {
        let bundle = assemble_web_bundle(vec![doc("Intro", "  Hello.\n\n"), doc("Setup", "Steps.")], 1_000, false);
        assert_eq!(
            bundle.text,
            "# Intro\n\nSource: https://docs.example.com/intro\n\nHello.\n\
             \n---\n\n\
             # Setup\n\nSource: https://docs.example.com/setup\n\nSteps.\n"
        );
        assert_eq!(bundle.included, 2);
    }

    #[test]
    fn blank_documents_are_skipped() {
        let bundle = assemble_web_bundle(vec![doc("Empty", " \n"), doc("Real", "x")], 1_000, false);
        assert_eq!(bundle.included, 1);
        assert_eq!(bundle.empty, 1);
        assert!(bundle.text.starts_with("# Real\n"));
    }

    #[test]
    fn budget_drops_the_tail_unless_forced() {
        let docs = || vec![doc("A", &"a".repeat(100)), doc("B", &"b".repeat(100)), doc("C", "c")];
        let first_len = doc("A", &"a".repeat(100)).render().len() as u64;

        let capped = assemble_web_bundle(docs(), first_len + 10, false);
        assert_eq!(capped.included, 1);
        assert_eq!(capped.dropped, 2);
        assert!(capped.text.len() as u64 <= first_len + 10);

        let forced = assemble_web_bundle(docs(), first_len + 10, true);
        assert_eq!(forced.included, 3);
        assert_eq!(forced.dropped, 0);
    }

    #[test]
    fn oversized_all_scope_narrows_to_curated() {
        let all = vec![file("docs/a.md", 600), file("docs/b.md", 600), file("docs/c.md", 100)];
        let curated = vec![all[2].clone()];

        let narrowed = choose_repo_scope(&all, &curated, FullScope::All, 1_000, false);
        assert_eq!(narrowed.scope_used, FullScope::Selected);
        assert_eq!(narrowed.files.len(), 1);
        assert_eq!(narrowed.estimated_bytes, 100);

        let forced = choose_repo_scope(&all, &curated, FullScope::All, 1_000, true);
        assert_eq!(forced.scope_used, FullScope::All);
        assert_eq!(forced.estimated_bytes, 1_300);

        let fits = choose_repo_scope(&all, &curated, FullScope::All, 5_000, false);
        assert_eq!(fits.scope_used, FullScope::All);
        assert_eq!(fits.files.len(), 3);
    }

    #[test]
    fn selected_scope_is_never_widened() {
        let all = vec![file("docs/a.md", 10), file("docs/b.md", 10)];
        let curated = vec![all[0].clone()];
        let scope = choose_repo_scope(&all, &curated, FullScope::Selected, 1, false);
        assert_eq!(scope.scope_used, FullScope::Selected);
        assert_eq!(scope.files.len(), 1);
        assert_eq!(scope.estimated_bytes, 10);
    }
}
