//! Shallow clone of a discovered repository.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use docsift_shared::{DocsiftError, Result};
use tokio::process::Command;
use tracing::{info, instrument};

use crate::discover::RepoRef;

/// Branch assumed when `.git/HEAD` is detached or unreadable.
pub const FALLBACK_BRANCH: &str = "main";

/// A local checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonedRepo {
    pub local_path: PathBuf,
    pub default_branch: String,
    /// An existing checkout was reused instead of cloning.
    pub reused: bool,
}

/// `<site_dir>/sources/repo-<owner>-<repo>`
pub fn clone_destination(site_dir: &Path, repo: &RepoRef) -> PathBuf {
    site_dir
        .join("sources")
        .join(format!("repo-{}-{}", repo.owner, repo.repo))
}

/// Shallow-clone `repo` into `dest`.
///
/// An existing checkout at `dest` is reused as-is, without fetching updates.
/// Fails with [`DocsiftError::Clone`] when `dest` exists but is not a
/// checkout, or when the clone command cannot run or exits non-zero.
#[instrument(skip_all, fields(repo = %repo.url, dest = %dest.display()))]
pub async fn clone_repo(repo: &RepoRef, dest: &Path, git_program: &str) -> Result<ClonedRepo> {
    if dest.exists() {
        if dest.join(".git").is_dir() {
            info!("reusing existing checkout");
            return Ok(ClonedRepo {
                local_path: dest.to_path_buf(),
                default_branch: read_default_branch(dest).await,
                reused: true,
            });
        }
        return Err(DocsiftError::Clone(format!(
            "destination exists and is not a git checkout: {}",
            dest.display()
        )));
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DocsiftError::io(parent, e))?;
    }

    info!("cloning (depth 1)");
    let output = Command::new(git_program)
        .args(["clone", "--depth", "1"])
        .arg(format!("{}.git", repo.url))
        .arg(dest)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| DocsiftError::Clone(format!("failed to run '{git_program}': {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DocsiftError::Clone(format!(
            "{git_program} clone {} exited with {}: {}",
            repo.url,
            output.status,
            stderr.trim()
        )));
    }

    Ok(ClonedRepo {
        local_path: dest.to_path_buf(),
        default_branch: read_default_branch(dest).await,
        reused: false,
    })
}

/// Branch named by `.git/HEAD`, or [`FALLBACK_BRANCH`].
pub async fn read_default_branch(checkout: &Path) -> String {
    tokio::fs::read_to_string(checkout.join(".git").join("HEAD"))
        .await
        .ok()
        .and_then(|head| {
            head.trim()
                .strip_prefix("ref: refs/heads/")
                .map(str::to_string)
        })
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| FALLBACK_BRANCH.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("docsift-{tag}-{}", uuid::Uuid::now_v7()))
    }

    fn widget() -> RepoRef {
        RepoRef::new("github.com", "acme", "widget-docs")
    }

    #[test]
    fn destination_is_keyed_by_owner_and_repo() {
        let dest = clone_destination(Path::new("/out/docs.example.com"), &widget());
        assert_eq!(
            dest,
            Path::new("/out/docs.example.com/sources/repo-acme-widget-docs")
        );
    }

    // Reuse has no staleness check: a stale checkout is returned untouched.
    #[tokio::test]
    async fn existing_checkout_is_reused_without_refresh() {
        let dir = temp_dir("clone-reuse");
        std::fs::create_dir_all(dir.join(".git")).unwrap();
        std::fs::write(dir.join(".git/HEAD"), "ref: refs/heads/trunk\n").unwrap();
        std::fs::write(dir.join("stale.md"), "old").unwrap();

        let cloned = clone_repo(&widget(), &dir, "definitely-not-a-git-binary")
            .await
            .unwrap();
        assert!(cloned.reused);
        assert_eq!(cloned.default_branch, "trunk");
        assert!(dir.join("stale.md").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn non_checkout_destination_is_a_clone_error() {
        let dir = temp_dir("clone-conflict");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("file.txt"), "x").unwrap();

        let err = clone_repo(&widget(), &dir, "git").await.unwrap_err();
        assert!(matches!(err, DocsiftError::Clone(_)));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_git_program_is_a_clone_error() {
        let base = temp_dir("clone-missing");
        let dest = base.join("sources/repo-acme-widget-docs");

        let err = clone_repo(&widget(), &dest, "definitely-not-a-git-binary")
            .await
            .unwrap_err();
        assert!(matches!(err, DocsiftError::Clone(_)));

        let _ = std::fs::remove_dir_all(&base);
    }

    #[tokio::test]
    async fn detached_head_falls_back_to_main() {
        let dir = temp_dir("clone-detached");
        std::fs::create_dir_all(dir.join(".git")).unwrap();
        std::fs::write(dir.join(".git/HEAD"), "3f2a9c0d\n").unwrap();

        assert_eq!(read_default_branch(&dir).await, "main");
        assert_eq!(read_default_branch(&dir.join("nope")).await, "main");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
