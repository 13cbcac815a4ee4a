//! Packing repository documentation files into one bundle.

use std::path::Path;
use std::process::Stdio;

use docsift_repo::DocsFile;
use docsift_shared::{DocsiftError, PackerKind, Result};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

const BANNER_RULE: &str = "================";

/// Header placed at the top of a repository bundle.
pub fn repo_bundle_header(repo_url: &str, docs_root: &str, generated_at: &str) -> String {
    format!("llms-full.txt\nSource repo: {repo_url}\nDocs root: {docs_root}\nGenerated: {generated_at}")
}

/// How a repository bundle is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packer {
    /// Header, then each file under a `File: <repo path>` banner.
    Builtin,
    /// External `repomix` run in plain style, file paths fed on stdin.
    Repomix { program: String },
}

impl From<PackerKind> for Packer {
    fn from(kind: PackerKind) -> Self {
        match kind {
            PackerKind::Builtin => Packer::Builtin,
            PackerKind::Repomix => Packer::Repomix {
                program: "repomix".to_string(),
            },
        }
    }
}

impl Packer {
    /// Pack `files` into bundle text. `scratch` is a directory the external
    /// packer may write its output file into.
    #[instrument(skip_all, fields(files = files.len(), packer = ?self))]
    pub async fn pack(&self, header: &str, files: &[DocsFile], scratch: &Path) -> Result<String> {
        match self {
            Packer::Builtin => pack_builtin(header, files).await,
            Packer::Repomix { program } => pack_repomix(program, header, files, scratch).await,
        }
    }

    /// Like [`Packer::pack`], but an external packer failure falls back to
    /// the built-in one.
    pub async fn pack_or_builtin(&self, header: &str, files: &[DocsFile], scratch: &Path) -> Result<String> {
        match self.pack(header, files, scratch).await {
            Err(DocsiftError::Command { program, message }) => {
                warn!(%program, %message, "external packer failed, using built-in packer");
                pack_builtin(header, files).await
            }
            other => other,
        }
    }
}

async fn pack_builtin(header: &str, files: &[DocsFile]) -> Result<String> {
    let mut out = String::new();
    out.push_str(header.trim_end());
    out.push_str("\n\n");

    for file in files {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| DocsiftError::io(&file.path, e))?;
        let text = String::from_utf8_lossy(&bytes);

        out.push_str(&format!("{BANNER_RULE}\nFile: {}\n{BANNER_RULE}\n", file.repo_path));
        out.push_str(text.trim_end());
        out.push_str("\n\n");
    }

    debug!(bytes = out.len(), "built-in pack complete");
    Ok(format!("{}\n", out.trim_end()))
}

async fn pack_repomix(program: &str, header: &str, files: &[DocsFile], scratch: &Path) -> Result<String> {
    let command_err = |message: String| DocsiftError::Command {
        program: program.to_string(),
        message,
    };

    tokio::fs::create_dir_all(scratch)
        .await
        .map_err(|e| DocsiftError::io(scratch, e))?;
    let out_path = scratch.join(".repomix-output.txt");

    let stdin_list: String = files
        .iter()
        .map(|f| format!("{}\n", f.path.display()))
        .collect();

    info!(%program, files = files.len(), "running external packer");
    let mut child = Command::new(program)
        .args(["--stdin", "--style", "plain", "--quiet", "-o"])
        .arg(&out_path)
        .arg("--header-text")
        .arg(header)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| command_err(format!("failed to start: {e}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(stdin_list.as_bytes())
            .await
            .map_err(|e| command_err(format!("failed to write file list: {e}")))?;
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| command_err(format!("failed to wait: {e}")))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(command_err(format!("exited with {}: {}", output.status, stderr.trim())));
    }

    let text = tokio::fs::read_to_string(&out_path)
        .await
        .map_err(|e| DocsiftError::io(&out_path, e))?;
    let _ = tokio::fs::remove_file(&out_path).await;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("docsift-pack-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_file(root: &Path, rel: &str, body: &str) -> DocsFile {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, body).unwrap();
        DocsFile {
            path,
            repo_path: rel.into(),
            root_path: rel.trim_start_matches("docs/").into(),
            size: body.len() as u64,
        }
    }

    #[test]
    fn header_lines() {
        let header = repo_bundle_header("https://github.com/acme/widget", "docs", "2026-01-02T03:04:05Z");
        assert_eq!(
            header,
            "llms-full.txt\nSource repo: https://github.com/acme/widget\nDocs root: docs\nGenerated: 2026-01-02T03:04:05Z"
        );
    }

    #[tokio::test]
    async fn builtin_packs_files_under_banners() {
        let dir = temp_dir();
        let files = vec![
            write_file(&dir, "docs/index.md", "# Home\n\nWelcome.\n\n"),
            write_file(&dir, "docs/guide/setup.md", "# Setup\n"),
        ];

        let text = Packer::Builtin.pack("llms-full.txt\nDocs root: docs", &files, &dir).await.unwrap();
        assert_eq!(
            text,
            "llms-full.txt\nDocs root: docs\n\n\
             ================\nFile: docs/index.md\n================\n# Home\n\nWelcome.\n\n\
             ================\nFile: docs/guide/setup.md\n================\n# Setup\n"
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn builtin_reports_missing_file_as_io_error() {
        let dir = temp_dir();
        let ghost = DocsFile {
            path: dir.join("docs/ghost.md"),
            repo_path: "docs/ghost.md".into(),
            root_path: "ghost.md".into(),
            size: 0,
        };
        let err = Packer::Builtin.pack("h", &[ghost], &dir).await.unwrap_err();
        assert!(matches!(err, DocsiftError::Io { .. }));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_external_packer_falls_back() {
        let dir = temp_dir();
        let files = vec![write_file(&dir, "docs/a.md", "A\n")];
        let packer = Packer::Repomix {
            program: "definitely-not-repomix".into(),
        };

        let err = packer.pack("h", &files, &dir).await.unwrap_err();
        assert!(matches!(err, DocsiftError::Command { .. }));

        let text = packer.pack_or_builtin("h", &files, &dir).await.unwrap();
        assert!(text.contains("File: docs/a.md"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
