//! Error types for docsift.
//!
//! Library crates use [`DocsiftError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docsift operations.
#[derive(Debug, thiserror::Error)]
pub enum DocsiftError {
    /// A URL could not be parsed or has no usable scheme/host.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Transport-level failure (connection, TLS, timeout, client setup).
    #[error("transport error: {0}")]
    Transport(String),

    /// Repository clone failed or the destination is unusable.
    #[error("clone error: {0}")]
    Clone(String),

    /// Repository was cloned but no documentation directory qualified.
    #[error("no documentation root found in {0}")]
    NoDocsRoot(String),

    /// A documentation root was located but holds no documentation files.
    #[error("no documentation files found under {0}")]
    NoDocsFiles(String),

    /// Every discovery strategy failed or was not applicable.
    #[error("all strategies exhausted: {}", format_attempts(.attempts))]
    AllStrategiesExhausted { attempts: Vec<(String, String)> },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Text/markup parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// An external collaborator command failed to run or exited non-zero.
    #[error("command `{program}` failed: {message}")]
    Command { program: String, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocsiftError>;

impl DocsiftError {
    /// Create an invalid-URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a command error for an external collaborator.
    pub fn command(program: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Command {
            program: program.into(),
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn format_attempts(attempts: &[(String, String)]) -> String {
    attempts
        .iter()
        .map(|(strategy, cause)| format!("{strategy}: {cause}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DocsiftError::config("max_links must be positive");
        assert_eq!(err.to_string(), "config error: max_links must be positive");

        let err = DocsiftError::invalid_url("ht!tp://", "no host");
        assert!(err.to_string().contains("ht!tp://"));
    }

    #[test]
    fn exhausted_lists_every_strategy() {
        let err = DocsiftError::AllStrategiesExhausted {
            attempts: vec![
                ("existing_llms".into(), "no llms.txt found".into()),
                ("repo".into(), "clone error: exit status 128".into()),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("existing_llms: no llms.txt found"));
        assert!(msg.contains("repo: clone error: exit status 128"));
    }
}
