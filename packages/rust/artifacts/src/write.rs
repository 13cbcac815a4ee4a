//! Atomic artifact writes.
//!
//! Every file is written to a dot-prefixed temp file in the same directory
//! and renamed into place, so readers never see a half-written artifact.

use std::path::Path;

use docsift_shared::{ArtifactMeta, DocsiftError, METADATA_FILE, Result, RunMetadata};
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

/// Lower-case hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn write_atomic(dir: &Path, filename: &str, bytes: &[u8]) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| DocsiftError::io(dir, e))?;

    let target = dir.join(filename);
    let temp = dir.join(format!(".{filename}.tmp"));
    std::fs::write(&temp, bytes).map_err(|e| DocsiftError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| DocsiftError::io(&target, e))?;
    Ok(())
}

/// Write one artifact and return its checksum record.
#[instrument(skip_all, fields(dir = %dir.display(), file = %filename, size = bytes.len()))]
pub fn write_artifact(dir: &Path, filename: &str, bytes: &[u8]) -> Result<ArtifactMeta> {
    write_atomic(dir, filename, bytes)?;
    debug!("wrote artifact");
    Ok(ArtifactMeta {
        filename: filename.to_string(),
        sha256: sha256_hex(bytes),
        size_bytes: bytes.len(),
    })
}

/// Write `metadata.json`, pretty-printed.
pub fn write_metadata(dir: &Path, metadata: &RunMetadata) -> Result<()> {
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| DocsiftError::parse(format!("metadata serialization failed: {e}")))?;
    write_atomic(dir, METADATA_FILE, format!("{json}\n").as_bytes())?;
    debug!(dir = %dir.display(), "wrote metadata");
    Ok(())
}
