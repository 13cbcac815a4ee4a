//! Output directory writer.
//!
//! Lays out one run's results under `<out_dir>/<slug>/`:
//! ```text
//! <out_dir>/<slug>/
//! ├── llms.txt
//! ├── llms-full.txt
//! ├── metadata.json      (always written, always last)
//! └── sources/           (repository checkouts, when used)
//! ```

use std::path::Path;

use docsift_artifacts::{write_artifact, write_metadata};
use docsift_shared::{DocsiftError, FULL_BUNDLE_FILE, Result, RunMetadata, SHORT_INDEX_FILE};
use tracing::{info, instrument};

use crate::strategies::Generated;

/// Write both artifacts, then metadata recording their checksums.
#[instrument(skip_all, fields(dir = %site_dir.display(), method = generated.method))]
pub fn write_outputs(site_dir: &Path, generated: &Generated, metadata: &mut RunMetadata) -> Result<()> {
    generated.annotate(metadata);

    let short = write_artifact(site_dir, SHORT_INDEX_FILE, &generated.short_index)?;
    let full = write_artifact(site_dir, FULL_BUNDLE_FILE, &generated.full_bundle)?;
    info!(
        llms_txt_bytes = short.size_bytes,
        llms_full_bytes = full.size_bytes,
        "artifacts written"
    );
    metadata.artifacts = vec![short, full];

    write_metadata(site_dir, metadata)
}

/// Record a failed run. Only `metadata.json` is written.
#[instrument(skip_all, fields(dir = %site_dir.display()))]
pub fn write_failure(site_dir: &Path, error: &DocsiftError, metadata: &mut RunMetadata) -> Result<()> {
    metadata.error = Some(error.to_string());
    metadata.artifacts.clear();
    write_metadata(site_dir, metadata)
}
