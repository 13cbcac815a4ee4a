//! Output artifacts: the short curated index, the full-text bundle, and the
//! files they are written to.

mod bundle;
mod pack;
mod render;
mod write;

pub use bundle::{BundleDoc, RepoScope, WebBundle, assemble_web_bundle, choose_repo_scope};
pub use pack::{Packer, repo_bundle_header};
pub use render::{INDEX_GUIDANCE, IndexHeader, render_short_index};
pub use write::{sha256_hex, write_artifact, write_metadata};
