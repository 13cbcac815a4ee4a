//! Pipeline orchestration and curation logic for docsift.
//!
//! This crate ties the leaf crates together: it ranks and categorises
//! candidate pages, converts documents for the full bundle, runs the
//! strategy fallback, and writes the output directory.

pub mod assembler;
pub mod convert;
pub mod curate;
pub mod pipeline;
pub mod strategies;

pub use pipeline::{GENERATOR, ProgressReporter, RunReport, SilentProgress, generate};
