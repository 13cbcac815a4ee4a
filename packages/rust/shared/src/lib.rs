//! Shared types, error model, URL canonicalization, and configuration for docsift.
//!
//! This crate is the foundation depended on by all other docsift crates.
//! It provides:
//! - [`DocsiftError`], the unified error type
//! - [`canonical`], URL canonicalization and comparison
//! - Domain types ([`Site`], [`CandidatePage`], [`Category`], [`RunMetadata`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod canonical;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ConvertConfig, DefaultsConfig, FullScope, HtmlConverterKind, HttpConfig,
    PackerKind, RepoConfig, RunConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{DocsiftError, Result};
pub use types::{
    ArtifactMeta, AttemptOutcome, CandidatePage, Category, FULL_BUNDLE_FILE, FullMeta,
    METADATA_FILE, METADATA_SCHEMA_VERSION, PageSource, RunMetadata, SHORT_INDEX_FILE, Site,
    Strategy, StrategyAttempt,
};
