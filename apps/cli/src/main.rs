//! docsift CLI: generate `llms.txt` and `llms-full.txt` for a documentation site.
//!
//! Tries a published index first, then the site's source repository, then a
//! sitemap or crawl, and writes the artifacts plus `metadata.json`.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
