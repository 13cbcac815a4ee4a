//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docsift_core::{ProgressReporter, RunReport};
use docsift_shared::{
    AppConfig, AttemptOutcome, FullScope, RunConfig, Site, StrategyAttempt, init_config, load_config,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Exit status of a run in which every strategy failed.
const EXIT_EXHAUSTED: u8 = 2;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docsift: turn a documentation site into llms.txt artifacts.
#[derive(Parser)]
#[command(
    name = "docsift",
    version,
    about = "Generate llms.txt and llms-full.txt for a documentation site.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Discover documentation and write llms.txt, llms-full.txt and metadata.json.
    Generate(GenerateArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags for `generate`; unset values come from the config file.
#[derive(clap::Args, Debug)]
pub(crate) struct GenerateArgs {
    /// Base URL of the documentation site.
    pub url: String,

    /// Output directory (a per-site subdirectory is created inside).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Maximum pages to crawl or convert.
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Maximum crawl depth.
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Maximum links in llms.txt.
    #[arg(long)]
    pub max_links: Option<usize>,

    /// Repository bundle scope: all or selected.
    #[arg(long)]
    pub full_scope: Option<FullScope>,

    /// Byte budget for llms-full.txt.
    #[arg(long)]
    pub max_full_bytes: Option<u64>,

    /// Ignore the byte budget.
    #[arg(long)]
    pub force_full: bool,

    /// Never fall back to sitemap/crawl discovery.
    #[arg(long)]
    pub no_crawl: bool,

    /// Append repository source links to llms.txt entries.
    #[arg(long)]
    pub include_source_links: bool,

    /// Print metadata.json to stdout.
    #[arg(long)]
    pub json: bool,
}

impl GenerateArgs {
    /// Config-file defaults overridden by whatever was passed on the command line.
    fn run_config(&self, config: &AppConfig) -> RunConfig {
        let mut run = RunConfig::from(config);
        if let Some(out) = &self.out {
            run.out_dir = out.clone();
        }
        if let Some(n) = self.max_pages {
            run.max_pages = n;
        }
        if let Some(n) = self.max_depth {
            run.max_depth = n;
        }
        if let Some(n) = self.max_links {
            run.max_links = n;
        }
        if let Some(scope) = self.full_scope {
            run.full_scope = scope;
        }
        if let Some(n) = self.max_full_bytes {
            run.max_full_bytes = n;
        }
        run.force_full = self.force_full;
        run.no_crawl = self.no_crawl;
        run.include_source_links = self.include_source_links;
        run
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docsift=info",
        1 => "docsift=debug",
        _ => "docsift=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Generate(args) => cmd_generate(&args).await,
        Command::Config { action } => {
            match action {
                ConfigAction::Init => cmd_config_init()?,
                ConfigAction::Show => cmd_config_show()?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn cmd_generate(args: &GenerateArgs) -> Result<ExitCode> {
    let config = load_config()?;
    let run_config = args.run_config(&config);
    let site = Site::parse(&args.url)?;

    info!(
        site = %site,
        out = %run_config.out_dir.display(),
        max_pages = run_config.max_pages,
        max_links = run_config.max_links,
        "generating llms artifacts"
    );

    let reporter = CliProgress::new();
    let report = tokio::select! {
        result = docsift_core::generate(&site, &run_config, &reporter) => result?,
        _ = tokio::signal::ctrl_c() => {
            reporter.spinner.finish_and_clear();
            return Err(eyre!("interrupted"));
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.metadata)?);
    } else {
        print_summary(&report);
    }

    match report.failure {
        Some(err) => {
            eprintln!("error: {err}");
            Ok(ExitCode::from(EXIT_EXHAUSTED))
        }
        None => Ok(ExitCode::SUCCESS),
    }
}

fn print_summary(report: &RunReport) {
    let meta = &report.metadata;
    println!();
    if report.succeeded() {
        println!("  llms.txt generated");
    } else {
        println!("  No documentation found");
    }
    println!("  Site:     {}", meta.base_url);
    if let Some(method) = &meta.method {
        println!("  Method:   {method}");
    }
    if let Some(repo) = &meta.repo {
        println!("  Repo:     {repo}");
    }
    if let Some(links) = meta.llms_links {
        println!("  Links:    {links}");
    }
    if let Some(full) = &meta.full {
        let scope = full.scope_used.as_deref().map(|s| format!(", scope {s}")).unwrap_or_default();
        println!("  Bundle:   {} bytes ({}{scope})", full.bytes, full.source);
    }
    println!("  Path:     {}", report.site_dir.display());
    println!("  Time:     {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn strategy_finished(&self, attempt: &StrategyAttempt) {
        let mark = match attempt.outcome {
            AttemptOutcome::Found => "✓",
            AttemptOutcome::NotApplicable | AttemptOutcome::Disabled => "-",
            AttemptOutcome::Failed => "✗",
        };
        let detail = attempt.detail.as_deref().unwrap_or("");
        self.spinner
            .println(format!("  {mark} {}: {detail}", attempt.strategy));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
