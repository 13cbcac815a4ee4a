//! Application configuration for docsift.
//!
//! User config lives at `~/.docsift/docsift.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DocsiftError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docsift.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docsift";

// ---------------------------------------------------------------------------
// Enumerated settings
// ---------------------------------------------------------------------------

/// Which documentation files go into a repository-sourced full bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FullScope {
    /// Every documentation file under the docs root.
    #[default]
    All,
    /// Only the curated subset.
    Selected,
}

impl FullScope {
    pub fn as_str(self) -> &'static str {
        match self {
            FullScope::All => "all",
            FullScope::Selected => "selected",
        }
    }
}

impl FromStr for FullScope {
    type Err = DocsiftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(FullScope::All),
            "selected" => Ok(FullScope::Selected),
            other => Err(DocsiftError::config(format!(
                "invalid full scope '{other}': expected 'all' or 'selected'"
            ))),
        }
    }
}

/// HTML-to-text conversion collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HtmlConverterKind {
    /// In-process `htmd` conversion.
    #[default]
    Builtin,
    /// `uvx markitdown <url>`.
    Markitdown,
}

/// Packing collaborator for repository-sourced bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackerKind {
    /// In-process concatenation with per-file banners.
    #[default]
    Builtin,
    /// `repomix --stdin --style plain`.
    Repomix,
}

// ---------------------------------------------------------------------------
// Config structs (matching docsift.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Run defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Repository strategy settings.
    #[serde(default)]
    pub repo: RepoConfig,

    /// Conversion collaborators.
    #[serde(default)]
    pub convert: ConvertConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Output root; each run writes under `<output_dir>/<slug>/`.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Maximum pages to crawl or convert.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum crawl depth from the base URL.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum links in the short index.
    #[serde(default = "default_max_links")]
    pub max_links: usize,

    /// Repository bundle scope.
    #[serde(default)]
    pub full_scope: FullScope,

    /// Byte cap for the full bundle before narrowing to the curated subset.
    #[serde(default = "default_max_full_bytes")]
    pub max_full_bytes: u64,

    /// Concurrent fetches.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_pages: default_max_pages(),
            max_depth: default_max_depth(),
            max_links: default_max_links(),
            full_scope: FullScope::default(),
            max_full_bytes: default_max_full_bytes(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_output_dir() -> String {
    "./llms-out".into()
}
fn default_max_pages() -> usize {
    60
}
fn default_max_depth() -> u32 {
    3
}
fn default_max_links() -> usize {
    30
}
fn default_max_full_bytes() -> u64 {
    12_000_000
}
fn default_concurrency() -> usize {
    8
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User-Agent header.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    concat!("docsift/", env!("CARGO_PKG_VERSION")).into()
}

/// `[repo]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Host whose `host/OWNER/NAME` references are treated as repositories.
    #[serde(default = "default_repo_host")]
    pub host: String,

    /// Version-control program used for shallow clones.
    #[serde(default = "default_git_program")]
    pub git_program: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            host: default_repo_host(),
            git_program: default_git_program(),
        }
    }
}

fn default_repo_host() -> String {
    "github.com".into()
}
fn default_git_program() -> String {
    "git".into()
}

/// `[convert]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertConfig {
    #[serde(default)]
    pub html_converter: HtmlConverterKind,

    #[serde(default)]
    pub packer: PackerKind,
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime configuration for one pipeline run, passed explicitly.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub out_dir: PathBuf,
    pub max_pages: usize,
    pub max_depth: u32,
    pub max_links: usize,
    pub full_scope: FullScope,
    pub max_full_bytes: u64,
    pub force_full: bool,
    pub no_crawl: bool,
    pub include_source_links: bool,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub repo_host: String,
    pub git_program: String,
    pub html_converter: HtmlConverterKind,
    pub packer: PackerKind,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            out_dir: expand_home(&config.defaults.output_dir),
            max_pages: config.defaults.max_pages,
            max_depth: config.defaults.max_depth,
            max_links: config.defaults.max_links,
            full_scope: config.defaults.full_scope,
            max_full_bytes: config.defaults.max_full_bytes,
            force_full: false,
            no_crawl: false,
            include_source_links: false,
            concurrency: config.defaults.concurrency,
            timeout_secs: config.http.timeout_secs,
            user_agent: config.http.user_agent.clone(),
            repo_host: config.repo.host.clone(),
            git_program: config.repo.git_program.clone(),
            html_converter: config.convert.html_converter,
            packer: config.convert.packer,
        }
    }
}

impl RunConfig {
    /// Reject values that would make the pipeline meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.max_links == 0 {
            return Err(DocsiftError::config("max_links must be at least 1"));
        }
        if self.max_pages == 0 {
            return Err(DocsiftError::config("max_pages must be at least 1"));
        }
        if self.concurrency == 0 {
            return Err(DocsiftError::config("concurrency must be at least 1"));
        }
        Ok(())
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docsift/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocsiftError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docsift/docsift.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocsiftError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocsiftError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocsiftError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocsiftError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocsiftError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
