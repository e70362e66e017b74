//! Application configuration for Prospector.
//!
//! User config lives at `~/.prospector/prospector.toml`.
//! CLI flags override config file values, which override defaults.
//! API keys are never stored in the file — only the names of the env vars
//! that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProspectorError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "prospector.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".prospector";

/// Domains that disqualify a company outright: freelance marketplaces,
/// developer-vetting platforms, remote-job boards, and similar aggregators
/// that show up as "employers" in job postings but are never ICP candidates.
const DEFAULT_DENYLIST: &[&str] = &[
    "lemon.io",
    "lumenalta.com",
    "x-team.com",
    "contra.com",
    "toptal.com",
    "testgorilla.com",
    "remoteyear.com",
    "remotemore.com",
    "hireology.com",
    "xwp.co",
    "upwork.com",
    "fiverr.com",
    "freelancer.com",
    "guru.com",
    "peopleperhour.com",
    "turing.com",
    "arc.dev",
    "gun.io",
    "codementor.io",
    "hired.com",
    "weworkremotely.com",
    "remote.com",
    "outsourcely.com",
    "flexjobs.com",
    "triplebyte.com",
    "hackerrank.com",
    "codility.com",
    "coderpad.io",
    "clouddevs.com",
];

// ---------------------------------------------------------------------------
// Config structs (matching prospector.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Classification oracle settings.
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Web search provider settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Screening funnel settings.
    #[serde(default)]
    pub screening: ScreeningConfig,

    /// Research orchestrator settings.
    #[serde(default)]
    pub research: ResearchConfig,

    /// Local cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// `[oracle]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Name of the env var holding the API key (never the key itself).
    #[serde(default = "default_oracle_key_env")]
    pub api_key_env: String,

    /// Base URL of the OpenAI-compatible chat-completions endpoint.
    #[serde(default = "default_oracle_base_url")]
    pub base_url: String,

    /// Model for cheap classification/summarization calls.
    #[serde(default = "default_basic_model")]
    pub basic_model: String,

    /// Model for the expensive reasoning/synthesis calls.
    #[serde(default = "default_reasoning_model")]
    pub reasoning_model: String,

    /// Timeout in seconds for basic-tier calls.
    #[serde(default = "default_oracle_basic_timeout")]
    pub basic_timeout_secs: u64,

    /// Timeout in seconds for reasoning-tier calls.
    #[serde(default = "default_oracle_reasoning_timeout")]
    pub reasoning_timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_oracle_key_env(),
            base_url: default_oracle_base_url(),
            basic_model: default_basic_model(),
            reasoning_model: default_reasoning_model(),
            basic_timeout_secs: default_oracle_basic_timeout(),
            reasoning_timeout_secs: default_oracle_reasoning_timeout(),
        }
    }
}

fn default_oracle_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_oracle_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_basic_model() -> String {
    "gpt-4o-mini".into()
}
fn default_reasoning_model() -> String {
    "o1-preview".into()
}
fn default_oracle_basic_timeout() -> u64 {
    60
}
fn default_oracle_reasoning_timeout() -> u64 {
    300
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Base URL of the search API (OpenAI-compatible, Perplexity-style).
    #[serde(default = "default_search_base_url")]
    pub base_url: String,

    /// Model for basic-tier searches.
    #[serde(default = "default_search_basic_model")]
    pub basic_model: String,

    /// Model for advanced-tier searches.
    #[serde(default = "default_search_advanced_model")]
    pub advanced_model: String,

    /// Model for research-tier (deep) searches.
    #[serde(default = "default_search_research_model")]
    pub research_model: String,

    /// TTL in seconds for memoized search responses.
    #[serde(default = "default_search_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_search_key_env(),
            base_url: default_search_base_url(),
            basic_model: default_search_basic_model(),
            advanced_model: default_search_advanced_model(),
            research_model: default_search_research_model(),
            cache_ttl_secs: default_search_cache_ttl(),
        }
    }
}

fn default_search_key_env() -> String {
    "PERPLEXITY_API_KEY".into()
}
fn default_search_base_url() -> String {
    "https://api.perplexity.ai".into()
}
fn default_search_basic_model() -> String {
    "sonar".into()
}
fn default_search_advanced_model() -> String {
    "sonar-pro".into()
}
fn default_search_research_model() -> String {
    "sonar-deep-research".into()
}
fn default_search_cache_ttl() -> u64 {
    12 * 60 * 60
}

/// `[screening]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningConfig {
    /// Registrable domains that disqualify a company at the technical stage.
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,

    /// Timeout in seconds for resolving the website through redirects.
    #[serde(default = "default_resolve_timeout")]
    pub resolve_timeout_secs: u64,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            denylist: default_denylist(),
            resolve_timeout_secs: default_resolve_timeout(),
        }
    }
}

fn default_denylist() -> Vec<String> {
    DEFAULT_DENYLIST.iter().map(|d| d.to_string()).collect()
}
fn default_resolve_timeout() -> u64 {
    5
}

/// `[research]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Top-K results kept per search query.
    #[serde(default = "default_num_urls")]
    pub num_urls: usize,

    /// Retry attempts per fetched URL.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Backoff delay in seconds between fetch retries.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_secs: u64,

    /// Bounded worker-pool size shared by fetch and summarize phases.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-document fetch timeout in seconds.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// TTL in seconds for cached research bundles.
    #[serde(default = "default_bundle_ttl")]
    pub bundle_ttl_secs: u64,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            num_urls: default_num_urls(),
            max_retries: default_max_retries(),
            retry_backoff_secs: default_retry_backoff(),
            concurrency: default_concurrency(),
            fetch_timeout_secs: default_fetch_timeout(),
            bundle_ttl_secs: default_bundle_ttl(),
        }
    }
}

fn default_num_urls() -> usize {
    3
}
fn default_max_retries() -> usize {
    2
}
fn default_retry_backoff() -> u64 {
    2
}
fn default_concurrency() -> usize {
    5
}
fn default_fetch_timeout() -> u64 {
    10
}
fn default_bundle_ttl() -> u64 {
    7 * 24 * 60 * 60
}

/// `[cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether caching is enabled at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cache root directory. Empty means `~/.prospector/cache`.
    #[serde(default)]
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            dir: String::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl CacheConfig {
    /// Resolve the cache root directory, defaulting under the config dir.
    pub fn root_dir(&self) -> Result<PathBuf> {
        if self.dir.is_empty() {
            Ok(config_dir()?.join("cache"))
        } else {
            Ok(PathBuf::from(&self.dir))
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.prospector/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ProspectorError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.prospector/prospector.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| ProspectorError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ProspectorError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ProspectorError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ProspectorError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ProspectorError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that a configured API key env var is set and non-empty.
pub fn validate_api_key(var_name: &str, what: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(ProspectorError::config(format!(
            "{what} API key not found. Set the {var_name} environment variable."
        ))),
    }
}
