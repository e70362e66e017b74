//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

use prospector_cache::Cache;
use prospector_core::{ResearchOrchestrator, ScreeningFunnel};
use prospector_fetcher::{HttpFetcher, HttpSiteProber};
use prospector_oracle::HttpOracle;
use prospector_search::{CachedSearch, HttpSearch, SearchProvider};
use prospector_shared::{
    AppConfig, Company, ResearchBundle, config_file_path, init_config, load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Prospector — screen companies and research the ones that fit.
#[derive(Parser)]
#[command(
    name = "prospector",
    version,
    about = "Screen candidate companies and research survivors into ICP profiles.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
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
    /// Screen a company through the qualification funnel.
    Screen {
        /// Company name.
        name: String,

        /// Company website URL.
        #[arg(short, long)]
        website: Option<String>,
    },

    /// Research a company into a full ICP bundle (skips screening).
    Research {
        /// Company name.
        name: String,

        /// Company website URL.
        #[arg(short, long)]
        website: Option<String>,

        /// Print the bundle as JSON instead of formatted sections.
        #[arg(long)]
        json: bool,
    },

    /// Screen a company and research it if it passes.
    Run {
        /// Company name.
        name: String,

        /// Company website URL.
        #[arg(short, long)]
        website: Option<String>,

        /// Print the bundle as JSON instead of formatted sections.
        #[arg(long)]
        json: bool,
    },

    /// Local cache management.
    Cache {
        /// Cache subcommand.
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Cache subcommands.
#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Delete every cached entry (search responses and research bundles).
    Clear,
    /// Print the cache root directory.
    Dir,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
    /// Print the config file path.
    Path,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "prospector=info",
        1 => "prospector=debug",
        _ => "prospector=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Screen { name, website } => cmd_screen(&name, website.as_deref()).await,
        Command::Research {
            name,
            website,
            json,
        } => cmd_research(&name, website.as_deref(), json).await,
        Command::Run {
            name,
            website,
            json,
        } => cmd_run(&name, website.as_deref(), json).await,
        Command::Cache { action } => match action {
            CacheAction::Clear => cmd_cache_clear().await,
            CacheAction::Dir => cmd_cache_dir(),
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Path => cmd_config_path(),
        },
    }
}

// ---------------------------------------------------------------------------
// Pipeline wiring
// ---------------------------------------------------------------------------

struct Pipeline {
    funnel: ScreeningFunnel,
    orchestrator: ResearchOrchestrator,
}

/// Wire the HTTP providers and the cache into a ready pipeline. Fails fast
/// when a required API key env var is missing.
fn build_pipeline(config: &AppConfig) -> Result<Pipeline> {
    let cache = if config.cache.enabled {
        Cache::new(config.cache.root_dir()?)
    } else {
        Cache::disabled()
    };

    let oracle = Arc::new(HttpOracle::new(&config.oracle)?);
    let search: Arc<dyn SearchProvider> = Arc::new(CachedSearch::new(
        Arc::new(HttpSearch::new(&config.search)?),
        cache.clone(),
        Duration::from_secs(config.search.cache_ttl_secs),
    ));
    let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(
        config.research.fetch_timeout_secs,
    ))?);
    let prober = Arc::new(HttpSiteProber::new(Duration::from_secs(
        config.screening.resolve_timeout_secs,
    ))?);

    let funnel = ScreeningFunnel::new(
        oracle.clone(),
        Arc::clone(&search),
        prober,
        config.screening.denylist.iter().cloned(),
    );
    let orchestrator = ResearchOrchestrator::new(
        oracle,
        search,
        fetcher,
        cache,
        config.research.clone(),
    );

    Ok(Pipeline {
        funnel,
        orchestrator,
    })
}

/// Parse a company from CLI args, accepting bare hostnames as websites.
fn parse_company(name: &str, website: Option<&str>) -> Result<Company> {
    let website = match website {
        Some(raw) => Some(
            Url::parse(raw)
                .or_else(|_| Url::parse(&format!("https://{raw}")))
                .map_err(|e| eyre!("invalid website URL '{raw}': {e}"))?,
        ),
        None => None,
    };
    Ok(Company::new(name, website))
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());
    spinner
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_screen(name: &str, website: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let pipeline = build_pipeline(&config)?;
    let company = parse_company(name, website)?;

    info!(name, website = website.unwrap_or("none"), "screening company");
    let spin = spinner(&format!("Screening {name}"));
    let decision = pipeline.funnel.screen(&company).await;
    spin.finish_and_clear();

    print_decision(name, decision.proceed, &decision.stage_reached.to_string(), &decision.reason);
    Ok(())
}

async fn cmd_research(name: &str, website: Option<&str>, json: bool) -> Result<()> {
    let config = load_config()?;
    let pipeline = build_pipeline(&config)?;
    let company = parse_company(name, website)?;

    info!(name, "researching company");
    let spin = spinner(&format!("Researching {name}"));
    let result = pipeline.orchestrator.research(&company).await;
    spin.finish_and_clear();

    let bundle = result?;
    print_bundle(name, &bundle, json)?;
    Ok(())
}

async fn cmd_run(name: &str, website: Option<&str>, json: bool) -> Result<()> {
    let config = load_config()?;
    let pipeline = build_pipeline(&config)?;
    let company = parse_company(name, website)?;

    let spin = spinner(&format!("Screening {name}"));
    let decision = pipeline.funnel.screen(&company).await;
    spin.finish_and_clear();

    print_decision(name, decision.proceed, &decision.stage_reached.to_string(), &decision.reason);
    if !decision.proceed {
        return Ok(());
    }

    let spin = spinner(&format!("Researching {name}"));
    let result = pipeline.orchestrator.research(&company).await;
    spin.finish_and_clear();

    let bundle = result?;
    print_bundle(name, &bundle, json)?;
    Ok(())
}

fn print_decision(name: &str, proceed: bool, stage: &str, reason: &str) {
    println!();
    if proceed {
        println!("  {name}: PASS");
    } else {
        println!("  {name}: REJECT at {stage}");
    }
    println!("  Reason: {reason}");
    println!();
}

fn print_bundle(name: &str, bundle: &ResearchBundle, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(bundle)?);
        return Ok(());
    }

    println!();
    println!("  Research bundle for {name}");
    println!();
    for (title, body) in [
        ("Home page", &bundle.home_page),
        ("Comprehensive", &bundle.comprehensive),
        ("Company", &bundle.company),
        ("Funding", &bundle.funding),
        ("Team", &bundle.team),
        ("ICP profile", &bundle.icp_profile),
    ] {
        println!("  == {title} ==");
        if body.is_empty() {
            println!("  (empty)");
        } else {
            println!("{body}");
        }
        println!();
    }
    Ok(())
}

async fn cmd_cache_clear() -> Result<()> {
    let config = load_config()?;
    let cache = Cache::new(config.cache.root_dir()?);
    cache.clear().await?;
    println!("Cache cleared: {}", cache.root().display());
    Ok(())
}

fn cmd_cache_dir() -> Result<()> {
    let config = load_config()?;
    println!("{}", config.cache.root_dir()?.display());
    Ok(())
}

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

fn cmd_config_path() -> Result<()> {
    println!("{}", config_file_path()?.display());
    Ok(())
}
