//! Trendscope - weekly keyword trends in forum post titles
//!
//! A read-only CLI that collects post metadata from a configurable set
//! of subreddits, buckets posts by ISO calendar week, and reports how
//! often each tracked keyword appears per week.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing credentials, fetch failure, bad input, IO)

mod analysis;
mod cli;
mod config;
mod error;
mod fetch;
mod models;
mod report;

use analysis::KeywordVocabulary;
use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, RedditCredentials, CONFIG_FILE};
use fetch::{FetchOptions, RedditClient};
use models::SourceSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("Trendscope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .trendscope.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize sources, listing, pacing and keywords.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete collection and aggregation workflow.
async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.apply_env()?;
    config.merge_with_args(&args);

    // Credentials gate everything; fail before any network activity
    let credentials = RedditCredentials::from_env(config.fetch.user_agent.as_deref())?;

    let sources = SourceSet::new(&config.fetch.sources);
    if sources.is_empty() {
        anyhow::bail!("No sources configured");
    }
    for name in sources.names() {
        fetch::validate_source(name)?;
    }

    let vocabulary = KeywordVocabulary::new(&config.analysis.keywords);
    if vocabulary.is_empty() {
        warn!("Keyword list is empty; the report will contain only the header");
    }

    let output = PathBuf::from(&config.general.output);

    // Step 1: Collect posts
    println!(
        "📥 Fetching up to {} {} posts from {} sources...",
        config.fetch.limit,
        config.fetch.listing,
        sources.names().len()
    );

    let client = RedditClient::new(credentials, &config.fetch)
        .context("Failed to create Reddit client")?;
    let options = FetchOptions {
        limit_per_source: config.fetch.limit,
        mode: config.fetch.listing,
        pacing: config.fetch.pacing()?,
        show_progress: !args.quiet,
    };

    let posts = fetch::fetch_posts(&client, &sources, &options)
        .await
        .context("Failed to fetch posts")?;
    info!("Collected {} posts", posts.len());

    // Step 2: Aggregate by week
    println!("🔬 Aggregating {} keywords by ISO week...", vocabulary.len());
    let (rows, summary) = analysis::aggregate_with_summary(&posts, &vocabulary, &sources)?;

    // Step 3: Write the report
    let content = match args.format {
        OutputFormat::Csv => report::generate_csv_report(&rows),
        OutputFormat::Json => report::generate_json_report(&rows)?,
    };
    report::write_report(&content, &output)?;

    info!("Done. Wrote {} rows to {}", rows.len(), output.display());

    println!("\n{}", report::generate_summary_text(&summary, &output));
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
