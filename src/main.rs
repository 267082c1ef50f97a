use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use threads_post_archiver::api::ApiClient;
use threads_post_archiver::collect;
use threads_post_archiver::config::Config;
use threads_post_archiver::report;
use threads_post_archiver::threads::ThreadsClient;

/// Archive Threads posts to yearly NDJSON partitions.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Earliest date to fetch (YYYY-MM-DD), or "all" for no lower bound.
    /// Defaults to yesterday.
    since: Option<String>,

    /// Latest date to fetch (YYYY-MM-DD).
    until: Option<String>,

    /// Build report pages from the stored partitions instead of collecting.
    #[arg(long)]
    report: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    if cli.report {
        return report::run_report(&config).await;
    }

    let since = match cli.since.as_deref() {
        Some("all") => None,
        Some(date) => Some(date.to_string()),
        None => Some(yesterday()),
    };
    let until = cli.until;

    if config.access_token.is_empty() {
        warn!("THREADS_TOKEN is not set - the API will reject unauthenticated requests");
    }

    info!(
        since = since.as_deref().unwrap_or("-"),
        until = until.as_deref().unwrap_or("-"),
        "Starting collection"
    );

    let api = ApiClient::new(&config);
    let client = ThreadsClient::new(api, &config);

    let stats = collect::collect(&client, &config, since.as_deref(), until.as_deref()).await?;

    info!(
        fetched = stats.fetched,
        years = stats.years_written,
        skipped_timestamps = stats.skipped_timestamps,
        "Collection complete"
    );

    Ok(())
}

fn yesterday() -> String {
    (chrono::Local::now().date_naive() - chrono::Days::new(1)).to_string()
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,threads_post_archiver=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        // Pretty-printed logging for development
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
