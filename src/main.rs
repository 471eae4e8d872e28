use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use thielverse_ingest::config::{Config, Credentials};
use thielverse_ingest::ingest::{IngestReport, Pipeline};
use thielverse_ingest::store::{MemoryStore, RestStore};

#[derive(Parser, Debug)]
#[command(
    name = "thielverse-ingest",
    about = "Fetch frontier feeds and upsert receipts with entity links"
)]
struct Args {
    /// TOML file overriding the built-in feed list, vocabulary and pacing
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run against an in-memory store; nothing is written remotely
    #[arg(long)]
    dry_run: bool,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("thielverse_ingest=info,warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_required(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if args.dry_run {
        let client = build_client(&config)?;
        let store = MemoryStore::with_entities(config.entity_slugs());
        let pipeline = Pipeline::new(config, client, store);
        let report = pipeline.run().await;
        print_dry_run(&report, pipeline.store());
        return Ok(());
    }

    // Credentials are checked before any feed is touched
    let credentials = Credentials::from_env().context("Store credentials are not configured")?;
    let client = build_client(&config)?;
    let store =
        RestStore::new(client.clone(), credentials).context("Failed to set up store client")?;

    Pipeline::new(config, client, store).run().await;
    Ok(())
}

fn print_dry_run(report: &IngestReport, store: &MemoryStore) {
    for receipt in store.receipts() {
        println!(
            "{}  {:<10}  {}  {}",
            receipt.hash,
            receipt.frontier,
            receipt.published_at.get(..10).unwrap_or(&receipt.published_at),
            receipt.title
        );
    }
    println!(
        "Dry run: {} receipts, {} links ({} feeds ok, {} failed, {} entries skipped)",
        report.created,
        report.links,
        report.feeds_ok,
        report.feeds_failed,
        report.skipped_entries
    );
}
