//! Command-line runner for the job ingestion engine.
//!
//! ## Usage
//!
//! ```sh
//! job_ingest -q "rust developer" -l 30
//! ```
//!
//! The run report is printed as JSON on stdout; nothing about the run itself
//! is persisted, only the listings.

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;

use cli::Cli;
use job_ingest::config;
use job_ingest::fetch::HttpClient;
use job_ingest::orchestrator::Orchestrator;
use job_ingest::scrapers::{SiteProfile, SiteScraper, kariyer::Kariyer, linkedin::Linkedin};
use job_ingest::store::JsonFileStore;

const DAILY: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("job_ingest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = config::load_config(args.config.as_deref())?;
    if args.deadline_secs.is_some() {
        config.deadline_secs = args.deadline_secs;
    }

    let store = JsonFileStore::open(&args.store).await?;
    let client = Arc::new(HttpClient::new(&config.fetch)?);

    // Fixed priority order: the first source gets the primary share of the limit.
    let profiles: Vec<Box<dyn SiteProfile>> = vec![Box::new(Kariyer), Box::new(Linkedin)];
    let sources: Vec<SiteScraper<HttpClient>> = profiles
        .into_iter()
        .map(|profile| SiteScraper::new(profile, Arc::clone(&client), &config))
        .collect();

    let orchestrator = Orchestrator::new(&store, config);
    let mut ticker = tokio::time::interval(DAILY);
    loop {
        ticker.tick().await;
        let report = orchestrator.run_ingestion(&sources, &args.query, args.limit).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        info!(stored = store.len().await, "Listing store size after run");

        if !args.daily {
            break;
        }
        info!(next_run_in_secs = DAILY.as_secs(), "Waiting for next scheduled run");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}
