//! Command-line interface definitions.
//!
//! All arguments can be provided via command-line flags or, where noted,
//! environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for a job ingestion run.
///
/// # Examples
///
/// ```sh
/// # One run for "rust", up to 20 listings
/// job_ingest -q rust
///
/// # Custom store and pacing config, re-run every day
/// job_ingest -q "backend developer" -l 50 -s ./data/listings.json -c ingest.yaml --daily
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Search term sent to every job board
    #[arg(short, long, env = "INGEST_QUERY")]
    pub query: String,

    /// Maximum number of listings to collect across all sources
    #[arg(short, long, default_value_t = 20)]
    pub limit: usize,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON file holding persisted listings
    #[arg(short, long, env = "LISTING_STORE", default_value = "listings.json")]
    pub store: PathBuf,

    /// Abort a run that takes longer than this many seconds (overrides config)
    #[arg(long, env = "INGEST_DEADLINE_SECS")]
    pub deadline_secs: Option<u64>,

    /// Keep running and repeat the ingestion every 24 hours
    #[arg(long)]
    pub daily: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["job_ingest", "--query", "rust developer", "--limit", "15"]);
        assert_eq!(cli.query, "rust developer");
        assert_eq!(cli.limit, 15);
        assert_eq!(cli.store, PathBuf::from("listings.json"));
        assert!(cli.config.is_none());
        assert!(!cli.daily);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "job_ingest",
            "-q",
            "go",
            "-s",
            "/tmp/listings.json",
            "-c",
            "/tmp/ingest.yaml",
            "--deadline-secs",
            "600",
            "--daily",
        ]);
        assert_eq!(cli.query, "go");
        assert_eq!(cli.limit, 20);
        assert_eq!(cli.store, PathBuf::from("/tmp/listings.json"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/ingest.yaml")));
        assert_eq!(cli.deadline_secs, Some(600));
        assert!(cli.daily);
    }
}
