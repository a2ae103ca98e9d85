//! Runtime configuration loaded from an optional YAML file.
//!
//! Every section carries `#[serde(default)]`, so a file only needs to name the
//! values it wants to change:
//!
//! ```yaml
//! governor:
//!   min_delay_ms: 6000
//! quota:
//!   primary_share: 0.6
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub governor: GovernorConfig,
    pub retry: RetryConfig,
    pub fetch: FetchConfig,
    pub extraction: ExtractionConfig,
    pub quota: QuotaConfig,
    /// Whole-run deadline; `None` lets a run take as long as it needs.
    pub deadline_secs: Option<u64>,
}

impl IngestConfig {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

/// Process-wide request pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    pub min_delay_ms: u64,
    /// Force a cooldown after every Nth request. Zero disables it.
    pub cooldown_every: u64,
    pub cooldown_ms: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 4_000,
            cooldown_every: 5,
            cooldown_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 15_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_redirects: usize,
    /// Responses at or below this size are treated as soft-block pages.
    pub min_body_bytes: usize,
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_redirects: 5,
            min_body_bytes: 1_000,
            accept_language: "tr-TR,tr;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub min_title_len: usize,
    pub max_title_len: usize,
    pub max_field_len: usize,
    pub description_max_chars: usize,
    /// Inclusive `[min, max]` range for the randomized per-element pause.
    pub element_delay_ms: [u64; 2],
    /// Emit labelled placeholder listings when every live strategy fails.
    pub synthetic_fallback: bool,
    pub default_location: String,
    pub default_company: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_title_len: 3,
            max_title_len: 200,
            max_field_len: 300,
            description_max_chars: 500,
            element_delay_ms: [100, 400],
            synthetic_fallback: true,
            default_location: "Türkiye".to_string(),
            default_company: "Unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Share of the requested limit handed to the first source.
    pub primary_share: f64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self { primary_share: 0.7 }
    }
}

/// Load configuration from `path`, or defaults when no path is given.
#[instrument(level = "info")]
pub fn load_config(path: Option<&Path>) -> Result<IngestConfig, Box<dyn Error>> {
    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(IngestConfig::default());
    };
    let raw = std::fs::read_to_string(path)?;
    let config = parse_config(&raw)?;
    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

pub fn parse_config(raw: &str) -> Result<IngestConfig, serde_yaml::Error> {
    if raw.trim().is_empty() {
        return Ok(IngestConfig::default());
    }
    let mut config: IngestConfig = serde_yaml::from_str(raw)?;
    config.quota.primary_share = config.quota.primary_share.clamp(0.0, 1.0);
    let [lo, hi] = config.extraction.element_delay_ms;
    if lo > hi {
        config.extraction.element_delay_ms = [hi, lo];
    }
    Ok(config)
}
