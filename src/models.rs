//! Data models for job listings and ingestion reports.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`Listing`]: one job posting, persisted by url identity
//! - [`Source`]: the origin site a listing was scraped from
//! - [`Extraction`]: what a single source extractor hands back
//! - [`IngestionReport`]: the per-run summary returned to the caller
//!
//! Reports are ephemeral. They are built up while a run progresses, printed
//! once and dropped; only listings reach the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::classify::ErrorKind;

/// The external job board a listing originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Kariyer.net, the primary source.
    Kariyer,
    /// LinkedIn public (guest) job search.
    Linkedin,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Kariyer => "kariyer",
            Source::Linkedin => "linkedin",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single job posting.
///
/// `url` is the only identity field. Everything else may be overwritten when
/// the same url is ingested again, except `keywords`, which only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub url: String,
    pub title: String,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub source: Source,
    pub search_term: String,
    #[serde(default)]
    pub keywords: BTreeSet<String>,
    pub scraped_at: DateTime<Utc>,
    pub last_scraped_at: DateTime<Utc>,
    #[serde(default = "default_published")]
    pub published: bool,
    /// Placeholder produced by the degrade-to-stub fallback, not a real posting.
    #[serde(default)]
    pub synthetic: bool,
}

fn default_published() -> bool {
    true
}

impl Listing {
    /// Create a listing with only the mandatory fields filled in.
    pub fn new(url: impl Into<String>, title: impl Into<String>, source: Source, search_term: &str) -> Self {
        let now = Utc::now();
        Self {
            url: url.into(),
            title: title.into(),
            company: None,
            location: None,
            description: None,
            source,
            search_term: search_term.to_string(),
            keywords: BTreeSet::new(),
            scraped_at: now,
            last_scraped_at: now,
            published: true,
            synthetic: false,
        }
    }

    /// Intra-batch duplicate key: lowercase `title-company`.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}-{}",
            self.title,
            self.company.as_deref().unwrap_or_default()
        )
        .to_lowercase()
    }
}

/// Result of running one source extractor.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub success: bool,
    pub listings: Vec<Listing>,
    pub message: String,
}

/// Caller-visible outcome for one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub success: bool,
    pub count: usize,
    pub message: String,
}

/// A listing that could not be persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingFailure {
    pub url: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Summary of one ingestion run. Never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionReport {
    pub success: bool,
    pub message: String,
    pub search_term: String,
    pub sources: BTreeMap<Source, SourceOutcome>,
    pub total_found: usize,
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
    pub failures: Vec<ListingFailure>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl IngestionReport {
    pub fn new(search_term: &str) -> Self {
        Self {
            search_term: search_term.to_string(),
            ..Default::default()
        }
    }

    /// Record how a source fared.
    pub fn record_source(&mut self, source: Source, outcome: SourceOutcome) {
        self.sources.insert(source, outcome);
    }

    /// Count a listing that could not be persisted.
    pub fn record_failure(&mut self, failure: ListingFailure) {
        self.errors += 1;
        self.failures.push(failure);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}
