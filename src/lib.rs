//! # Job Ingest
//!
//! Fetches job postings from public job boards, extracts structured listings
//! from their HTML and upserts them idempotently into a listing store.
//!
//! ## Architecture
//!
//! Every run follows the same pipeline:
//! 1. **Pacing**: one process-wide [`governor::RateGovernor`] spaces out every request
//! 2. **Fetching**: candidate search urls per source, tried in order, with
//!    [`classify`]-ed errors and capped exponential [`retry`] backoff
//! 3. **Extraction**: ordered selector fallbacks per site ([`scrapers`]), a
//!    bare-link scan as last resort, labelled sample data when a source is unreachable
//! 4. **Reconciliation**: intra-batch dedup, [`keywords`] tagging and upsert by
//!    url ([`reconcile`], [`store`])
//! 5. **Report**: an [`models::IngestionReport`] handed back to the caller
//!
//! The single entry point is [`orchestrator::Orchestrator::run_ingestion`].

pub mod classify;
pub mod config;
pub mod fetch;
pub mod governor;
pub mod keywords;
pub mod models;
pub mod orchestrator;
pub mod reconcile;
pub mod retry;
pub mod scrapers;
pub mod store;
pub mod utils;
