//! Ingestion run sequencing.
//!
//! Sources run one after another in a fixed priority order, all sharing the
//! orchestrator's [`RateGovernor`]. The first source is asked for
//! `primary_share` of the limit; every later source is asked for whatever is
//! still missing (at least one). The combined batch then goes through the
//! [`Reconciler`].
//!
//! [`Orchestrator::run_ingestion`] always hands back a report. A run is only
//! unsuccessful when every source failed and nothing was found, or when the
//! configured deadline expired.

use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

use crate::config::IngestConfig;
use crate::governor::RateGovernor;
use crate::models::{IngestionReport, Listing, SourceOutcome};
use crate::reconcile::Reconciler;
use crate::scrapers::ListingSource;
use crate::store::ListingStore;

pub struct Orchestrator<'a, S> {
    governor: RateGovernor,
    store: &'a S,
    config: IngestConfig,
}

impl<'a, S: ListingStore> Orchestrator<'a, S> {
    pub fn new(store: &'a S, config: IngestConfig) -> Self {
        Self {
            governor: RateGovernor::new(&config.governor),
            store,
            config,
        }
    }

    /// Quota for the source at `index` given what has been collected so far.
    fn quota(&self, index: usize, source_count: usize, limit: usize, collected: usize) -> usize {
        if index == 0 && source_count > 1 {
            let share = (limit as f64 * self.config.quota.primary_share).round() as usize;
            share.clamp(1, limit)
        } else {
            limit.saturating_sub(collected).max(1)
        }
    }

    /// Run one ingestion for `search_term`, honouring the configured deadline.
    ///
    /// The report is filled in as the run progresses. When the deadline cuts
    /// the run short, the caller still gets the per-source outcomes and the
    /// persistence counts reached so far, with `success=false`.
    #[instrument(level = "info", skip(self, sources), fields(sources = sources.len()))]
    pub async fn run_ingestion<L: ListingSource>(
        &self,
        sources: &[L],
        search_term: &str,
        limit: usize,
    ) -> IngestionReport {
        let mut report = IngestionReport::new(search_term);
        match self.config.deadline() {
            Some(deadline) => {
                let finished = timeout(deadline, self.run(&mut report, sources, search_term, limit)).await;
                if finished.is_err() {
                    expire(&mut report, deadline);
                }
            }
            None => self.run(&mut report, sources, search_term, limit).await,
        }
        report
    }

    async fn run<L: ListingSource>(
        &self,
        report: &mut IngestionReport,
        sources: &[L],
        search_term: &str,
        limit: usize,
    ) {
        let limit = limit.max(1);
        self.governor.reset().await;
        let mut collected: Vec<Listing> = Vec::new();

        for (index, source) in sources.iter().enumerate() {
            let name = source.source();
            let quota = self.quota(index, sources.len(), limit, collected.len());
            info!(source = %name, quota, collected = collected.len(), "Running source");

            let outcome = match source.extract(&self.governor, search_term, quota).await {
                Ok(mut extraction) => {
                    extraction.listings.truncate(quota);
                    let count = extraction.listings.len();
                    collected.extend(extraction.listings);
                    SourceOutcome {
                        success: extraction.success,
                        count,
                        message: extraction.message,
                    }
                }
                Err(e) => {
                    error!(source = %name, error = %e, "Source failed");
                    SourceOutcome {
                        success: false,
                        count: 0,
                        message: e.to_string(),
                    }
                }
            };
            report.record_source(name, outcome);
            report.total_found = collected.len();
        }

        Reconciler::new(self.store, self.config.extraction.description_max_chars)
            .reconcile(collected, report)
            .await;

        report.success = report.total_found > 0 || report.sources.values().any(|o| o.success);
        report.message = if report.success {
            format!(
                "{} listings found: {} created, {} updated, {} errors",
                report.total_found, report.created, report.updated, report.errors
            )
        } else {
            let reasons: Vec<String> = report
                .sources
                .iter()
                .map(|(source, outcome)| format!("{source}: {}", outcome.message))
                .collect();
            format!("All sources failed ({})", reasons.join("; "))
        };
        report.finish();

        info!(
            success = report.success,
            total_found = report.total_found,
            created = report.created,
            updated = report.updated,
            errors = report.errors,
            requests = self.governor.request_count().await,
            "Ingestion run finished"
        );
    }
}

/// Close out a report whose run hit the deadline, keeping what it reached.
fn expire(report: &mut IngestionReport, deadline: Duration) {
    warn!(
        deadline_secs = deadline.as_secs(),
        sources_done = report.sources.len(),
        created = report.created,
        updated = report.updated,
        "Ingestion run hit its deadline; aborted"
    );
    report.success = false;
    report.message = format!(
        "Ingestion aborted: deadline of {}s exceeded ({} sources finished, {} created, {} updated)",
        deadline.as_secs(),
        report.sources.len(),
        report.created,
        report.updated
    );
    report.finish();
}
