//! Dedup, merge and upsert of one extraction batch.
//!
//! 1. Drop intra-batch duplicates by lowercase `title-company` (first wins).
//! 2. Normalise whitespace and cap the description length.
//! 3. Tag with the search term plus dictionary keywords from title and description.
//! 4. Upsert by url: an existing listing is merged (new descriptive fields,
//!    keyword union, fresh `last_scraped_at`) and counts as `updated`; a new
//!    one counts as `created`.
//!
//! A failure on one listing is recorded in the report and never stops the
//! rest of the batch.

use chrono::Utc;
use itertools::Itertools;
use tracing::{debug, error, info, instrument};

use crate::classify::ClassifiedError;
use crate::keywords::extract_keywords;
use crate::models::{IngestionReport, Listing, ListingFailure};
use crate::store::{ListingStore, StoreError};
use crate::utils::{collapse_whitespace, truncate_chars};

pub struct Reconciler<'a, S> {
    store: &'a S,
    description_max_chars: usize,
}

impl<'a, S: ListingStore> Reconciler<'a, S> {
    pub fn new(store: &'a S, description_max_chars: usize) -> Self {
        Self { store, description_max_chars }
    }

    /// Persist `listings`, counting outcomes into `report` as each listing
    /// is handled. Never fails as a whole.
    #[instrument(level = "info", skip_all, fields(count = listings.len()))]
    pub async fn reconcile(&self, listings: Vec<Listing>, report: &mut IngestionReport) {
        let found = listings.len();
        let unique: Vec<Listing> = listings.into_iter().unique_by(Listing::dedup_key).collect();
        let dropped = found - unique.len();
        if dropped > 0 {
            info!(dropped, "Dropped duplicate listings within batch");
        }

        for listing in unique {
            let listing = self.prepare(listing);
            let url = listing.url.clone();
            match self.persist(listing).await {
                Ok(true) => report.created += 1,
                Ok(false) => report.updated += 1,
                Err(e) => {
                    let classified = ClassifiedError::persistence(e.to_string());
                    error!(%url, kind = %classified.kind, error = %classified.message, "Failed to persist listing");
                    report.record_failure(ListingFailure {
                        url,
                        kind: classified.kind,
                        message: classified.message,
                    });
                }
            }
        }

        info!(
            created = report.created,
            updated = report.updated,
            errors = report.errors,
            "Reconciliation finished"
        );
    }

    /// Normalise fields and assemble the keyword set.
    fn prepare(&self, mut listing: Listing) -> Listing {
        listing.title = collapse_whitespace(&listing.title);
        listing.company = listing.company.as_deref().map(collapse_whitespace);
        listing.location = listing.location.as_deref().map(collapse_whitespace);
        listing.description = listing
            .description
            .as_deref()
            .map(|d| truncate_chars(&collapse_whitespace(d), self.description_max_chars));

        let term = collapse_whitespace(&listing.search_term).to_lowercase();
        if !term.is_empty() {
            listing.keywords.insert(term);
        }
        let text = format!("{} {}", listing.title, listing.description.as_deref().unwrap_or_default());
        listing.keywords.extend(extract_keywords(&text));
        listing
    }

    /// Returns `true` when the listing was new.
    async fn persist(&self, listing: Listing) -> Result<bool, StoreError> {
        match self.store.find_by_url(&listing.url).await? {
            Some(existing) => {
                let merged = merge(existing, listing);
                self.store.upsert(merged).await?;
                Ok(false)
            }
            None => {
                debug!(url = %listing.url, "Inserting new listing");
                self.store.upsert(listing).await?;
                Ok(true)
            }
        }
    }
}

/// New descriptive fields win; keywords only grow; first-seen time is kept.
fn merge(existing: Listing, incoming: Listing) -> Listing {
    let mut merged = incoming;
    merged.company = merged.company.or(existing.company);
    merged.location = merged.location.or(existing.location);
    merged.description = merged.description.or(existing.description);
    merged.keywords.extend(existing.keywords);
    merged.scraped_at = existing.scraped_at;
    merged.published = existing.published;
    merged.last_scraped_at = Utc::now();
    merged
}
