//! Persistence collaborators.
//!
//! The reconciler only needs two calls, lookup by url and upsert, captured by
//! [`ListingStore`]. Two implementations ship with the crate:
//!
//! - [`MemoryStore`]: in-process map, used by tests and embedders
//! - [`JsonFileStore`]: a single JSON document keyed by url, atomically
//!   replaced (temp file + rename) after every upsert; the binary's default

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::models::Listing;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("listing rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Lookup and upsert by url identity. Both calls must accept listings with
/// optional fields left empty.
pub trait ListingStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<Listing>, StoreError>;
    async fn upsert(&self, listing: Listing) -> Result<UpsertOutcome, StoreError>;
}

fn validate(listing: &Listing) -> Result<(), StoreError> {
    if listing.url.trim().is_empty() {
        return Err(StoreError::Rejected("empty url".to_string()));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    listings: Mutex<HashMap<String, Listing>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.listings.lock().await.len()
    }
}

impl ListingStore for MemoryStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<Listing>, StoreError> {
        Ok(self.listings.lock().await.get(url).cloned())
    }

    async fn upsert(&self, listing: Listing) -> Result<UpsertOutcome, StoreError> {
        validate(&listing)?;
        let previous = self.listings.lock().await.insert(listing.url.clone(), listing);
        Ok(match previous {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Created,
        })
    }
}

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    listings: Mutex<BTreeMap<String, Listing>>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty when the file does not exist yet.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let listings = match fs::read_to_string(&path).await {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        info!(count = listings.len(), "Opened listing store");
        Ok(Self {
            path,
            listings: Mutex::new(listings),
        })
    }

    pub async fn len(&self) -> usize {
        self.listings.lock().await.len()
    }

    async fn flush(&self, listings: &BTreeMap<String, Listing>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(listings)?;
        // temp file + rename, so a partial write never replaces the store
        let temp_path = self.temp_path();
        fs::write(&temp_path, json).await?;
        fs::rename(&temp_path, &self.path).await?;
        debug!(path = %self.path.display(), count = listings.len(), "Flushed listing store");
        Ok(())
    }

    /// Sibling of the store file used for atomic replacement.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ListingStore for JsonFileStore {
    async fn find_by_url(&self, url: &str) -> Result<Option<Listing>, StoreError> {
        Ok(self.listings.lock().await.get(url).cloned())
    }

    async fn upsert(&self, listing: Listing) -> Result<UpsertOutcome, StoreError> {
        validate(&listing)?;
        let mut listings = self.listings.lock().await;
        let url = listing.url.clone();
        let previous = listings.insert(url.clone(), listing);
        if let Err(e) = self.flush(&listings).await {
            // keep memory and disk in step
            match previous {
                Some(old) => listings.insert(url, old),
                None => listings.remove(&url),
            };
            return Err(e);
        }
        Ok(match previous {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Created,
        })
    }
}
