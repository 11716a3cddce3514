//! Model Catalog Cache
//!
//! One cluster-wide list of registered models, fetched lazily and reused
//! until explicitly invalidated. There is no TTL; staleness is resolved only
//! by invalidation after a mutating operation or an explicit refresh.

use osml_client::api::{MlApi, SharedApi};
use osml_core::error::Result;
use osml_core::model::ModelRecord;
use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::debug;

/// Cached view of the cluster's registered models.
///
/// The cache is either unpopulated or holds one complete fetch; readers never
/// observe a partially replaced list.
pub struct ModelCatalog {
    api: SharedApi,
    entries: RwLock<Option<Vec<ModelRecord>>>,
}

impl ModelCatalog {
    pub fn new(api: SharedApi) -> Self {
        Self {
            api,
            entries: RwLock::new(None),
        }
    }

    /// List models, fetching from the cluster when the cache is unpopulated
    /// or `refresh` is set.
    ///
    /// A fetch failure propagates and leaves the cache exactly as it was.
    pub async fn list(&self, refresh: bool) -> Result<Vec<ModelRecord>> {
        if !refresh {
            if let Some(cached) = self.entries.read().await.as_ref() {
                return Ok(cached.clone());
            }
        }

        // Write lock held across fetch-and-swap: concurrent readers see the
        // old list or the new one, never a partial state.
        let mut entries = self.entries.write().await;
        if !refresh {
            if let Some(cached) = entries.as_ref() {
                return Ok(cached.clone());
            }
        }

        let fetched = dedup_records(self.api.search_models().await?);
        debug!("Catalog fetched: {} models", fetched.len());
        *entries = Some(fetched.clone());
        Ok(fetched)
    }

    /// Drop the cached list; the next read fetches fresh state.
    pub async fn invalidate(&self) {
        let mut entries = self.entries.write().await;
        *entries = None;
        debug!("Catalog invalidated");
    }

    /// True while a fetched list is cached.
    pub async fn is_populated(&self) -> bool {
        self.entries.read().await.is_some()
    }
}

/// Remove exact duplicates, keeping first-seen order.
fn dedup_records(records: Vec<ModelRecord>) -> Vec<ModelRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.clone()))
        .collect()
}
