//! In-memory record cache.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use fieldscope_api::{ApiError, Record};
use fieldscope_core::RecordCache;

/// The client-side copy of the portal's records, keyed by id.
///
/// The view layer fills it from `PortalClient::fetch_items` on load; the
/// engine writes confirmed records back through the `RecordCache` trait.
pub struct MemoryCache {
    records: RwLock<HashMap<String, Record>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Convenience for seeding outside the trait (initial page load, tests).
    pub async fn seed(&self, record: Record) {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record);
    }

    pub async fn seed_all(&self, records: Vec<Record>) {
        let mut map = self.records.write().await;
        for record in records {
            map.insert(record.id.clone(), record);
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordCache for MemoryCache {
    async fn get_all(&self) -> Result<Vec<Record>, ApiError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Record>, ApiError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn put(&self, record: Record) -> Result<(), ApiError> {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), ApiError> {
        self.records.write().await.remove(id);
        Ok(())
    }
}
