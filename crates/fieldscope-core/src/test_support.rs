//! In-memory cache and scripted backend for unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use fieldscope_api::{ApiError, Record, Value};

use crate::batch::{ExportFormat, ExportHandle};
use crate::traits::{DeleteOutcome, FieldChanges, RecordCache, WriteApi, WriteOutcome};

struct CacheInner {
    records: RwLock<HashMap<String, Record>>,
}

#[async_trait]
impl RecordCache for CacheInner {
    async fn get_all(&self) -> Result<Vec<Record>, ApiError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Record>, ApiError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn put(&self, record: Record) -> Result<(), ApiError> {
        self.records.write().await.insert(record.id.clone(), record);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), ApiError> {
        self.records.write().await.remove(id);
        Ok(())
    }
}

/// Test handle around an in-memory `RecordCache`.
pub(crate) struct SharedCache {
    inner: Arc<CacheInner>,
}

impl SharedCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CacheInner {
                records: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn arc(&self) -> Arc<dyn RecordCache> {
        self.inner.clone()
    }

    pub async fn seed(&self, record: Record) {
        self.inner
            .records
            .write()
            .await
            .insert(record.id.clone(), record);
    }

    pub async fn get(&self, id: &str) -> Option<Record> {
        self.inner.records.read().await.get(id).cloned()
    }
}

/// Scripted in-memory backend: version-checked writes plus per-record
/// failure scripts.
pub(crate) struct ScriptedApi {
    records: RwLock<HashMap<String, Record>>,
    rejections: RwLock<HashMap<String, String>>,
    failures: RwLock<HashMap<String, ApiError>>,
    writes: RwLock<usize>,
    exports: RwLock<usize>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            rejections: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
            writes: RwLock::new(0),
            exports: RwLock::new(0),
        }
    }

    pub async fn seed(&self, record: Record) {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record);
    }

    /// Play the concurrent second actor: apply `changes` directly on the
    /// backend copy, bumping the version past whatever the client holds.
    pub async fn edit_as<'a, I>(&self, actor: &str, id: &str, changes: I)
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let mut records = self.records.write().await;
        let record = records.get_mut(id).expect("edit_as on unknown record");
        for (field, value) in changes {
            record.set(field, value);
        }
        record.version += 1;
        record.updated_by = Some(actor.to_string());
        record.updated_at = Some(chrono::Utc::now());
    }

    /// Script a persistent validation rejection for a record.
    pub async fn reject_with(&self, id: &str, message: &str) {
        self.rejections
            .write()
            .await
            .insert(id.to_string(), message.to_string());
    }

    /// Script a persistent transport-level failure for a record.
    pub async fn fail_with(&self, id: &str, error: ApiError) {
        self.failures.write().await.insert(id.to_string(), error);
    }

    pub async fn write_count(&self) -> usize {
        *self.writes.read().await
    }

    pub async fn export_count(&self) -> usize {
        *self.exports.read().await
    }

    pub async fn backend_record(&self, id: &str) -> Option<Record> {
        self.records.read().await.get(id).cloned()
    }
}

#[async_trait]
impl WriteApi for ScriptedApi {
    async fn submit_update(
        &self,
        record_id: &str,
        changes: FieldChanges,
        base_version: i64,
    ) -> Result<WriteOutcome, ApiError> {
        *self.writes.write().await += 1;

        if let Some(error) = self.failures.read().await.get(record_id) {
            return Err(error.clone());
        }
        if let Some(message) = self.rejections.read().await.get(record_id) {
            return Err(ApiError::Validation {
                message: message.clone(),
            });
        }

        let mut records = self.records.write().await;
        let record = records
            .get_mut(record_id)
            .ok_or_else(|| ApiError::RecordNotFound {
                id: record_id.to_string(),
            })?;

        if record.version != base_version {
            return Ok(WriteOutcome::Conflict {
                remote: record.clone(),
            });
        }

        for (field, value) in changes {
            record.set(field, value);
        }
        record.version += 1;
        record.updated_by = Some("you".to_string());
        record.updated_at = Some(chrono::Utc::now());
        Ok(WriteOutcome::Applied {
            record: record.clone(),
        })
    }

    async fn delete_record(
        &self,
        record_id: &str,
        base_version: i64,
    ) -> Result<DeleteOutcome, ApiError> {
        *self.writes.write().await += 1;

        if let Some(error) = self.failures.read().await.get(record_id) {
            return Err(error.clone());
        }
        if let Some(message) = self.rejections.read().await.get(record_id) {
            return Err(ApiError::Validation {
                message: message.clone(),
            });
        }

        let mut records = self.records.write().await;
        let record = records
            .get(record_id)
            .ok_or_else(|| ApiError::RecordNotFound {
                id: record_id.to_string(),
            })?;

        if record.version != base_version {
            return Ok(DeleteOutcome::Conflict {
                remote: record.clone(),
            });
        }

        records.remove(record_id);
        Ok(DeleteOutcome::Deleted)
    }

    async fn export_records(
        &self,
        _ids: &[String],
        format: ExportFormat,
    ) -> Result<ExportHandle, ApiError> {
        *self.exports.write().await += 1;
        Ok(ExportHandle {
            url: format!("memory://exports/{}.{}", Uuid::new_v4(), format.as_str()),
        })
    }
}
