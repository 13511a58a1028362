//! Fake portal backend for tests and offline mode.
//!
//! `FakePortal` implements `WriteApi` against an in-memory record table with
//! the same optimistic-concurrency contract as the real portal: every
//! accepted write bumps the version, and a write at a stale base version
//! comes back as a conflict carrying the authoritative snapshot. Tests play
//! the concurrent second actor through [`FakePortal::edit_as`].

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use fieldscope_api::{ApiError, Record, Value};
use fieldscope_core::{
    DeleteOutcome, ExportFormat, ExportHandle, FieldChanges, WriteApi, WriteOutcome,
};

pub struct FakePortal {
    records: RwLock<HashMap<String, Record>>,
    rejections: RwLock<HashMap<String, String>>,
    failures: RwLock<HashMap<String, ApiError>>,
    writes: RwLock<usize>,
    /// Actor name attributed to writes accepted from this client.
    actor: String,
}

impl FakePortal {
    pub fn new() -> Self {
        Self::with_actor("you")
    }

    pub fn with_actor(actor: &str) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            rejections: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
            writes: RwLock::new(0),
            actor: actor.to_string(),
        }
    }

    pub async fn seed(&self, record: Record) {
        self.records
            .write()
            .await
            .insert(record.id.clone(), record);
    }

    /// Authoritative backend copy of a record.
    pub async fn record(&self, id: &str) -> Option<Record> {
        self.records.read().await.get(id).cloned()
    }

    /// Play a concurrent actor: apply `changes` directly on the backend copy,
    /// bumping the version past whatever any client holds.
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

    /// Script a persistent transport failure for a record.
    pub async fn fail_with(&self, id: &str, error: ApiError) {
        self.failures.write().await.insert(id.to_string(), error);
    }

    pub async fn write_count(&self) -> usize {
        *self.writes.read().await
    }

    async fn scripted_failure(&self, id: &str) -> Option<ApiError> {
        if let Some(error) = self.failures.read().await.get(id) {
            return Some(error.clone());
        }
        if let Some(message) = self.rejections.read().await.get(id) {
            return Some(ApiError::Validation {
                message: message.clone(),
            });
        }
        None
    }

    /// The one field rule the real portal enforces that tests rely on.
    fn validate(changes: &FieldChanges) -> Result<(), ApiError> {
        if let Some(quantity) = changes.get("quantity").and_then(|v| v.as_f64()) {
            if quantity < 0.0 {
                return Err(ApiError::Validation {
                    message: "quantity must be non-negative".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for FakePortal {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WriteApi for FakePortal {
    async fn submit_update(
        &self,
        record_id: &str,
        changes: FieldChanges,
        base_version: i64,
    ) -> Result<WriteOutcome, ApiError> {
        *self.writes.write().await += 1;

        if let Some(error) = self.scripted_failure(record_id).await {
            return Err(error);
        }
        Self::validate(&changes)?;

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
            if value.is_null() {
                record.fields.remove(&field);
            } else {
                record.set(field, value);
            }
        }
        record.version += 1;
        record.updated_by = Some(self.actor.clone());
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

        if let Some(error) = self.scripted_failure(record_id).await {
            return Err(error);
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
        ids: &[String],
        format: ExportFormat,
    ) -> Result<ExportHandle, ApiError> {
        if ids.is_empty() {
            return Err(ApiError::Validation {
                message: "export requires at least one record".to_string(),
            });
        }
        Ok(ExportHandle {
            url: format!(
                "https://portal.example/exports/{}.{}",
                Uuid::new_v4(),
                format.as_str()
            ),
        })
    }
}
