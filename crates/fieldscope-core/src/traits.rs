//! Collaborator traits at the engine's seams.
//!
//! The backend is the system of record; the engine only ever talks to it
//! through [`WriteApi`]. The local copy of the data lives behind
//! [`RecordCache`], which the view layer keeps warm however it likes
//! (polling, push, initial page load).

use async_trait::async_trait;
use std::collections::HashMap;

use fieldscope_api::{ApiError, Record, Value};

use crate::batch::{ExportFormat, ExportHandle};

/// Field-name to new-value map for a single write.
pub type FieldChanges = HashMap<String, Value>;

/// Result of a version-checked write against the backend.
#[derive(Debug, Clone)]
pub enum WriteOutcome {
    /// The write was accepted; `record` is the new authoritative version.
    Applied { record: Record },
    /// The record changed underneath the client; `remote` is the
    /// authoritative snapshot to diff against.
    Conflict { remote: Record },
}

/// Result of a version-checked delete.
#[derive(Debug, Clone)]
pub enum DeleteOutcome {
    Deleted,
    Conflict { remote: Record },
}

/// Read and write-back access to the locally cached records.
#[async_trait]
pub trait RecordCache: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Record>, ApiError>;
    async fn get_by_id(&self, id: &str) -> Result<Option<Record>, ApiError>;
    async fn put(&self, record: Record) -> Result<(), ApiError>;
    async fn remove(&self, id: &str) -> Result<(), ApiError>;
}

/// The backend write surface.
///
/// `base_version` is the version the client read before editing; the backend
/// rejects the write with a conflict when the record has moved past it.
#[async_trait]
pub trait WriteApi: Send + Sync {
    async fn submit_update(
        &self,
        record_id: &str,
        changes: FieldChanges,
        base_version: i64,
    ) -> Result<WriteOutcome, ApiError>;

    async fn delete_record(
        &self,
        record_id: &str,
        base_version: i64,
    ) -> Result<DeleteOutcome, ApiError>;

    async fn export_records(
        &self,
        ids: &[String],
        format: ExportFormat,
    ) -> Result<ExportHandle, ApiError>;
}
