//! Batch operation descriptors and per-record outcomes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use fieldscope_api::{Record, Value};

use crate::conflict::ConflictInfo;
use crate::error::UsageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }
}

/// Handle to a backend-side export job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportHandle {
    pub url: String,
}

/// What a batch does to each selected record.
///
/// Closed set of variants, each carrying only the data it needs; payloads are
/// validated at construction so a descriptor in flight is always well-formed.
#[derive(Debug, Clone)]
pub enum OperationKind {
    UpdateFields {
        changes: HashMap<String, Value>,
        reason: Option<String>,
    },
    Delete {
        reason: Option<String>,
    },
    Export {
        format: ExportFormat,
    },
}

/// A confirmed bulk action. Immutable once submitted; the uuid correlates
/// log lines across the per-record writes.
#[derive(Debug, Clone)]
pub struct BatchOperation {
    id: Uuid,
    kind: OperationKind,
}

impl BatchOperation {
    pub fn update(
        changes: HashMap<String, Value>,
        reason: Option<String>,
    ) -> Result<Self, UsageError> {
        if changes.is_empty() {
            return Err(UsageError::EmptyChanges);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind: OperationKind::UpdateFields { changes, reason },
        })
    }

    pub fn delete(reason: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: OperationKind::Delete { reason },
        }
    }

    pub fn export(format: ExportFormat) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: OperationKind::Export { format },
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &OperationKind {
        &self.kind
    }

    /// Field names this operation puts in contention for a given record.
    ///
    /// Updates contend on exactly the changed fields; a delete contends on
    /// the whole record; an export contends on nothing.
    pub fn contended_fields(&self, local: &Record) -> Vec<String> {
        match &self.kind {
            OperationKind::UpdateFields { changes, .. } => {
                let mut fields: Vec<String> = changes.keys().cloned().collect();
                fields.sort();
                fields
            }
            OperationKind::Delete { .. } => {
                let mut fields: Vec<String> = local.fields.keys().cloned().collect();
                fields.sort();
                fields
            }
            OperationKind::Export { .. } => Vec::new(),
        }
    }
}

/// Per-record result of a batch write.
#[derive(Debug, Clone)]
pub enum OutcomeKind {
    /// The write was accepted. `record` is the confirmed version for updates
    /// and `None` for deletes and exports.
    Succeeded { record: Option<Record> },
    /// Backend rejected the write for a non-concurrency reason (bad field
    /// value, transport failure). Not retryable without user action.
    FailedValidation { message: String },
    /// The record changed underneath the client; `remote` is the
    /// authoritative snapshot.
    FailedConflict { remote: Record },
}

#[derive(Debug, Clone)]
pub struct OperationOutcome {
    pub record_id: String,
    pub kind: OutcomeKind,
}

impl OperationOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self.kind, OutcomeKind::Succeeded { .. })
    }
}

/// Everything a finished batch produced: the raw per-record outcomes plus the
/// refined conflict list after detection.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub batch_id: Uuid,
    /// Past-tense verb for the summary line ("updated", "deleted", ...).
    pub verb: &'static str,
    pub outcomes: Vec<OperationOutcome>,
    /// Genuine conflicts awaiting user-driven resolution.
    pub conflicts: Vec<ConflictInfo>,
    /// Records whose conflict turned out to be a stale local cache; the
    /// remote version was accepted automatically.
    pub refreshed: usize,
    pub export: Option<ExportHandle>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn invalid(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.kind, OutcomeKind::FailedValidation { .. }))
            .count()
    }

    pub fn conflicted(&self) -> usize {
        self.conflicts.len()
    }

    /// One-line summary for the aggregate notice, e.g.
    /// "3 of 5 updated, 1 conflict, 1 invalid".
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "{} of {} {}",
            self.succeeded(),
            self.total(),
            self.verb
        )];
        if self.conflicted() > 0 {
            parts.push(format!(
                "{} conflict{}",
                self.conflicted(),
                if self.conflicted() == 1 { "" } else { "s" }
            ));
        }
        if self.invalid() > 0 {
            parts.push(format!("{} invalid", self.invalid()));
        }
        if self.refreshed > 0 {
            parts.push(format!("{} refreshed from server", self.refreshed));
        }
        parts.join(", ")
    }

    pub fn is_clean(&self) -> bool {
        self.conflicted() == 0 && self.invalid() == 0
    }
}
