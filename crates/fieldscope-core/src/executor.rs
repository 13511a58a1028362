//! Per-record execution of a batch operation.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::batch::{BatchOperation, ExportHandle, OperationKind, OperationOutcome, OutcomeKind};
use crate::error::UsageError;
use crate::traits::{DeleteOutcome, RecordCache, WriteApi, WriteOutcome};

/// Issues one backend write per selected record and collects an outcome for
/// every single one.
///
/// Writes run sequentially in selection order: the portal backend cannot
/// batch atomically and rate-limits aggressive clients, and sequential
/// execution keeps the outcome list in a deterministic order. A failed write
/// never aborts the remainder; partial failure is the expected case and is
/// reported per item.
pub struct BatchExecutor {
    cache: Arc<dyn RecordCache>,
    api: Arc<dyn WriteApi>,
}

impl BatchExecutor {
    pub fn new(cache: Arc<dyn RecordCache>, api: Arc<dyn WriteApi>) -> Self {
        Self { cache, api }
    }

    /// Run `op` against every id in `ids`.
    ///
    /// Guarantees `outcomes.len() == ids.len()`. An empty selection is a
    /// usage error, rejected before any network activity.
    #[tracing::instrument(name = "batch.run", skip(self, ids, op), fields(batch_id = %op.id(), records = ids.len()))]
    pub async fn run(
        &self,
        ids: &[String],
        op: &BatchOperation,
    ) -> Result<(Vec<OperationOutcome>, Option<ExportHandle>), UsageError> {
        if ids.is_empty() {
            return Err(UsageError::EmptySelection);
        }

        if let OperationKind::Export { format } = op.kind() {
            return Ok(self.run_export(ids, *format).await);
        }

        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let kind = self.run_one(id, op).await;
            outcomes.push(OperationOutcome {
                record_id: id.clone(),
                kind,
            });
        }

        info!(
            succeeded = outcomes.iter().filter(|o| o.succeeded()).count(),
            total = outcomes.len(),
            "batch writes collected"
        );
        Ok((outcomes, None))
    }

    async fn run_one(&self, id: &str, op: &BatchOperation) -> OutcomeKind {
        let local = match self.cache.get_by_id(id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!(record_id = id, "selected record missing from local cache");
                return OutcomeKind::FailedValidation {
                    message: format!("record {} is not in the local cache", id),
                };
            }
            Err(e) => {
                return OutcomeKind::FailedValidation {
                    message: e.to_string(),
                };
            }
        };

        match op.kind() {
            OperationKind::UpdateFields { changes, .. } => {
                debug!(record_id = id, base_version = local.version, "submitting update");
                match self
                    .api
                    .submit_update(id, changes.clone(), local.version)
                    .await
                {
                    Ok(WriteOutcome::Applied { record }) => {
                        if let Err(e) = self.cache.put(record.clone()).await {
                            warn!(record_id = id, error = %e, "cache write-back failed");
                        }
                        OutcomeKind::Succeeded {
                            record: Some(record),
                        }
                    }
                    Ok(WriteOutcome::Conflict { remote }) => {
                        debug!(record_id = id, remote_version = remote.version, "write conflicted");
                        OutcomeKind::FailedConflict { remote }
                    }
                    Err(e) => {
                        warn!(record_id = id, error = %e, "update rejected");
                        OutcomeKind::FailedValidation {
                            message: e.to_string(),
                        }
                    }
                }
            }
            OperationKind::Delete { .. } => {
                debug!(record_id = id, base_version = local.version, "submitting delete");
                match self.api.delete_record(id, local.version).await {
                    Ok(DeleteOutcome::Deleted) => {
                        if let Err(e) = self.cache.remove(id).await {
                            warn!(record_id = id, error = %e, "cache removal failed");
                        }
                        OutcomeKind::Succeeded { record: None }
                    }
                    Ok(DeleteOutcome::Conflict { remote }) => {
                        OutcomeKind::FailedConflict { remote }
                    }
                    Err(e) => {
                        warn!(record_id = id, error = %e, "delete rejected");
                        OutcomeKind::FailedValidation {
                            message: e.to_string(),
                        }
                    }
                }
            }
            OperationKind::Export { .. } => unreachable!("export handled in run"),
        }
    }

    /// Export is one backend call for the whole selection; every record still
    /// gets its own outcome so the count contract holds.
    async fn run_export(
        &self,
        ids: &[String],
        format: crate::batch::ExportFormat,
    ) -> (Vec<OperationOutcome>, Option<ExportHandle>) {
        match self.api.export_records(ids, format).await {
            Ok(handle) => {
                info!(records = ids.len(), url = %handle.url, "export job accepted");
                let outcomes = ids
                    .iter()
                    .map(|id| OperationOutcome {
                        record_id: id.clone(),
                        kind: OutcomeKind::Succeeded { record: None },
                    })
                    .collect();
                (outcomes, Some(handle))
            }
            Err(e) => {
                warn!(error = %e, "export rejected");
                let outcomes = ids
                    .iter()
                    .map(|id| OperationOutcome {
                        record_id: id.clone(),
                        kind: OutcomeKind::FailedValidation {
                            message: e.to_string(),
                        },
                    })
                    .collect();
                (outcomes, None)
            }
        }
    }
}
