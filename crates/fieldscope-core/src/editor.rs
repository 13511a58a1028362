//! The state container the view layer owns.
//!
//! `BulkEditor` wires the pipeline together: selection snapshot → batch
//! executor → conflict detector → pending queue, and merge resolver →
//! resolution committer on the way back. It holds no UI state of its own;
//! views pass it by reference wherever the bulk-action flow needs it.

use std::sync::Arc;
use tracing::warn;

use fieldscope_api::{Notice, NotificationSink};

use crate::batch::{BatchOperation, BatchReport, OperationKind, OutcomeKind};
use crate::committer::{CommitOutcome, ResolutionCommitter};
use crate::conflict::{ConflictDetector, ConflictInfo, Detection};
use crate::error::UsageError;
use crate::executor::BatchExecutor;
use crate::merge::MergeResolver;
use crate::queue::ConflictQueue;
use crate::selection::SelectionSet;
use crate::traits::{RecordCache, WriteApi};

pub struct BulkEditor {
    cache: Arc<dyn RecordCache>,
    api: Arc<dyn WriteApi>,
    sink: Arc<dyn NotificationSink>,
    conflicts: ConflictQueue,
}

impl BulkEditor {
    pub fn new(
        cache: Arc<dyn RecordCache>,
        api: Arc<dyn WriteApi>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            cache,
            api,
            sink,
            conflicts: ConflictQueue::new(),
        }
    }

    pub fn conflicts(&self) -> &ConflictQueue {
        &self.conflicts
    }

    /// Run a confirmed bulk action over the current selection.
    ///
    /// Executes the per-record writes, refines conflict outcomes through the
    /// detector (genuine conflicts are queued, stale-cache ones accept the
    /// remote automatically), and surfaces exactly one aggregate notice.
    pub async fn run_batch(
        &mut self,
        selection: &SelectionSet,
        op: BatchOperation,
    ) -> Result<BatchReport, UsageError> {
        let ids = selection.ids();
        let executor = BatchExecutor::new(self.cache.clone(), self.api.clone());
        let (outcomes, export) = executor.run(&ids, &op).await?;

        let mut conflicts: Vec<ConflictInfo> = Vec::new();
        let mut refreshed = 0usize;
        for outcome in &outcomes {
            let remote = match &outcome.kind {
                OutcomeKind::FailedConflict { remote } => remote,
                _ => continue,
            };
            let local = match self.cache.get_by_id(&outcome.record_id).await {
                Ok(Some(record)) => record,
                _ => {
                    // No local snapshot to diff against: the remote is the
                    // only truth we have.
                    warn!(record_id = %outcome.record_id, "no local snapshot for conflict; accepting remote");
                    let _ = self.cache.put(remote.clone()).await;
                    refreshed += 1;
                    continue;
                }
            };
            let contended = op.contended_fields(&local);
            match ConflictDetector::inspect(&local, remote, &contended) {
                Detection::Genuine(info) => {
                    self.conflicts.push(info.clone());
                    conflicts.push(info);
                }
                Detection::StaleCache { remote } => {
                    let _ = self.cache.put(remote).await;
                    refreshed += 1;
                }
            }
        }

        let (title, verb) = match op.kind() {
            OperationKind::UpdateFields { .. } => ("Bulk update", "updated"),
            OperationKind::Delete { .. } => ("Bulk delete", "deleted"),
            OperationKind::Export { .. } => ("Export", "queued for export"),
        };
        let report = BatchReport {
            batch_id: op.id(),
            verb,
            outcomes,
            conflicts,
            refreshed,
            export,
        };
        let notice = if report.is_clean() {
            Notice::success(title, report.summary())
        } else {
            Notice::error(title, report.summary())
        };
        self.sink.notify(notice);

        Ok(report)
    }

    /// Open a merge resolver over a pending conflict. The conflict stays in
    /// the queue until a resolution commits or the user dismisses it, so a
    /// cancelled resolver can simply be reopened.
    pub fn open_resolver(&self, record_id: &str) -> Option<MergeResolver> {
        self.conflicts
            .get(record_id)
            .cloned()
            .map(MergeResolver::new)
    }

    /// Drop a pending conflict without resolving it.
    pub fn dismiss_conflict(&mut self, record_id: &str) -> Option<ConflictInfo> {
        self.conflicts.dismiss(record_id)
    }

    /// Commit a fully resolved merge. Success closes the conflict; a chained
    /// conflict replaces the queue entry with the fresh snapshot pair.
    pub async fn commit_resolution(
        &mut self,
        resolver: &mut MergeResolver,
    ) -> Result<CommitOutcome, UsageError> {
        let committer =
            ResolutionCommitter::new(self.cache.clone(), self.api.clone(), self.sink.clone());
        let outcome = committer.commit(resolver).await?;
        match &outcome {
            CommitOutcome::Committed { .. } => {
                self.conflicts.dismiss(resolver.record_id());
            }
            CommitOutcome::NewConflict(info) => {
                self.conflicts.push(info.clone());
            }
            CommitOutcome::Failed { .. } => {}
        }
        Ok(outcome)
    }

    /// Keep every local value and commit in one step.
    pub async fn accept_current(
        &mut self,
        resolver: &mut MergeResolver,
    ) -> Result<CommitOutcome, UsageError> {
        resolver.accept_current()?;
        self.commit_resolution(resolver).await
    }

    /// Accept every incoming value and commit in one step.
    pub async fn accept_incoming(
        &mut self,
        resolver: &mut MergeResolver,
    ) -> Result<CommitOutcome, UsageError> {
        resolver.accept_incoming()?;
        self.commit_resolution(resolver).await
    }
}
