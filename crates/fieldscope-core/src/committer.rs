//! Final write of a merged record.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use fieldscope_api::{Notice, NotificationSink, Record, Value};

use crate::conflict::{ConflictDetector, ConflictInfo, Detection};
use crate::error::UsageError;
use crate::merge::MergeResolver;
use crate::traits::{RecordCache, WriteApi, WriteOutcome};

/// What a commit attempt produced.
#[derive(Debug, Clone)]
pub enum CommitOutcome {
    /// The backend accepted the merged record; the conflict is closed.
    Committed { record: Record },
    /// A third actor edited the record while the merge was open and the
    /// divergence is genuine; the new conflict re-enters the pipeline. The
    /// resolver keeps its choices for reference, but a fresh resolver over
    /// the new `ConflictInfo` is needed to close it.
    NewConflict(ConflictInfo),
    /// Validation or transport failure. The resolver stays fully resolved so
    /// the user's choices survive for a retry.
    Failed { message: String },
}

/// Submits a fully resolved merge as a single write.
pub struct ResolutionCommitter {
    cache: Arc<dyn RecordCache>,
    api: Arc<dyn WriteApi>,
    sink: Arc<dyn NotificationSink>,
}

impl ResolutionCommitter {
    pub fn new(
        cache: Arc<dyn RecordCache>,
        api: Arc<dyn WriteApi>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self { cache, api, sink }
    }

    /// Commit the resolver's merged record.
    ///
    /// Only permitted from the fully-resolved state; anything else is a
    /// usage error rejected before any network call. Chained conflicts are
    /// re-detected rather than treated as terminal failures.
    #[tracing::instrument(name = "resolution.commit", skip(self, resolver), fields(record_id = %resolver.record_id()))]
    pub async fn commit(&self, resolver: &mut MergeResolver) -> Result<CommitOutcome, UsageError> {
        let merged = resolver.begin_commit()?;
        let conflicted_fields = resolver.conflict().conflicted_fields.clone();

        // Submit the chosen values for the conflicted fields only; a field
        // the merge removed goes out as an explicit null.
        let mut changes: HashMap<String, Value> = HashMap::new();
        for field in &conflicted_fields {
            let value = merged.get(field).cloned().unwrap_or(Value::Null);
            changes.insert(field.clone(), value);
        }

        debug!(base_version = merged.version, "submitting merged record");
        match self
            .api
            .submit_update(&merged.id, changes, merged.version)
            .await
        {
            Ok(WriteOutcome::Applied { record }) => {
                if let Err(e) = self.cache.put(record.clone()).await {
                    warn!(error = %e, "cache write-back failed after commit");
                }
                resolver.mark_committed();
                info!(version = record.version, "conflict resolved");
                self.sink.notify(Notice::success(
                    "Conflict resolved",
                    format!("Scope item {} saved", record.id),
                ));
                Ok(CommitOutcome::Committed { record })
            }
            Ok(WriteOutcome::Conflict { remote }) => {
                // The record moved again underneath the merge. Diff the
                // merged intent against the newest snapshot, still restricted
                // to the fields this resolution was about.
                match ConflictDetector::inspect(&merged, &remote, &conflicted_fields) {
                    Detection::StaleCache { remote } => {
                        // The third edit landed on exactly the values the
                        // user chose; accept it and close the conflict.
                        if let Err(e) = self.cache.put(remote.clone()).await {
                            warn!(error = %e, "cache write-back failed after commit");
                        }
                        resolver.mark_committed();
                        self.sink.notify(Notice::success(
                            "Conflict resolved",
                            format!("Scope item {} already matched your resolution", remote.id),
                        ));
                        Ok(CommitOutcome::Committed { record: remote })
                    }
                    Detection::Genuine(info) => {
                        info!(
                            remote_version = info.remote.version,
                            "record changed again during resolution"
                        );
                        self.sink.notify(Notice::error(
                            "Record changed again",
                            format!(
                                "Scope item {} was edited while you were resolving; review the new changes",
                                info.record_id
                            ),
                        ));
                        Ok(CommitOutcome::NewConflict(info))
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "commit rejected");
                self.sink.notify(Notice::error(
                    "Commit failed",
                    format!("Scope item {}: {}", merged.id, e),
                ));
                Ok(CommitOutcome::Failed {
                    message: e.to_string(),
                })
            }
        }
    }
}
