//! Bulk-edit and conflict-resolution engine.
//!
//! The pipeline: a [`SelectionSet`] feeds the [`BatchExecutor`]; conflict
//! outcomes feed the [`ConflictDetector`]; each genuine [`ConflictInfo`] is
//! handed to a user-driven [`MergeResolver`]; the resolved record goes to the
//! [`ResolutionCommitter`], whose success removes the conflict from the
//! pending [`ConflictQueue`]. [`BulkEditor`] wires the pieces together for
//! the view layer.
//!
//! Everything here is client-side state: durability and write serialization
//! belong to the backend behind [`WriteApi`].

pub mod batch;
pub mod committer;
pub mod conflict;
pub mod editor;
pub mod error;
pub mod executor;
pub mod merge;
pub mod queue;
pub mod selection;
pub mod traits;

#[cfg(test)]
mod resolver_pbt;
#[cfg(test)]
pub(crate) mod test_support;

pub use batch::{
    BatchOperation, BatchReport, ExportFormat, ExportHandle, OperationKind, OperationOutcome,
    OutcomeKind,
};
pub use committer::{CommitOutcome, ResolutionCommitter};
pub use conflict::{ConflictDetector, ConflictInfo, Detection};
pub use editor::BulkEditor;
pub use error::UsageError;
pub use executor::BatchExecutor;
pub use merge::{FieldChoice, MergeResolver, MergeState};
pub use queue::ConflictQueue;
pub use selection::SelectionSet;
pub use traits::{DeleteOutcome, FieldChanges, RecordCache, WriteApi, WriteOutcome};
