use crate::merge::MergeState;

/// Caller errors: an operation was invoked against an invariant it violates.
///
/// These fail fast, before any network activity, and are never retried
/// automatically.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UsageError {
    #[error("selection is empty; nothing to submit")]
    EmptySelection,

    #[error("field update requires at least one field change")]
    EmptyChanges,

    #[error("commit attempted while resolution is {state:?}")]
    CommitNotReady { state: MergeState },

    #[error("field {field:?} is not part of this conflict")]
    UnknownField { field: String },

    #[error("resolver is closed ({state:?}); open the conflict again to change it")]
    ResolverClosed { state: MergeState },
}
