//! Field-by-field merge of a conflicted record.
//!
//! One resolver per open conflict. The resolver holds the user's per-field
//! choices and gates the commit: nothing reaches the network until every
//! conflicted field has an explicit choice. There is no default; picking a
//! side silently is exactly the data-loss path this flow exists to prevent.

use std::collections::HashMap;

use fieldscope_api::{Record, Value};

use crate::conflict::ConflictInfo;
use crate::error::UsageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeState {
    /// No field resolved yet.
    Opened,
    /// Some but not all fields resolved.
    PartiallyResolved,
    /// Every conflicted field has a choice; commit is permitted.
    FullyResolved,
    /// Terminal: the merged record was accepted by the backend.
    Committed,
    /// Terminal: the user abandoned the merge without committing.
    Cancelled,
}

impl MergeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MergeState::Committed | MergeState::Cancelled)
    }
}

/// Which value wins for one conflicted field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChoice {
    /// Keep the value the client held before the write attempt.
    Local,
    /// Accept the other actor's value.
    Remote,
    /// Neither: the user typed a new value.
    Custom(Value),
}

pub struct MergeResolver {
    conflict: ConflictInfo,
    choices: HashMap<String, FieldChoice>,
    state: MergeState,
}

impl MergeResolver {
    pub fn new(conflict: ConflictInfo) -> Self {
        Self {
            conflict,
            choices: HashMap::new(),
            state: MergeState::Opened,
        }
    }

    pub fn state(&self) -> MergeState {
        self.state
    }

    pub fn conflict(&self) -> &ConflictInfo {
        &self.conflict
    }

    pub fn record_id(&self) -> &str {
        &self.conflict.record_id
    }

    pub fn choice_for(&self, field: &str) -> Option<&FieldChoice> {
        self.choices.get(field)
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.choices.len() == self.conflict.conflicted_fields.len()
    }

    /// Set or change one field's choice. Allowed any number of times before
    /// the resolver reaches a terminal state.
    pub fn resolve_field(
        &mut self,
        field: &str,
        choice: FieldChoice,
    ) -> Result<MergeState, UsageError> {
        if self.state.is_terminal() {
            return Err(UsageError::ResolverClosed { state: self.state });
        }
        if !self.conflict.conflicted_fields.iter().any(|f| f == field) {
            return Err(UsageError::UnknownField {
                field: field.to_string(),
            });
        }
        self.choices.insert(field.to_string(), choice);
        self.recompute_state();
        Ok(self.state)
    }

    /// Resolve every field to the local value in one step.
    pub fn accept_current(&mut self) -> Result<(), UsageError> {
        self.choose_all(FieldChoice::Local)
    }

    /// Resolve every field to the remote value in one step.
    pub fn accept_incoming(&mut self) -> Result<(), UsageError> {
        self.choose_all(FieldChoice::Remote)
    }

    fn choose_all(&mut self, choice: FieldChoice) -> Result<(), UsageError> {
        if self.state.is_terminal() {
            return Err(UsageError::ResolverClosed { state: self.state });
        }
        for field in &self.conflict.conflicted_fields {
            self.choices.insert(field.clone(), choice.clone());
        }
        self.recompute_state();
        Ok(())
    }

    /// Build the merged record: the remote snapshot with the per-field
    /// choices applied. Fields outside `conflicted_fields` are never mutated
    /// from the remote. Only valid once fully resolved.
    pub fn merged_record(&self) -> Result<Record, UsageError> {
        if self.state != MergeState::FullyResolved && self.state != MergeState::Committed {
            return Err(UsageError::CommitNotReady { state: self.state });
        }

        let mut merged = self.conflict.remote.clone();
        for field in &self.conflict.conflicted_fields {
            // Fully resolved: every conflicted field has an entry.
            let choice = &self.choices[field];
            match choice {
                FieldChoice::Remote => {}
                FieldChoice::Local => match self.conflict.local.get(field) {
                    Some(value) => merged.set(field.clone(), value.clone()),
                    None => {
                        merged.fields.remove(field);
                    }
                },
                FieldChoice::Custom(value) => merged.set(field.clone(), value.clone()),
            }
        }
        Ok(merged)
    }

    /// Abandon the merge. Discards this resolver's in-memory choices only;
    /// other pending conflicts and already-committed outcomes are untouched.
    pub fn cancel(&mut self) {
        if self.state != MergeState::Committed {
            self.state = MergeState::Cancelled;
        }
    }

    /// Validate the commit precondition and hand back the merged record.
    /// Rejected before any network call when the resolution is incomplete.
    pub(crate) fn begin_commit(&self) -> Result<Record, UsageError> {
        if self.state != MergeState::FullyResolved {
            return Err(UsageError::CommitNotReady { state: self.state });
        }
        self.merged_record()
    }

    pub(crate) fn mark_committed(&mut self) {
        self.state = MergeState::Committed;
    }

    /// A failed commit keeps the user's choices: the resolver stays fully
    /// resolved for retry rather than dropping back to opened.
    fn recompute_state(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.state = if self.is_fully_resolved() {
            MergeState::FullyResolved
        } else if self.choices.is_empty() {
            MergeState::Opened
        } else {
            MergeState::PartiallyResolved
        };
    }
}
