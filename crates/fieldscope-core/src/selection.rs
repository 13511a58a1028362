//! Record selection for batch operations.

use std::collections::HashSet;
use tokio::sync::watch;

/// The set of record ids currently chosen for a bulk action.
///
/// Created empty per view session, mutated by user toggling, cleared on a
/// successful batch commit or explicit cancel. Consumers that gate a
/// bulk-action panel on "anything selected?" subscribe to the watch channel;
/// it only fires when the set crosses between empty and non-empty, not on
/// every mutation.
pub struct SelectionSet {
    ids: HashSet<String>,
    gate: watch::Sender<bool>,
}

impl SelectionSet {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(false);
        Self {
            ids: HashSet::new(),
            gate,
        }
    }

    pub fn add(&mut self, id: impl Into<String>) {
        self.ids.insert(id.into());
        self.update_gate();
    }

    pub fn remove(&mut self, id: &str) {
        self.ids.remove(id);
        self.update_gate();
    }

    pub fn toggle(&mut self, id: &str, included: bool) {
        if included {
            self.ids.insert(id.to_string());
        } else {
            self.ids.remove(id);
        }
        self.update_gate();
    }

    /// Replace the selection with `ids`. An empty input yields an empty set.
    pub fn select_all<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
        self.update_gate();
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.update_gate();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Snapshot of the selected ids, sorted for deterministic batch ordering.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Observe transitions between empty and non-empty.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.gate.subscribe()
    }

    fn update_gate(&self) {
        let has_selection = !self.ids.is_empty();
        self.gate.send_if_modified(|current| {
            if *current != has_selection {
                *current = has_selection;
                true
            } else {
                false
            }
        });
    }
}

impl Default for SelectionSet {
    fn default() -> Self {
        Self::new()
    }
}
