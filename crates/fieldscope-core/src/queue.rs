//! Pending-conflict container.

use crate::conflict::ConflictInfo;

/// The conflicts a view session still has to deal with.
///
/// One entry per record; a newer conflict for the same record replaces the
/// older one (the older snapshot is obsolete by definition). Entries leave
/// the queue when a resolution commits or the user dismisses them.
#[derive(Default)]
pub struct ConflictQueue {
    items: Vec<ConflictInfo>,
}

impl ConflictQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, info: ConflictInfo) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|item| item.record_id == info.record_id)
        {
            *existing = info;
        } else {
            self.items.push(info);
        }
    }

    pub fn get(&self, record_id: &str) -> Option<&ConflictInfo> {
        self.items.iter().find(|item| item.record_id == record_id)
    }

    /// Drop a conflict without resolving it. Affects nothing but this entry.
    pub fn dismiss(&mut self, record_id: &str) -> Option<ConflictInfo> {
        let idx = self
            .items
            .iter()
            .position(|item| item.record_id == record_id)?;
        Some(self.items.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConflictInfo> {
        self.items.iter()
    }

    pub fn record_ids(&self) -> Vec<String> {
        self.items.iter().map(|item| item.record_id.clone()).collect()
    }
}
