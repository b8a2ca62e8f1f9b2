use std::collections::VecDeque;

use drill_core::model::ItemId;

/// Working set for one rotation: items cycle until each is rated as known.
///
/// An id is either pending or completed, never both, and never pending twice.
/// Every operation on an empty queue is a no-op returning `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationQueue {
    pending: VecDeque<ItemId>,
    completed: Vec<ItemId>,
}

impl RotationQueue {
    /// Admits at most `set_size` candidates; the rest are left for a later set.
    #[must_use]
    pub fn new(candidates: impl IntoIterator<Item = ItemId>, set_size: usize) -> Self {
        Self {
            pending: candidates.into_iter().take(set_size).collect(),
            completed: Vec::new(),
        }
    }

    #[must_use]
    pub fn peek_head(&self) -> Option<ItemId> {
        self.pending.front().copied()
    }

    /// Retire the head into the completed list.
    pub fn mark_known(&mut self) -> Option<ItemId> {
        let id = self.pending.pop_front()?;
        self.completed.push(id);
        Some(id)
    }

    /// Rotate the head to the back of the pending sequence.
    pub fn mark_unknown(&mut self) -> Option<ItemId> {
        let id = self.pending.pop_front()?;
        self.pending.push_back(id);
        Some(id)
    }

    /// Put `id` back at the head. Used by undo.
    pub fn push_front(&mut self, id: ItemId) {
        self.completed.retain(|done| *done != id);
        self.pending.retain(|queued| *queued != id);
        self.pending.push_front(id);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn remaining_count(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Pending ids, head first.
    pub fn pending(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.pending.iter().copied()
    }

    #[must_use]
    pub fn completed(&self) -> &[ItemId] {
        &self.completed
    }
}
