use std::collections::HashMap;

use drill_core::model::{ItemId, Rating};

/// First rating given to each item during a session.
///
/// Writes are insert-if-absent: a later rating for the same item is ignored.
/// Only undo may clear an entry. Iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirstAnswers {
    ratings: HashMap<ItemId, Rating>,
    order: Vec<ItemId>,
}

impl FirstAnswers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `rating` was stored, `false` if `id` already had one.
    pub fn record(&mut self, id: ItemId, rating: Rating) -> bool {
        if self.ratings.contains_key(&id) {
            return false;
        }
        self.ratings.insert(id, rating);
        self.order.push(id);
        true
    }

    /// Clear the entry for `id`, returning what was stored.
    pub fn forget(&mut self, id: ItemId) -> Option<Rating> {
        let rating = self.ratings.remove(&id)?;
        self.order.retain(|answered| *answered != id);
        Some(rating)
    }

    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<Rating> {
        self.ratings.get(&id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, Rating)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.ratings.get(id).map(|rating| (*id, *rating)))
    }
}
