use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use drill_core::model::{CollectionId, ItemId, ItemType, SessionSettings};
use storage::repository::ItemSource;

use crate::error::SessionError;

/// Selection result for a session build.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    /// Master list, in study order.
    pub items: Vec<ItemId>,
    pub item_types: HashMap<ItemId, ItemType>,
    /// Distinct candidates found before truncation.
    pub pool_size: usize,
    /// True when the due/new/learning queries came back empty and every item
    /// in the collection was used instead.
    pub used_fallback: bool,
}

impl SessionPlan {
    /// Plan from an already ordered, already tagged list.
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = (ItemId, ItemType)>) -> Self {
        let mut order = Vec::new();
        let mut item_types = HashMap::new();
        for (id, item_type) in items {
            if let Entry::Vacant(slot) = item_types.entry(id) {
                slot.insert(item_type);
                order.push(id);
            }
        }
        Self {
            pool_size: order.len(),
            items: order,
            item_types,
            used_fallback: false,
        }
    }

    /// Total number of items in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of planned items tagged `ItemType::New`.
    #[must_use]
    pub fn new_count(&self) -> usize {
        self.item_types.values().filter(|t| t.is_new()).count()
    }
}

/// Draws a session's items from an `ItemSource`.
pub struct SessionBuilder<'a> {
    source: &'a dyn ItemSource,
    settings: SessionSettings,
}

impl<'a> SessionBuilder<'a> {
    #[must_use]
    pub fn new(source: &'a dyn ItemSource, settings: SessionSettings) -> Self {
        Self { source, settings }
    }

    /// Build a shuffled plan for `collection`.
    ///
    /// - Unions due, new and learning items, dropping duplicates but keeping
    ///   query order, so truncation prefers due items, then new ones.
    /// - Falls back to every item in the collection when that union is empty.
    /// - Truncates to `session_size`, tags each item, then shuffles.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPool` if the collection has no items at all.
    /// Returns `SessionError::Source` if any source query fails.
    pub fn build<R: Rng + ?Sized>(
        self,
        collection: CollectionId,
        rng: &mut R,
    ) -> Result<SessionPlan, SessionError> {
        let mut pool = Vec::new();
        let mut seen = HashSet::new();
        let queries = [
            self.source.due_items(collection)?,
            self.source.new_items(collection)?,
            self.source.learning_items(collection)?,
        ];
        for id in queries.into_iter().flatten() {
            if seen.insert(id) {
                pool.push(id);
            }
        }

        let mut used_fallback = false;
        if pool.is_empty() {
            log::debug!("collection {collection} has nothing due; drawing from all items");
            used_fallback = true;
            for id in self.source.all_items(collection)? {
                if seen.insert(id) {
                    pool.push(id);
                }
            }
        }

        if pool.is_empty() {
            return Err(SessionError::EmptyPool { collection });
        }

        let pool_size = pool.len();
        pool.truncate(self.settings.session_size());

        let mut item_types = HashMap::with_capacity(pool.len());
        for id in &pool {
            item_types.insert(*id, self.source.item_type(*id)?);
        }

        pool.as_mut_slice().shuffle(rng);

        Ok(SessionPlan {
            items: pool,
            item_types,
            pool_size,
            used_fallback,
        })
    }
}
