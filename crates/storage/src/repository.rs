use drill_core::model::{CollectionId, ItemId, ItemType, Rating};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by item source adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// Errors surfaced when an outcome cannot be applied.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SinkError {
    #[error("unknown item {0}")]
    UnknownItem(ItemId),

    #[error("outcome for item {id} rejected: {reason}")]
    Rejected { id: ItemId, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Supplies candidate items for a session.
///
/// No ordering is assumed and the same id may come back from several queries;
/// callers deduplicate and shuffle.
pub trait ItemSource: Send + Sync {
    /// Items whose review is due.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query cannot be served.
    fn due_items(&self, collection: CollectionId) -> Result<Vec<ItemId>, StorageError>;

    /// Items never studied.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query cannot be served.
    fn new_items(&self, collection: CollectionId) -> Result<Vec<ItemId>, StorageError>;

    /// Items currently in (re)learning steps.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query cannot be served.
    fn learning_items(&self, collection: CollectionId) -> Result<Vec<ItemId>, StorageError>;

    /// Every item in the collection, regardless of state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the query cannot be served.
    fn all_items(&self, collection: CollectionId) -> Result<Vec<ItemId>, StorageError>;

    /// Classification of a single item.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the id is unknown.
    fn item_type(&self, id: ItemId) -> Result<ItemType, StorageError>;
}

/// Receives final ratings and feeds them to the real scheduler.
pub trait OutcomeSink: Send + Sync {
    /// Apply one rating with a synthesized time-spent hint in seconds.
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if the outcome could not be persisted.
    fn apply(&self, id: ItemId, rating: Rating, elapsed_seconds: f64) -> Result<(), SinkError>;
}

//
// ─── IN-MEMORY COLLECTION ──────────────────────────────────────────────────────
//

/// Scheduling state tracked by the in-memory collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    New,
    Learning,
    Review,
    Relearning,
}

/// Stored shape of an item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub id: ItemId,
    pub collection: CollectionId,
    pub state: ItemState,
    pub due: bool,
}

impl ItemRecord {
    #[must_use]
    pub fn new(id: ItemId, collection: CollectionId, state: ItemState) -> Self {
        Self {
            id,
            collection,
            state,
            due: false,
        }
    }

    #[must_use]
    pub fn due(mut self) -> Self {
        self.due = true;
        self
    }

    #[must_use]
    pub fn item_type(&self) -> ItemType {
        match self.state {
            ItemState::New => ItemType::New,
            ItemState::Learning | ItemState::Review | ItemState::Relearning => ItemType::Review,
        }
    }
}

/// One accepted call to `OutcomeSink::apply`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedOutcome {
    pub id: ItemId,
    pub rating: Rating,
    pub elapsed_seconds: f64,
}

/// Simple in-memory item source and outcome sink for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryCollection {
    items: Arc<Mutex<HashMap<ItemId, ItemRecord>>>,
    outcomes: Arc<Mutex<Vec<AppliedOutcome>>>,
    rejecting: Arc<Mutex<HashSet<ItemId>>>,
}

impl InMemoryCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn upsert_item(&self, record: ItemRecord) -> Result<(), StorageError> {
        let mut guard = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(record.id, record);
        Ok(())
    }

    /// Fetch an item by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing.
    pub fn get_item(&self, id: ItemId) -> Result<ItemRecord, StorageError> {
        let guard = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }

    /// Make every future `apply` for `id` fail with `SinkError::Rejected`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn reject_outcomes_for(&self, id: ItemId) -> Result<(), StorageError> {
        let mut guard = self
            .rejecting
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(id);
        Ok(())
    }

    /// Outcomes accepted so far, in application order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn applied_outcomes(&self) -> Result<Vec<AppliedOutcome>, StorageError> {
        let guard = self
            .outcomes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    fn select(
        &self,
        collection: CollectionId,
        predicate: impl Fn(&ItemRecord) -> bool,
    ) -> Result<Vec<ItemId>, StorageError> {
        let guard = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut ids: Vec<ItemId> = guard
            .values()
            .filter(|record| record.collection == collection && predicate(record))
            .map(|record| record.id)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

impl ItemSource for InMemoryCollection {
    fn due_items(&self, collection: CollectionId) -> Result<Vec<ItemId>, StorageError> {
        self.select(collection, |record| {
            record.due && matches!(record.state, ItemState::Review | ItemState::Relearning)
        })
    }

    fn new_items(&self, collection: CollectionId) -> Result<Vec<ItemId>, StorageError> {
        self.select(collection, |record| record.state == ItemState::New)
    }

    fn learning_items(&self, collection: CollectionId) -> Result<Vec<ItemId>, StorageError> {
        self.select(collection, |record| {
            matches!(record.state, ItemState::Learning | ItemState::Relearning)
        })
    }

    fn all_items(&self, collection: CollectionId) -> Result<Vec<ItemId>, StorageError> {
        self.select(collection, |_| true)
    }

    fn item_type(&self, id: ItemId) -> Result<ItemType, StorageError> {
        self.get_item(id).map(|record| record.item_type())
    }
}

impl OutcomeSink for InMemoryCollection {
    fn apply(&self, id: ItemId, rating: Rating, elapsed_seconds: f64) -> Result<(), SinkError> {
        let rejected = self
            .rejecting
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .contains(&id);
        if rejected {
            return Err(SinkError::Rejected {
                id,
                reason: "item is locked".into(),
            });
        }

        let mut items = self
            .items
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let record = items.get_mut(&id).ok_or(SinkError::UnknownItem(id))?;

        record.state = match (record.state, rating) {
            (ItemState::New | ItemState::Learning, Rating::Again) => ItemState::Learning,
            (ItemState::Review | ItemState::Relearning, Rating::Again) => ItemState::Relearning,
            (_, _) => ItemState::Review,
        };
        record.due = false;
        drop(items);

        log::debug!("applied {rating} to item {id} ({elapsed_seconds:.1}s)");
        self.outcomes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?
            .push(AppliedOutcome {
                id,
                rating,
                elapsed_seconds,
            });
        Ok(())
    }
}
