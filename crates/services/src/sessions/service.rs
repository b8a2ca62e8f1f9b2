use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::fmt;

use drill_core::model::{CollectionId, ItemId, ItemType, Rating, SessionSettings, SessionSummary};
use drill_core::time::elapsed_seconds;
use storage::repository::{ItemSource, OutcomeSink};

use super::answers::FirstAnswers;
use super::commit::average_seconds_per_item;
use super::plan::{SessionBuilder, SessionPlan};
use super::progress::{SessionProgress, SessionStatistics};
use super::queue::RotationQueue;
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory drill session over a shuffled master list.
///
/// The master list is cut into fixed windows of `set_size` items. Each window
/// becomes a `RotationQueue` that cycles until every item in it is rated
/// something other than `Again`. Ratings are only kept as first answers and
/// reach the outcome sink in one batch via [`Session::commit`].
///
/// Misuse (rating an item that is not at the queue head, undoing with no
/// history) is a no-op that returns `false`/`None`.
pub struct Session {
    collection_id: CollectionId,
    settings: SessionSettings,
    items: Vec<ItemId>,
    item_types: HashMap<ItemId, ItemType>,
    completed: HashSet<ItemId>,
    set_index: usize,
    queue: Option<RotationQueue>,
    first_answers: FirstAnswers,
    history: Vec<ItemId>,
    on_display: Option<ItemId>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    committed: Option<usize>,
}

impl Session {
    /// Draw items from `source` and start a session.
    ///
    /// `started_at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPool` if the collection has no items.
    /// Returns `SessionError::Source` if the item source fails.
    pub fn build<R: Rng + ?Sized>(
        source: &dyn ItemSource,
        collection_id: CollectionId,
        settings: SessionSettings,
        started_at: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Self, SessionError> {
        let plan = SessionBuilder::new(source, settings).build(collection_id, rng)?;
        log::debug!(
            "planned {} of {} items ({} new) from collection {collection_id}",
            plan.total(),
            plan.pool_size,
            plan.new_count()
        );
        Ok(Self::from_plan(collection_id, plan, settings, started_at))
    }

    /// Start a session over an existing plan, keeping its order.
    #[must_use]
    pub fn from_plan(
        collection_id: CollectionId,
        plan: SessionPlan,
        settings: SessionSettings,
        started_at: DateTime<Utc>,
    ) -> Self {
        let mut items = plan.items;
        items.truncate(settings.session_size());
        Self {
            collection_id,
            settings,
            items,
            item_types: plan.item_types,
            completed: HashSet::new(),
            set_index: 0,
            queue: None,
            first_answers: FirstAnswers::new(),
            history: Vec::new(),
            on_display: None,
            started_at,
            ended_at: None,
            committed: None,
        }
    }

    #[must_use]
    pub fn collection_id(&self) -> CollectionId {
        self.collection_id
    }

    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// The shuffled master list.
    #[must_use]
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    #[must_use]
    pub fn item_type(&self, id: ItemId) -> Option<ItemType> {
        self.item_types.get(&id).copied()
    }

    #[must_use]
    pub fn is_completed(&self, id: ItemId) -> bool {
        self.completed.contains(&id)
    }

    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Number of rotation queues created so far.
    #[must_use]
    pub fn set_index(&self) -> usize {
        self.set_index
    }

    /// The live queue, without advancing to a new set.
    #[must_use]
    pub fn active_queue(&self) -> Option<&RotationQueue> {
        self.queue.as_ref()
    }

    #[must_use]
    pub fn first_answers(&self) -> &FirstAnswers {
        &self.first_answers
    }

    /// Every display event so far, repeats included.
    #[must_use]
    pub fn history(&self) -> &[ItemId] {
        &self.history
    }

    /// Item shown and not yet answered.
    #[must_use]
    pub fn on_display(&self) -> Option<ItemId> {
        self.on_display
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed.is_some()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed.len() >= self.items.len()
    }

    /// The live queue if it still has items, otherwise the next set's queue.
    ///
    /// Returns `None` once the session is complete or out of sets.
    pub fn get_current_queue(&mut self) -> Option<&RotationQueue> {
        if self.is_complete() {
            return None;
        }
        let live = self.queue.as_ref().is_some_and(|queue| !queue.is_empty());
        if live {
            return self.queue.as_ref();
        }
        self.advance_set()
    }

    /// Open the next fixed window of the master list as a new queue.
    ///
    /// Items already completed are filtered out of the window and are not
    /// backfilled from later windows. Returns `None` when the filtered window
    /// is empty.
    pub fn advance_set(&mut self) -> Option<&RotationQueue> {
        let set_size = self.settings.set_size();
        let start = self.set_index.saturating_mul(set_size);
        let end = start.saturating_add(set_size).min(self.items.len());
        if start >= end {
            return None;
        }

        let remaining: Vec<ItemId> = self.items[start..end]
            .iter()
            .copied()
            .filter(|id| !self.completed.contains(id))
            .collect();
        if remaining.is_empty() {
            return None;
        }

        self.set_index += 1;
        log::debug!(
            "starting set {}/{} with {} items",
            self.set_index,
            self.settings.sets_for(self.items.len()),
            remaining.len()
        );
        self.queue = Some(RotationQueue::new(remaining, set_size));
        self.queue.as_ref()
    }

    /// Note that `id` is now being shown.
    pub fn record_display(&mut self, id: ItemId) {
        self.history.push(id);
        self.on_display = Some(id);
    }

    /// Store `rating` unless `id` already has a first answer.
    pub fn record_first_answer(&mut self, id: ItemId, rating: Rating) -> bool {
        self.first_answers.record(id, rating)
    }

    /// Apply one rating to the head of the live queue.
    ///
    /// `Again` rotates the item to the back of its queue; anything else retires
    /// it and marks it complete. Returns `false` without changing anything if
    /// `id` is not the current head.
    pub fn submit_rating(&mut self, id: ItemId, rating: Rating) -> bool {
        let Some(queue) = self.queue.as_mut() else {
            return false;
        };
        if queue.peek_head() != Some(id) {
            return false;
        }

        self.first_answers.record(id, rating);
        if rating.is_correct() {
            queue.mark_known();
            self.completed.insert(id);
        } else {
            queue.mark_unknown();
        }
        self.on_display = None;
        true
    }

    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.history.len() > 1
    }

    /// Step back to the previously shown item.
    ///
    /// Drops the current display from history and puts the previous item back
    /// at the head of the live queue with its completion and first answer
    /// cleared. Only the live queue is touched: an item from an earlier set is
    /// moved into the current one.
    pub fn go_back(&mut self) -> Option<ItemId> {
        if !self.can_go_back() {
            return None;
        }
        self.history.pop();
        let previous = *self.history.last()?;

        let set_size = self.settings.set_size();
        self.queue
            .get_or_insert_with(|| RotationQueue::new(Vec::new(), set_size))
            .push_front(previous);
        self.completed.remove(&previous);
        self.first_answers.forget(previous);
        self.on_display = Some(previous);

        log::debug!("stepped back to item {previous}");
        Some(previous)
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total_items: self.items.len(),
            completed_items: self.completed.len(),
            current_set: self.set_index,
            total_sets: self.settings.sets_for(self.items.len()),
            remaining_in_queue: self
                .queue
                .as_ref()
                .map_or(0, RotationQueue::remaining_count),
            set_size: self.settings.set_size(),
            is_complete: self.is_complete(),
        }
    }

    #[must_use]
    pub fn statistics(&self) -> SessionStatistics {
        SessionStatistics::compute(&self.items, &self.item_types, &self.first_answers)
    }

    /// Replay first answers to `sink` and return how many it accepted.
    ///
    /// Every answer is credited with the session's clamped average time per
    /// item. A failed item is logged and skipped. The batch runs at most once;
    /// later calls log a warning and return 0.
    pub fn commit(&mut self, sink: &dyn OutcomeSink, ended_at: DateTime<Utc>) -> usize {
        if self.committed.is_some() {
            log::warn!(
                "session for collection {} already committed; ignoring",
                self.collection_id
            );
            return 0;
        }

        self.ended_at = Some(ended_at);
        let elapsed = elapsed_seconds(self.started_at, ended_at);
        let per_item = average_seconds_per_item(elapsed, self.first_answers.len());

        let mut updated = 0;
        for (id, rating) in self.first_answers.iter() {
            match sink.apply(id, rating, per_item) {
                Ok(()) => updated += 1,
                Err(err) => log::warn!("could not commit {rating} for item {id}: {err}"),
            }
        }

        log::info!(
            "committed {updated}/{} ratings for collection {} at {per_item:.1}s per item",
            self.first_answers.len(),
            self.collection_id
        );
        self.committed = Some(updated);
        updated
    }

    /// Summary of a committed session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotCommitted` before [`Session::commit`] has run.
    /// Returns `SessionError::Summary` if the end time precedes the start time.
    pub fn summary(&self) -> Result<SessionSummary, SessionError> {
        let (Some(ended_at), Some(committed)) = (self.ended_at, self.committed) else {
            return Err(SessionError::NotCommitted);
        };
        Ok(SessionSummary::from_answers(
            self.collection_id,
            self.started_at,
            ended_at,
            committed,
            self.first_answers.iter().map(|(_, rating)| rating),
        )?)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("collection_id", &self.collection_id)
            .field("items_len", &self.items.len())
            .field("completed_len", &self.completed.len())
            .field("set_index", &self.set_index)
            .field("answers_len", &self.first_answers.len())
            .field("history_len", &self.history.len())
            .field("started_at", &self.started_at)
            .field("ended_at", &self.ended_at)
            .field("committed", &self.committed)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
