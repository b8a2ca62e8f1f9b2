use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

use drill_core::model::{CollectionId, ItemId, Rating, SessionSettings, SessionSummary};
use storage::repository::{ItemSource, OutcomeSink};

use super::progress::{SessionProgress, SessionStatistics};
use super::service::Session;
use crate::Clock;
use crate::error::SessionError;

/// Result of answering a single item in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionAnswerResult {
    pub item_id: ItemId,
    pub rating: Rating,
    /// The item went back into its queue and will be shown again.
    pub requeued: bool,
    pub is_complete: bool,
}

/// Everything an end-of-session screen needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    /// Ratings the outcome sink accepted.
    pub updated: usize,
    /// Items learned before the session ended.
    pub completed: usize,
    /// True when the learner stopped before every item was learned.
    pub aborted: bool,
    pub progress: SessionProgress,
    pub statistics: SessionStatistics,
    pub summary: SessionSummary,
}

/// Orchestrates the show/answer/undo loop and the final commit.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    source: Arc<dyn ItemSource>,
    sink: Arc<dyn OutcomeSink>,
    settings: SessionSettings,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(clock: Clock, source: Arc<dyn ItemSource>, sink: Arc<dyn OutcomeSink>) -> Self {
        Self {
            clock,
            source,
            sink,
            settings: SessionSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    /// Start a new session for the given collection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPool` or `SessionError::Source` if no session can be built.
    pub fn start_session(&self, collection: CollectionId) -> Result<Session, SessionError> {
        self.start_session_with_rng(collection, &mut rand::rng())
    }

    /// Start a new session, shuffling with the supplied RNG.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyPool` or `SessionError::Source` if no session can be built.
    pub fn start_session_with_rng<R: Rng + ?Sized>(
        &self,
        collection: CollectionId,
        rng: &mut R,
    ) -> Result<Session, SessionError> {
        Session::build(
            self.source.as_ref(),
            collection,
            self.settings,
            self.clock.now(),
            rng,
        )
    }

    /// The item to show now, recording the display if it is a fresh one.
    ///
    /// Calling this again before answering returns the same item without
    /// another history entry.
    pub fn next_item(&self, session: &mut Session) -> Option<ItemId> {
        if let Some(id) = session.on_display() {
            return Some(id);
        }
        let id = session.get_current_queue()?.peek_head()?;
        session.record_display(id);
        Some(id)
    }

    /// Rate the item on display (showing the next head first if needed).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveItem` if the session has nothing left to answer.
    pub fn answer_current(
        &self,
        session: &mut Session,
        rating: Rating,
    ) -> Result<SessionAnswerResult, SessionError> {
        let item_id = self.next_item(session).ok_or(SessionError::NoActiveItem)?;
        if !session.submit_rating(item_id, rating) {
            return Err(SessionError::NoActiveItem);
        }

        Ok(SessionAnswerResult {
            item_id,
            rating,
            requeued: !rating.is_correct(),
            is_complete: session.is_complete(),
        })
    }

    /// Return to the previously shown item, if there is one.
    pub fn go_back(&self, session: &mut Session) -> Option<ItemId> {
        session.go_back()
    }

    /// Commit the session now, whether it finished or was abandoned.
    ///
    /// # Errors
    ///
    /// See [`SessionLoopService::finish_at`].
    pub fn finish(&self, session: &mut Session) -> Result<SessionReport, SessionError> {
        self.finish_at(session, self.clock.now())
    }

    /// Commit the session with an explicit end time and build the report.
    ///
    /// An `ended_at` before the session start (a clock that stepped back) is
    /// treated as the start time, so a commit always yields a report.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyCommitted` if the session was already finished.
    pub fn finish_at(
        &self,
        session: &mut Session,
        ended_at: DateTime<Utc>,
    ) -> Result<SessionReport, SessionError> {
        if session.is_committed() {
            return Err(SessionError::AlreadyCommitted);
        }

        let aborted = !session.is_complete();
        if aborted {
            log::info!(
                "session for collection {} ended early with {}/{} items learned",
                session.collection_id(),
                session.completed_count(),
                session.items().len()
            );
        }

        let started_at = session.started_at();
        if ended_at < started_at {
            log::warn!(
                "end time {ended_at} precedes session start {started_at}; using the start time"
            );
        }
        let updated = session.commit(self.sink.as_ref(), ended_at.max(started_at));
        Ok(SessionReport {
            updated,
            completed: session.completed_count(),
            aborted,
            progress: session.progress(),
            statistics: session.statistics(),
            summary: session.summary()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::time::{fixed_clock, fixed_now};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use storage::repository::{InMemoryCollection, ItemRecord, ItemState};

    const DECK: CollectionId = CollectionId::new(3);

    fn service(items: u64, settings: SessionSettings) -> (SessionLoopService, InMemoryCollection) {
        let repo = InMemoryCollection::new();
        for id in 1..=items {
            repo.upsert_item(ItemRecord::new(ItemId::new(id), DECK, ItemState::New))
                .unwrap();
        }
        let svc =
            SessionLoopService::new(fixed_clock(), Arc::new(repo.clone()), Arc::new(repo.clone()))
                .with_settings(settings);
        (svc, repo)
    }

    #[test]
    fn next_item_is_stable_until_answered() {
        let (svc, _) = service(3, SessionSettings::new(10, 3));
        let mut session = svc
            .start_session_with_rng(DECK, &mut StdRng::seed_from_u64(1))
            .unwrap();

        let first = svc.next_item(&mut session).unwrap();
        assert_eq!(svc.next_item(&mut session), Some(first));
        assert_eq!(session.history(), &[first]);

        let result = svc.answer_current(&mut session, Rating::Again).unwrap();
        assert_eq!(result.item_id, first);
        assert!(result.requeued);
        assert!(!result.is_complete);
        assert_ne!(svc.next_item(&mut session), Some(first));
    }

    #[test]
    fn answering_a_finished_session_is_an_error() {
        let (svc, _) = service(1, SessionSettings::new(10, 3));
        let mut session = svc.start_session(DECK).unwrap();

        let result = svc.answer_current(&mut session, Rating::Good).unwrap();
        assert!(result.is_complete);
        assert!(matches!(
            svc.answer_current(&mut session, Rating::Good),
            Err(SessionError::NoActiveItem)
        ));
        assert_eq!(svc.next_item(&mut session), None);
    }

    #[test]
    fn go_back_redisplays_without_new_history() {
        let (svc, _) = service(3, SessionSettings::new(10, 3));
        let mut session = svc.start_session(DECK).unwrap();

        let first = svc.answer_current(&mut session, Rating::Good).unwrap().item_id;
        svc.next_item(&mut session).unwrap();

        assert_eq!(svc.go_back(&mut session), Some(first));
        assert_eq!(svc.next_item(&mut session), Some(first));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn finish_commits_once_and_reports() {
        let (svc, repo) = service(4, SessionSettings::new(10, 2));
        let mut session = svc.start_session(DECK).unwrap();
        while !session.is_complete() {
            svc.answer_current(&mut session, Rating::Good).unwrap();
        }

        let report = svc
            .finish_at(&mut session, fixed_now() + chrono::Duration::seconds(80))
            .unwrap();

        assert_eq!(report.updated, 4);
        assert!(!report.aborted);
        assert_eq!(report.progress.completed_items, 4);
        assert_eq!(report.statistics.all_correct, 4);
        assert_eq!(report.summary.count(Rating::Good), 4);

        let applied = repo.applied_outcomes().unwrap();
        assert_eq!(applied.len(), 4);
        assert!(applied.iter().all(|o| (o.elapsed_seconds - 20.0).abs() < f64::EPSILON));

        assert!(matches!(
            svc.finish(&mut session),
            Err(SessionError::AlreadyCommitted)
        ));
        assert_eq!(repo.applied_outcomes().unwrap().len(), 4);
    }

    #[test]
    fn end_time_before_start_still_reports_the_commit() {
        let (svc, repo) = service(3, SessionSettings::new(10, 3));
        let mut session = svc.start_session(DECK).unwrap();
        svc.answer_current(&mut session, Rating::Good).unwrap();

        let report = svc
            .finish_at(&mut session, fixed_now() - chrono::Duration::seconds(5))
            .unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(report.summary.duration(), chrono::Duration::zero());
        assert_eq!(session.ended_at(), Some(fixed_now()));
        let applied = repo.applied_outcomes().unwrap();
        assert_eq!(applied.len(), 1);
        assert!((applied[0].elapsed_seconds - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn early_finish_is_reported_as_aborted() {
        let (svc, repo) = service(5, SessionSettings::new(10, 5));
        let mut session = svc.start_session(DECK).unwrap();
        svc.answer_current(&mut session, Rating::Again).unwrap();

        let report = svc.finish(&mut session).unwrap();

        assert!(report.aborted);
        assert_eq!(report.updated, 1);
        assert_eq!(report.completed, 0);
        assert_eq!(repo.applied_outcomes().unwrap()[0].rating, Rating::Again);
    }
}
