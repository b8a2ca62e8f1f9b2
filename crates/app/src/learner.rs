use std::io::Write;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use drill_core::model::{Rating, RatingError};
use services::{Session, SessionLoopService};

use crate::AppError;

/// A scripted learner that answers whatever the session shows.
pub struct SimulatedLearner {
    rng: StdRng,
    again_rate: f64,
    undo_every: Option<usize>,
    abort_after: Option<usize>,
}

impl SimulatedLearner {
    #[must_use]
    pub fn new(seed: u64, again_rate: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            again_rate,
            undo_every: None,
            abort_after: None,
        }
    }

    #[must_use]
    pub fn undo_every(mut self, answers: Option<usize>) -> Self {
        self.undo_every = answers;
        self
    }

    #[must_use]
    pub fn abort_after(mut self, answers: Option<usize>) -> Self {
        self.abort_after = answers;
        self
    }

    /// `again` with the configured probability, otherwise a code from 2-4.
    fn pick_rating(&mut self) -> Result<Rating, RatingError> {
        if self.rng.random_bool(self.again_rate) {
            return Ok(Rating::Again);
        }
        Rating::from_code(self.rng.random_range(2..=4))
    }

    /// Answer until the session completes or the abort threshold is hit.
    ///
    /// Returns the number of ratings given, undone ones included.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session rejects an answer, and
    /// `AppError::Output` if the transcript cannot be written. `AppError::Rating`
    /// is only possible if the rating codes drawn fall outside 1-4.
    pub fn drill(
        &mut self,
        svc: &SessionLoopService,
        session: &mut Session,
        out: &mut impl Write,
    ) -> Result<usize, AppError> {
        let mut answers = 0;
        while !session.is_complete() {
            if self.abort_after.is_some_and(|limit| answers >= limit) {
                writeln!(out, "stopping after {answers} answers")?;
                break;
            }

            let rating = self.pick_rating()?;
            let result = svc.answer_current(session, rating)?;
            answers += 1;

            let progress = session.progress();
            writeln!(
                out,
                "[set {}/{}] item {} -> {} ({}){}  ({}/{} learned)",
                progress.current_set,
                progress.total_sets,
                result.item_id,
                result.rating,
                result.rating.code(),
                if result.requeued { " (again later)" } else { "" },
                progress.completed_items,
                progress.total_items,
            )?;

            if self
                .undo_every
                .is_some_and(|every| answers % every == 0 && !session.is_complete())
            {
                // Show the next item so there is something to step back from.
                svc.next_item(session);
                if let Some(id) = svc.go_back(session) {
                    writeln!(out, "  undo -> back to item {id}")?;
                }
            }
        }
        Ok(answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::model::{CollectionId, ItemId, SessionSettings};
    use drill_core::time::fixed_clock;
    use std::sync::Arc;
    use storage::repository::{InMemoryCollection, ItemRecord, ItemState};

    const DECK: CollectionId = CollectionId::new(1);

    fn service(items: u64) -> SessionLoopService {
        let repo = InMemoryCollection::new();
        for id in 1..=items {
            repo.upsert_item(ItemRecord::new(ItemId::new(id), DECK, ItemState::New))
                .unwrap();
        }
        SessionLoopService::new(fixed_clock(), Arc::new(repo.clone()), Arc::new(repo))
            .with_settings(SessionSettings::new(100, 3))
    }

    #[test]
    fn learner_finishes_the_session() {
        let svc = service(7);
        let mut session = svc
            .start_session_with_rng(DECK, &mut StdRng::seed_from_u64(5))
            .unwrap();
        let mut out = Vec::new();

        let answers = SimulatedLearner::new(5, 0.3)
            .drill(&svc, &mut session, &mut out)
            .unwrap();

        assert!(session.is_complete());
        assert!(answers >= 7);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), answers);
    }

    #[test]
    fn learner_with_undo_still_finishes() {
        let svc = service(6);
        let mut session = svc.start_session(DECK).unwrap();

        SimulatedLearner::new(9, 0.2)
            .undo_every(Some(2))
            .drill(&svc, &mut session, &mut std::io::sink())
            .unwrap();

        assert!(session.is_complete());
        assert_eq!(session.first_answers().len(), 6);
    }

    #[test]
    fn learner_stops_at_abort_threshold() {
        let svc = service(10);
        let mut session = svc.start_session(DECK).unwrap();

        let answers = SimulatedLearner::new(1, 0.0)
            .abort_after(Some(4))
            .drill(&svc, &mut session, &mut std::io::sink())
            .unwrap();

        assert_eq!(answers, 4);
        assert!(!session.is_complete());
        assert_eq!(session.completed_count(), 4);
    }
}
