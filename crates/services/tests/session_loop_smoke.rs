use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use drill_core::model::{CollectionId, ItemId, ItemType, Rating, SessionSettings};
use drill_core::time::fixed_now;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use services::{Clock, SessionError, SessionLoopService};
use storage::repository::{InMemoryCollection, ItemRecord, ItemState};

const DECK: CollectionId = CollectionId::new(7);

fn seeded_collection(new: u64, due: u64) -> InMemoryCollection {
    let repo = InMemoryCollection::new();
    for id in 1..=new {
        repo.upsert_item(ItemRecord::new(ItemId::new(id), DECK, ItemState::New))
            .unwrap();
    }
    for id in new + 1..=new + due {
        repo.upsert_item(ItemRecord::new(ItemId::new(id), DECK, ItemState::Review).due())
            .unwrap();
    }
    repo
}

fn loop_service(repo: &InMemoryCollection, settings: SessionSettings) -> SessionLoopService {
    SessionLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    )
    .with_settings(settings)
}

#[test]
fn every_item_is_shown_until_learned_then_committed_once() {
    let repo = seeded_collection(8, 4);
    let svc = loop_service(&repo, SessionSettings::new(100, 5));
    let mut rng = StdRng::seed_from_u64(42);
    let mut session = svc.start_session_with_rng(DECK, &mut rng).unwrap();

    let planned: HashSet<ItemId> = session.items().iter().copied().collect();
    assert_eq!(planned.len(), 12);

    let mut seen = HashSet::new();
    let mut answers = 0;
    while !session.is_complete() {
        let rating = if rng.random_bool(0.3) {
            Rating::Again
        } else {
            Rating::Good
        };
        let result = svc.answer_current(&mut session, rating).unwrap();
        seen.insert(result.item_id);
        answers += 1;
        assert!(answers < 1_000, "session never converged");
    }

    assert_eq!(seen, planned);
    assert_eq!(session.first_answers().len(), 12);

    let report = svc
        .finish_at(&mut session, fixed_now() + Duration::minutes(2))
        .unwrap();
    assert_eq!(report.updated, 12);
    assert!(!report.aborted);
    assert_eq!(report.progress.total_sets, 3);
    assert_eq!(report.statistics.new_total, 8);
    assert_eq!(report.summary.total_answers(), 12);

    let applied = repo.applied_outcomes().unwrap();
    assert_eq!(applied.len(), 12);
    assert!(applied.iter().all(|o| (o.elapsed_seconds - 10.0).abs() < f64::EPSILON));

    for outcome in &applied {
        let record = repo.get_item(outcome.id).unwrap();
        let was_new = outcome.id.value() <= 8;
        let expected = match (outcome.rating, was_new) {
            (Rating::Again, true) => ItemState::Learning,
            (Rating::Again, false) => ItemState::Relearning,
            _ => ItemState::Review,
        };
        assert_eq!(record.state, expected);
        assert_eq!(record.item_type(), ItemType::Review);
        assert!(!record.due);
    }
}

#[test]
fn first_answer_is_what_gets_committed() {
    let repo = seeded_collection(2, 0);
    let svc = loop_service(&repo, SessionSettings::new(10, 2));
    let mut session = svc.start_session(DECK).unwrap();

    let failed = svc.answer_current(&mut session, Rating::Again).unwrap().item_id;
    while !session.is_complete() {
        svc.answer_current(&mut session, Rating::Easy).unwrap();
    }

    svc.finish(&mut session).unwrap();
    let applied = repo.applied_outcomes().unwrap();
    let failed_outcome = applied.iter().find(|o| o.id == failed).unwrap();
    assert_eq!(failed_outcome.rating, Rating::Again);
    assert_eq!(applied.len(), 2);
}

#[test]
fn aborting_commits_only_what_was_answered() {
    let repo = seeded_collection(10, 0);
    let svc = loop_service(&repo, SessionSettings::new(100, 5));
    let mut session = svc.start_session(DECK).unwrap();

    for _ in 0..3 {
        svc.answer_current(&mut session, Rating::Good).unwrap();
    }
    // Shown but never answered.
    svc.next_item(&mut session).unwrap();

    let report = svc
        .finish_at(&mut session, fixed_now() + Duration::seconds(600))
        .unwrap();

    assert!(report.aborted);
    assert_eq!(report.updated, 3);
    assert_eq!(report.progress.completed_items, 3);
    let applied = repo.applied_outcomes().unwrap();
    assert_eq!(applied.len(), 3);
    assert!(applied.iter().all(|o| (o.elapsed_seconds - 60.0).abs() < f64::EPSILON));
}

#[test]
fn a_rejected_outcome_does_not_stop_the_batch() {
    let repo = seeded_collection(4, 0);
    repo.reject_outcomes_for(ItemId::new(2)).unwrap();
    let svc = loop_service(&repo, SessionSettings::new(100, 4));
    let mut session = svc.start_session(DECK).unwrap();

    while !session.is_complete() {
        svc.answer_current(&mut session, Rating::Hard).unwrap();
    }
    let report = svc.finish(&mut session).unwrap();

    assert_eq!(report.updated, 3);
    assert_eq!(report.summary.committed(), 3);
    assert_eq!(report.summary.total_answers(), 4);
    assert_eq!(repo.get_item(ItemId::new(2)).unwrap().state, ItemState::New);
}

#[test]
fn undo_then_reanswer_replaces_the_first_answer() {
    let repo = seeded_collection(3, 0);
    let svc = loop_service(&repo, SessionSettings::new(100, 3));
    let mut session = svc.start_session(DECK).unwrap();

    let first = svc.answer_current(&mut session, Rating::Again).unwrap().item_id;
    svc.next_item(&mut session).unwrap();
    assert_eq!(svc.go_back(&mut session), Some(first));

    let again = svc.answer_current(&mut session, Rating::Good).unwrap();
    assert_eq!(again.item_id, first);
    assert_eq!(session.first_answers().get(first), Some(Rating::Good));
}

#[test]
fn session_size_caps_the_master_list() {
    let repo = seeded_collection(30, 0);
    let svc = loop_service(&repo, SessionSettings::new(12, 5));
    let session = svc.start_session(DECK).unwrap();

    assert_eq!(session.items().len(), 12);
    assert_eq!(session.progress().total_sets, 3);
}

#[test]
fn empty_collection_cannot_start() {
    let repo = InMemoryCollection::new();
    let svc = loop_service(&repo, SessionSettings::default());

    assert!(matches!(
        svc.start_session(DECK),
        Err(SessionError::EmptyPool { .. })
    ));
}
