use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Duration;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use drill_core::model::{CollectionId, ItemId, Rating, RatingError};
use services::{Clock, SessionError, SessionLoopService, SessionReport};
use storage::repository::{InMemoryCollection, ItemRecord, ItemState, StorageError};

mod cli;
mod learner;

use cli::Args;
use learner::SimulatedLearner;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Rating(#[from] RatingError),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Ids are assigned in blocks: new items first, then learning, then due reviews.
fn seed_collection(
    collection: CollectionId,
    new_items: u64,
    learning_items: u64,
    due_items: u64,
) -> Result<InMemoryCollection, StorageError> {
    let repo = InMemoryCollection::new();
    let mut next_id = 0;
    let mut seed = |count: u64, state: ItemState, due: bool| -> Result<(), StorageError> {
        for _ in 0..count {
            next_id += 1;
            let record = ItemRecord::new(ItemId::new(next_id), collection, state);
            repo.upsert_item(if due { record.due() } else { record })?;
        }
        Ok(())
    };
    seed(new_items, ItemState::New, false)?;
    seed(learning_items, ItemState::Learning, false)?;
    seed(due_items, ItemState::Review, true)?;
    Ok(repo)
}

fn print_report(out: &mut impl Write, report: &SessionReport) -> io::Result<()> {
    let stats = &report.statistics;
    writeln!(out)?;
    if report.aborted {
        writeln!(out, "Session stopped early.")?;
    } else {
        writeln!(out, "Session complete.")?;
    }
    writeln!(
        out,
        "Learned {}/{} items over {} sets; {} ratings saved.",
        report.completed,
        report.progress.total_items,
        report.progress.total_sets,
        report.updated,
    )?;
    writeln!(
        out,
        "New items: {}/{} right first time ({:.0}%)",
        stats.new_correct, stats.new_total, stats.new_percentage
    )?;
    writeln!(
        out,
        "All items: {}/{} right first time ({:.0}%)",
        stats.all_correct, stats.all_total, stats.all_percentage
    )?;
    write!(out, "Took {}s:", report.summary.duration().num_seconds())?;
    for rating in Rating::ALL {
        write!(out, " {rating} {}", report.summary.count(rating))?;
    }
    writeln!(out)
}

fn run(args: &Args) -> Result<(), AppError> {
    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    log::info!("using seed {seed}");

    let collection = args.collection_id();
    let repo = seed_collection(
        collection,
        args.new_items,
        args.learning_items,
        args.due_items,
    )?;

    let started_at = Clock::System.now();
    let svc = SessionLoopService::new(
        Clock::fixed(started_at),
        Arc::new(repo.clone()),
        Arc::new(repo),
    )
    .with_settings(args.settings());

    let mut session = svc.start_session_with_rng(collection, &mut StdRng::seed_from_u64(seed))?;
    let progress = session.progress();
    log::info!(
        "drilling {} items from collection {collection} in {} sets of {}",
        progress.total_items,
        progress.total_sets,
        progress.set_size
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let answers = SimulatedLearner::new(seed, args.again_rate)
        .undo_every(args.undo_every)
        .abort_after(args.abort_after)
        .drill(&svc, &mut session, &mut out)?;

    let answers = i64::try_from(answers).unwrap_or(i64::MAX);
    let elapsed = Duration::seconds(answers.saturating_mul(i64::from(args.seconds_per_answer)));
    let report = svc.finish_at(&mut session, started_at + elapsed)?;
    print_report(&mut out, &report)?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::time::fixed_now;
    use services::Session;
    use storage::repository::ItemSource;

    #[test]
    fn seeded_collection_has_new_and_due_items() {
        let deck = CollectionId::new(2);
        let repo = seed_collection(deck, 3, 1, 2).unwrap();

        assert_eq!(repo.new_items(deck).unwrap().len(), 3);
        assert_eq!(repo.learning_items(deck).unwrap(), vec![ItemId::new(4)]);
        assert_eq!(repo.due_items(deck).unwrap(), vec![ItemId::new(5), ItemId::new(6)]);
    }

    #[test]
    fn report_mentions_early_stop() {
        let deck = CollectionId::new(2);
        let repo = seed_collection(deck, 4, 0, 0).unwrap();
        let svc = SessionLoopService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo),
        );
        let mut session: Session = svc.start_session(deck).unwrap();
        svc.answer_current(&mut session, Rating::Good).unwrap();
        let report = svc.finish(&mut session).unwrap();

        let mut out = Vec::new();
        print_report(&mut out, &report).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Session stopped early."));
        assert!(text.contains("Learned 1/4 items"));
        assert!(text.contains("again 0 hard 0 good 1 easy 0"));
    }
}
