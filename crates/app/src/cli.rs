use clap::Parser;
use clap::builder::TypedValueParser;

use drill_core::model::{CollectionId, DEFAULT_SESSION_SIZE, DEFAULT_SET_SIZE, SessionSettings};

/// Run a simulated drill session against a seeded in-memory collection.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Collection to drill.
    #[arg(long, env = "DRILL_COLLECTION", default_value_t = 1)]
    pub collection: u64,

    /// Maximum number of items in one session.
    #[arg(long, env = "DRILL_SESSION_SIZE", default_value_t = DEFAULT_SESSION_SIZE)]
    pub session_size: usize,

    /// Items per rotation set.
    #[arg(
        long,
        env = "DRILL_SET_SIZE",
        default_value_t = DEFAULT_SET_SIZE,
        value_parser = clap::value_parser!(u16).range(3..=10).map(usize::from)
    )]
    pub set_size: usize,

    /// New items to seed the collection with.
    #[arg(long, default_value_t = 20)]
    pub new_items: u64,

    /// Items still in learning steps to seed the collection with.
    #[arg(long, default_value_t = 5)]
    pub learning_items: u64,

    /// Due review items to seed the collection with.
    #[arg(long, default_value_t = 10)]
    pub due_items: u64,

    /// Chance that the simulated learner answers `again`.
    #[arg(long, default_value_t = 0.25, value_parser = parse_again_rate)]
    pub again_rate: f64,

    /// Undo after every N answers.
    #[arg(long, value_parser = clap::value_parser!(u16).range(2..).map(usize::from))]
    pub undo_every: Option<usize>,

    /// Stop the session after N answers.
    #[arg(long)]
    pub abort_after: Option<usize>,

    /// Seconds the simulated learner spends per answer.
    #[arg(long, default_value_t = 4)]
    pub seconds_per_answer: u32,

    /// Seed for the shuffle and the learner. Random when omitted.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Args {
    #[must_use]
    pub fn collection_id(&self) -> CollectionId {
        CollectionId::new(self.collection)
    }

    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        SessionSettings::new(self.session_size, self.set_size)
    }
}

fn parse_again_rate(raw: &str) -> Result<f64, String> {
    let rate: f64 = raw.parse().map_err(|_| format!("`{raw}` is not a number"))?;
    if (0.0..=0.9).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("again rate must be between 0.0 and 0.9, got {rate}"))
    }
}
