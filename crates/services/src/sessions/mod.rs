mod answers;
mod commit;
mod plan;
mod progress;
mod queue;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use answers::FirstAnswers;
pub use commit::{
    DEFAULT_SECONDS_PER_ITEM, MAX_SECONDS_PER_ITEM, MIN_SECONDS_PER_ITEM, average_seconds_per_item,
};
pub use plan::{SessionBuilder, SessionPlan};
pub use progress::{SessionProgress, SessionStatistics, percentage};
pub use queue::RotationQueue;
pub use service::Session;
pub use workflow::{SessionAnswerResult, SessionLoopService, SessionReport};
