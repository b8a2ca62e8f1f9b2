#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use drill_core::Clock;

pub use error::SessionError;

pub use sessions::{
    FirstAnswers, RotationQueue, Session, SessionAnswerResult, SessionBuilder, SessionLoopService,
    SessionPlan, SessionProgress, SessionReport, SessionStatistics,
};
