//! Domain types shared by the drill workspace: identifiers, ratings, item
//! classification, session sizing and summaries.

#![forbid(unsafe_code)]

pub mod model;
pub mod time;

pub use time::Clock;
