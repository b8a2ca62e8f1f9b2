//! External collaborators of the drill engine: where items come from and
//! where final ratings go.

#![forbid(unsafe_code)]

pub mod repository;

pub use repository::{
    AppliedOutcome, InMemoryCollection, ItemRecord, ItemSource, ItemState, OutcomeSink, SinkError,
    StorageError,
};
