//! Shared error types for the services crate.

use thiserror::Error;

use drill_core::model::{CollectionId, SessionSummaryError};
use storage::repository::StorageError;

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no items available in collection {collection}")]
    EmptyPool { collection: CollectionId },
    #[error("no item is waiting for an answer")]
    NoActiveItem,
    #[error("session has not been committed")]
    NotCommitted,
    #[error("session already committed")]
    AlreadyCommitted,
    #[error(transparent)]
    Summary(#[from] SessionSummaryError),
    #[error(transparent)]
    Source(#[from] StorageError),
}
