mod ids;
mod item;
mod rating;
mod session;
mod settings;

pub use ids::{CollectionId, ItemId};
pub use item::ItemType;
pub use rating::{Rating, RatingError};
pub use session::{SessionSummary, SessionSummaryError};
pub use settings::{DEFAULT_SESSION_SIZE, DEFAULT_SET_SIZE, SessionSettings};
