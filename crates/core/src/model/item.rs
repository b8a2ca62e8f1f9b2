use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an item, captured once when a session is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// Never studied before.
    New,
    /// Anything with prior history: learning, review or relearning.
    Review,
}

impl ItemType {
    #[must_use]
    pub fn is_new(self) -> bool {
        matches!(self, ItemType::New)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemType::New => f.write_str("new"),
            ItemType::Review => f.write_str("review"),
        }
    }
}
