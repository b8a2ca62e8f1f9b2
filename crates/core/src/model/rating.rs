use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur when decoding ratings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RatingError {
    #[error("invalid rating code: {0} (expected 1-4)")]
    InvalidCode(u8),
}

//
// ─── RATING ───────────────────────────────────────────────────────────────────
//

/// Four-level recall rating supplied by the learner.
///
/// Only `Again` means the item has not been learned yet. Every other rating
/// retires the item from its rotation queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// Not recalled. The item goes to the back of its queue.
    Again,
    /// Recalled with significant difficulty.
    Hard,
    /// Recalled correctly.
    Good,
    /// Recalled instantly.
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// Decodes the 1-4 rating scale used by schedulers.
    ///
    /// # Errors
    ///
    /// Returns `RatingError::InvalidCode` if `code` is outside 1-4.
    pub fn from_code(code: u8) -> Result<Self, RatingError> {
        match code {
            1 => Ok(Self::Again),
            2 => Ok(Self::Hard),
            3 => Ok(Self::Good),
            4 => Ok(Self::Easy),
            _ => Err(RatingError::InvalidCode(code)),
        }
    }

    /// Numeric code on the 1-4 scale.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Rating::Again => 1,
            Rating::Hard => 2,
            Rating::Good => 3,
            Rating::Easy => 4,
        }
    }

    /// True for every rating except `Again`.
    #[must_use]
    pub fn is_correct(self) -> bool {
        !matches!(self, Rating::Again)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        };
        f.write_str(name)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
