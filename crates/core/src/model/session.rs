use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::model::{CollectionId, Rating};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("committed ratings ({committed}) exceed recorded answers ({answered})")]
    CommitOverflow { committed: usize, answered: usize },
}

/// Aggregate summary for a finished drill session.
///
/// Counts are taken over first answers only, so an item rated `Again` and
/// later `Good` contributes a single `again`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    collection_id: CollectionId,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    committed: usize,
    again: usize,
    hard: usize,
    good: usize,
    easy: usize,
}

impl SessionSummary {
    /// Build a summary from the first answers of a session.
    ///
    /// # Errors
    ///
    /// Returns `SessionSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    /// Returns `SessionSummaryError::CommitOverflow` if `committed` exceeds the answer count.
    pub fn from_answers(
        collection_id: CollectionId,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        committed: usize,
        answers: impl IntoIterator<Item = Rating>,
    ) -> Result<Self, SessionSummaryError> {
        if completed_at < started_at {
            return Err(SessionSummaryError::InvalidTimeRange);
        }

        let mut summary = Self {
            collection_id,
            started_at,
            completed_at,
            committed,
            again: 0,
            hard: 0,
            good: 0,
            easy: 0,
        };
        for rating in answers {
            match rating {
                Rating::Again => summary.again += 1,
                Rating::Hard => summary.hard += 1,
                Rating::Good => summary.good += 1,
                Rating::Easy => summary.easy += 1,
            }
        }

        let answered = summary.total_answers();
        if committed > answered {
            return Err(SessionSummaryError::CommitOverflow {
                committed,
                answered,
            });
        }
        Ok(summary)
    }

    #[must_use]
    pub fn collection_id(&self) -> CollectionId {
        self.collection_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Wall-clock length of the session.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.completed_at - self.started_at
    }

    /// Number of ratings the outcome sink accepted.
    #[must_use]
    pub fn committed(&self) -> usize {
        self.committed
    }

    #[must_use]
    pub fn total_answers(&self) -> usize {
        self.again + self.hard + self.good + self.easy
    }

    #[must_use]
    pub fn count(&self, rating: Rating) -> usize {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn summary_counts_ratings() {
        let now = fixed_now();
        let answers = [
            Rating::Good,
            Rating::Again,
            Rating::Hard,
            Rating::Easy,
            Rating::Good,
        ];

        let summary =
            SessionSummary::from_answers(CollectionId::new(10), now, now, 5, answers).unwrap();

        assert_eq!(summary.total_answers(), 5);
        assert_eq!(summary.count(Rating::Again), 1);
        assert_eq!(summary.count(Rating::Hard), 1);
        assert_eq!(summary.count(Rating::Good), 2);
        assert_eq!(summary.count(Rating::Easy), 1);
        assert_eq!(summary.committed(), 5);
    }

    #[test]
    fn rejects_reversed_time_range() {
        let now = fixed_now();
        let earlier = now - chrono::Duration::seconds(1);
        let err = SessionSummary::from_answers(CollectionId::new(1), now, earlier, 0, [])
            .unwrap_err();
        assert_eq!(err, SessionSummaryError::InvalidTimeRange);
    }

    #[test]
    fn rejects_more_commits_than_answers() {
        let now = fixed_now();
        let err = SessionSummary::from_answers(CollectionId::new(1), now, now, 2, [Rating::Good])
            .unwrap_err();
        assert_eq!(
            err,
            SessionSummaryError::CommitOverflow {
                committed: 2,
                answered: 1
            }
        );
    }
}
