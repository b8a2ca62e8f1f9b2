use serde::Serialize;
use std::collections::HashMap;

use drill_core::model::{ItemId, ItemType};

use super::answers::FirstAnswers;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub total_items: usize,
    pub completed_items: usize,
    /// Number of sets started so far; doubles as the 1-based current set.
    pub current_set: usize,
    pub total_sets: usize,
    pub remaining_in_queue: usize,
    pub set_size: usize,
    pub is_complete: bool,
}

/// First-answer accuracy, split by item type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatistics {
    pub new_total: usize,
    pub new_correct: usize,
    pub new_percentage: f64,
    pub all_total: usize,
    pub all_correct: usize,
    pub all_percentage: f64,
}

impl SessionStatistics {
    /// Totals count every planned item; "correct" counts first answers other
    /// than `Again`, so unanswered items lower the percentage.
    #[must_use]
    pub fn compute(
        items: &[ItemId],
        item_types: &HashMap<ItemId, ItemType>,
        answers: &FirstAnswers,
    ) -> Self {
        let is_new = |id: &ItemId| item_types.get(id).is_some_and(|t| t.is_new());

        let new_total = items.iter().filter(|id| is_new(id)).count();
        let new_correct = answers
            .iter()
            .filter(|(id, rating)| is_new(id) && rating.is_correct())
            .count();
        let all_total = items.len();
        let all_correct = answers.iter().filter(|(_, rating)| rating.is_correct()).count();

        Self {
            new_total,
            new_correct,
            new_percentage: percentage(new_correct, new_total),
            all_total,
            all_correct,
            all_percentage: percentage(all_correct, all_total),
        }
    }
}

/// `part / whole * 100`, or 0 when `whole` is 0.
#[must_use]
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }

    // Counts are bounded by session size.
    #[allow(clippy::cast_precision_loss)]
    let ratio = part as f64 / whole as f64;

    ratio * 100.0
}
