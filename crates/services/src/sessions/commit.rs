//! Timing policy for the deferred batch commit.
//!
//! Ratings are applied long after they were given, so the scheduler never sees
//! real per-item timings. Each item is instead credited with the session's
//! average time per answer, kept within `[MIN_SECONDS_PER_ITEM, MAX_SECONDS_PER_ITEM]`.

/// Lower bound on the synthesized time per item.
pub const MIN_SECONDS_PER_ITEM: f64 = 1.0;

/// Upper bound on the synthesized time per item.
pub const MAX_SECONDS_PER_ITEM: f64 = 60.0;

/// Time credited per item when nothing was answered.
pub const DEFAULT_SECONDS_PER_ITEM: f64 = 5.0;

/// Average seconds per answer, clamped to the policy bounds.
#[must_use]
pub fn average_seconds_per_item(elapsed_seconds: f64, answers: usize) -> f64 {
    if answers == 0 {
        return DEFAULT_SECONDS_PER_ITEM;
    }

    #[allow(clippy::cast_precision_loss)]
    let answers = answers as f64;

    (elapsed_seconds / answers).clamp(MIN_SECONDS_PER_ITEM, MAX_SECONDS_PER_ITEM)
}
