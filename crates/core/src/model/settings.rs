use serde::Serialize;

/// Items per session when nothing else is configured.
pub const DEFAULT_SESSION_SIZE: usize = 100;

/// Items per rotation set when nothing else is configured.
pub const DEFAULT_SET_SIZE: usize = 5;

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Resolved sizing for a drill session.
///
/// Bounds are owned by whoever collects the values (CLI or UI). A zero in
/// either field is accepted and yields a session that is exhausted from the
/// start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionSettings {
    session_size: usize,
    set_size: usize,
}

impl SessionSettings {
    #[must_use]
    pub fn new(session_size: usize, set_size: usize) -> Self {
        Self {
            session_size,
            set_size,
        }
    }

    /// Upper bound on the number of items drawn into a session.
    #[must_use]
    pub fn session_size(&self) -> usize {
        self.session_size
    }

    /// Capacity of each rotation queue.
    #[must_use]
    pub fn set_size(&self) -> usize {
        self.set_size
    }

    /// Number of sets needed to cover `total_items`, rounding up.
    #[must_use]
    pub fn sets_for(&self, total_items: usize) -> usize {
        if self.set_size == 0 {
            0
        } else {
            total_items.div_ceil(self.set_size)
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_SIZE, DEFAULT_SET_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let settings = SessionSettings::default();
        assert_eq!(settings.session_size(), DEFAULT_SESSION_SIZE);
        assert_eq!(settings.set_size(), DEFAULT_SET_SIZE);
    }

    #[test]
    fn sets_for_rounds_up_and_tolerates_zero() {
        let settings = SessionSettings::new(10, 3);
        assert_eq!(settings.sets_for(6), 2);
        assert_eq!(settings.sets_for(7), 3);
        assert_eq!(settings.sets_for(0), 0);
        assert_eq!(SessionSettings::new(10, 0).sets_for(7), 0);
    }
}
