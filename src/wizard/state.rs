//! Wizard position state — the index machine behind the controller.

use serde::{Deserialize, Serialize};

/// Outcome of a forward navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// Moved forward to the given step index.
    Advanced { index: usize },
    /// No forward transition was taken; position unchanged. The caller keeps
    /// the user on the current step.
    Blocked,
}

/// Outcome of a backward navigation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RetreatOutcome {
    /// Moved back to the given step index.
    Retreated { index: usize },
    /// Already at the first step; the landing screen outside the step array
    /// takes over. Position unchanged.
    DelegatedToExit,
}

/// Mutable session position.
///
/// Owned exclusively by the controller; presentation layers only ever see
/// snapshots. Invariants: `current_index < step_count` and
/// `visited_max_index >= current_index`, with `visited_max_index`
/// monotonically non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    /// Index of the active step.
    pub current_index: usize,
    /// Highest index reached this session. Drives progress coloring only,
    /// never gating.
    pub visited_max_index: usize,
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            current_index: 0,
            visited_max_index: 0,
        }
    }

    /// Move forward one step. Returns the new index, or `None` at the last
    /// step (no outgoing transition).
    pub fn advance(&mut self, step_count: usize) -> Option<usize> {
        if self.current_index + 1 >= step_count {
            return None;
        }
        self.current_index += 1;
        self.visited_max_index = self.visited_max_index.max(self.current_index);
        Some(self.current_index)
    }

    /// Move back one step. Returns the new index, or `None` at the first
    /// step (backing out of the wizard belongs to the caller).
    pub fn retreat(&mut self) -> Option<usize> {
        if self.current_index == 0 {
            return None;
        }
        self.current_index -= 1;
        Some(self.current_index)
    }

    /// Whether the active step is the last one.
    pub fn is_terminal(&self, step_count: usize) -> bool {
        step_count > 0 && self.current_index == step_count - 1
    }
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_walks_to_terminal() {
        let mut state = WizardState::new();
        assert_eq!(state.advance(3), Some(1));
        assert_eq!(state.advance(3), Some(2));
        assert!(state.is_terminal(3));
        assert_eq!(state.advance(3), None);
        assert_eq!(state.current_index, 2);
    }

    #[test]
    fn retreat_stops_at_zero() {
        let mut state = WizardState::new();
        state.advance(3);
        assert_eq!(state.retreat(), Some(0));
        assert_eq!(state.retreat(), None);
        assert_eq!(state.current_index, 0);
    }

    #[test]
    fn index_stays_in_bounds_under_any_sequence() {
        // Deterministic pseudo-random walk over every small step count.
        for step_count in 2..=6 {
            let mut state = WizardState::new();
            let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
            for _ in 0..500 {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                if seed % 2 == 0 {
                    state.advance(step_count);
                } else {
                    state.retreat();
                }
                assert!(state.current_index < step_count);
                assert!(state.visited_max_index >= state.current_index);
                assert!(state.visited_max_index < step_count);
            }
        }
    }

    #[test]
    fn visited_max_is_monotone() {
        let mut state = WizardState::new();
        state.advance(5);
        state.advance(5);
        assert_eq!(state.visited_max_index, 2);
        state.retreat();
        state.retreat();
        assert_eq!(state.visited_max_index, 2);
        state.advance(5);
        assert_eq!(state.visited_max_index, 2);
        state.advance(5);
        state.advance(5);
        assert_eq!(state.visited_max_index, 3);
    }

    #[test]
    fn single_step_wizard_never_moves() {
        let mut state = WizardState::new();
        assert_eq!(state.advance(1), None);
        assert_eq!(state.retreat(), None);
        assert!(state.is_terminal(1));
    }

    #[test]
    fn outcome_serde_shape() {
        let advanced = serde_json::to_value(AdvanceOutcome::Advanced { index: 2 }).unwrap();
        assert_eq!(advanced["outcome"], "advanced");
        assert_eq!(advanced["index"], 2);

        let blocked = serde_json::to_value(AdvanceOutcome::Blocked).unwrap();
        assert_eq!(blocked["outcome"], "blocked");

        let delegated = serde_json::to_value(RetreatOutcome::DelegatedToExit).unwrap();
        assert_eq!(delegated["outcome"], "delegated_to_exit");
    }
}
