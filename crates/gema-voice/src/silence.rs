//! Silence Detector — decides when the debounce timer is rearmed or cancelled.
//!
//! Pure function of `(current transcript, last seen, status)`. Partial-result
//! callbacks fire at high frequency; keeping this logic pure makes the turn
//! machine's invariants auditable without hidden mutation.

use crate::turn::TurnStatus;
use std::time::Duration;

/// Fixed delay after the last transcript change before an utterance is
/// treated as complete.
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(2000);

/// What the Turn Controller should do with its single debounce timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SilenceAction {
    /// Cancel any pending timer and reset the last-seen guard.
    Cancel,
    /// Cancel any running timer, update last-seen, arm a fresh timer.
    Rearm,
    /// Unchanged non-empty input: the running timer already covers it.
    None,
}

/// Evaluate one transcript update. Only active while listening; any other
/// status cancels and clears.
pub fn evaluate(current: &str, last_seen: &str, status: TurnStatus) -> SilenceAction {
    if status != TurnStatus::Listening {
        return SilenceAction::Cancel;
    }
    if current.trim().is_empty() {
        return SilenceAction::Cancel;
    }
    if current == last_seen {
        return SilenceAction::None;
    }
    SilenceAction::Rearm
}
