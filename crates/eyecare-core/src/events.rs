use serde::{Deserialize, Serialize};

use crate::clock::Millis;

/// Everything a timer engine reports back to its owner.
///
/// An engine has exactly one owner, and that owner is its only tick and
/// completion listener: events are returned from `poll`/`complete` rather
/// than pushed through stored callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEvent {
    /// The displayed whole-second remaining value changed.
    Tick { remaining_secs: u64, total_secs: u64 },
    /// The countdown ended, naturally or by force.
    ///
    /// `finished_at` is the instant the countdown actually reached zero,
    /// which can be earlier than the poll that noticed it.
    Completed { finished_at: Millis },
}
