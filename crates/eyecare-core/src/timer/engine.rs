//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based countdown. It does not use
//! internal threads - the owner is responsible for calling `poll()`
//! periodically, and every operation takes the current instant as an
//! argument.
//!
//! Remaining time is never decremented per call. Each poll recomputes it from
//! the start timestamp and the accumulated pause time:
//!
//! ```text
//! remaining = max(0, duration - floor((now - start - paused_ms) / 1000))
//! ```
//!
//! so late or missing polls (a throttled loop, a suspended process) never
//! accumulate error.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |
//!           v
//!       Completed (stopped) -> Idle (reset) | Running (start)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(1200);
//! engine.start(now_ms);
//! // In a loop, every ~100ms:
//! match engine.poll(now_ms) {
//!     Some(TimerEvent::Tick { remaining_secs, .. }) => render(remaining_secs),
//!     Some(TimerEvent::Completed { .. }) => advance_phase(),
//!     None => {}
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::events::TimerEvent;

/// Timing fields of one countdown.
///
/// This is also the per-phase record persisted in a session snapshot, so
/// the optional fields tolerate being absent on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub duration_seconds: u64,
    /// Cached value of the last computation; frozen while paused or idle.
    #[serde(default)]
    pub remaining_seconds: u64,
    #[serde(default)]
    pub running: bool,
    /// Only meaningful while `running`.
    #[serde(default)]
    pub paused: bool,
    /// Set on the first start after a reset.
    #[serde(default)]
    pub start_timestamp: Option<Millis>,
    /// Total time spent paused since `start_timestamp`.
    #[serde(default)]
    pub accumulated_pause_ms: u64,
    /// Set while paused.
    #[serde(default)]
    pub pause_started_at: Option<Millis>,
}

impl TimerState {
    /// A reset countdown of the given length.
    pub fn idle(duration_seconds: u64) -> Self {
        Self {
            duration_seconds,
            remaining_seconds: duration_seconds,
            running: false,
            paused: false,
            start_timestamp: None,
            accumulated_pause_ms: 0,
            pause_started_at: None,
        }
    }

    /// Remaining whole seconds as of `at`, derived from the timestamps.
    ///
    /// A paused countdown is evaluated at the instant it was paused; an idle
    /// one returns the cached value.
    pub fn remaining_at(&self, at: Millis) -> u64 {
        let Some(start) = self.start_timestamp else {
            return self.remaining_seconds;
        };
        if !self.running {
            return self.remaining_seconds;
        }
        let at = if self.paused {
            match self.pause_started_at {
                Some(paused_at) => paused_at,
                None => return self.remaining_seconds,
            }
        } else {
            at
        };
        let elapsed_secs = self.active_ms(start, at) / 1000;
        self.duration_seconds.saturating_sub(elapsed_secs)
    }

    /// Milliseconds of un-paused time between `start` and `at`, clamped at zero.
    fn active_ms(&self, start: Millis, at: Millis) -> u64 {
        let paused = i64::try_from(self.accumulated_pause_ms).unwrap_or(i64::MAX);
        let active = at.saturating_sub(start).saturating_sub(paused);
        u64::try_from(active).unwrap_or(0)
    }
}

/// Drift-corrected countdown.
///
/// Knows nothing about work or break; the owner decides what a completion
/// means.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    state: TimerState,
    /// Set once the current countdown has reported completion, so a second
    /// `complete()` or a late poll cannot report it again.
    completed: bool,
}

impl TimerEngine {
    /// Create an idle engine with the given duration.
    pub fn new(duration_seconds: u64) -> Self {
        Self {
            state: TimerState::idle(duration_seconds),
            completed: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn remaining(&self) -> u64 {
        self.state.remaining_seconds
    }

    pub fn duration(&self) -> u64 {
        self.state.duration_seconds
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn is_paused(&self) -> bool {
        self.state.running && self.state.paused
    }

    /// 0.0 .. 1.0 elapsed fraction of the countdown.
    pub fn progress(&self) -> f64 {
        let total = self.state.duration_seconds;
        if total == 0 {
            return 0.0;
        }
        let done = total.saturating_sub(self.state.remaining_seconds);
        done as f64 / total as f64
    }

    /// Instant at which the countdown reaches zero if it keeps running.
    ///
    /// `None` while idle or paused.
    pub fn deadline(&self) -> Option<Millis> {
        if !self.state.running || self.state.paused {
            return None;
        }
        let start = self.state.start_timestamp?;
        let paused = i64::try_from(self.state.accumulated_pause_ms).unwrap_or(i64::MAX);
        let duration_ms = i64::try_from(self.state.duration_seconds)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        Some(start.saturating_add(paused).saturating_add(duration_ms))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start from idle, or resume when paused. No-op while counting.
    ///
    /// Returns whether anything changed.
    pub fn start(&mut self, now: Millis) -> bool {
        if self.state.running {
            return self.resume(now);
        }
        self.begin(now);
        true
    }

    /// Start a fresh countdown as if `start` had been called at `at`.
    ///
    /// Only acts on a stopped engine.
    pub fn start_at(&mut self, at: Millis) -> bool {
        if self.state.running {
            return false;
        }
        self.begin(at);
        true
    }

    pub fn pause(&mut self, now: Millis) -> bool {
        if !self.state.running || self.state.paused {
            return false;
        }
        self.state.paused = true;
        self.state.pause_started_at = Some(now);
        true
    }

    /// Fold the pause into `accumulated_pause_ms` and continue counting.
    pub fn resume(&mut self, now: Millis) -> bool {
        if !self.state.running || !self.state.paused {
            return false;
        }
        if let Some(paused_at) = self.state.pause_started_at.take() {
            let pause_ms = u64::try_from(now.saturating_sub(paused_at)).unwrap_or(0);
            self.state.accumulated_pause_ms = self.state.accumulated_pause_ms.saturating_add(pause_ms);
        }
        self.state.paused = false;
        true
    }

    /// Halt counting without touching the start timestamp or pause total.
    pub fn stop(&mut self) {
        self.state.running = false;
        self.state.paused = false;
        self.state.pause_started_at = None;
    }

    /// Stop and return to a full-length idle countdown.
    pub fn reset(&mut self, new_duration: Option<u64>) {
        self.stop();
        let duration = new_duration.unwrap_or(self.state.duration_seconds);
        self.state = TimerState::idle(duration);
        self.completed = false;
    }

    /// Force the countdown to end now (used for skipping).
    ///
    /// Returns `None` if there is no countdown in progress or it already
    /// reported completion.
    pub fn complete(&mut self, now: Millis) -> Option<TimerEvent> {
        if self.state.start_timestamp.is_none() {
            return None;
        }
        self.finish(now)
    }

    /// Recompute remaining time from the timestamps.
    ///
    /// Emits `Tick` only when the whole-second value changes, and
    /// `Completed` (instead of a zero tick) when it reaches zero.
    pub fn poll(&mut self, now: Millis) -> Option<TimerEvent> {
        if !self.state.running || self.state.paused {
            return None;
        }
        let remaining = self.state.remaining_at(now);
        if remaining == 0 {
            let finished_at = self.deadline().map_or(now, |deadline| deadline.min(now));
            return self.finish(finished_at);
        }
        if remaining == self.state.remaining_seconds {
            return None;
        }
        self.state.remaining_seconds = remaining;
        Some(TimerEvent::Tick {
            remaining_secs: remaining,
            total_secs: self.state.duration_seconds,
        })
    }

    /// Replace the timing fields with a persisted record.
    ///
    /// Timestamps are taken verbatim; remaining time is re-derived from them
    /// as of `now`, so time that passed while nothing was polling counts.
    /// A record that claims to be running without a start timestamp is
    /// treated as idle.
    pub fn restore(&mut self, mut state: TimerState, now: Millis) {
        if state.start_timestamp.is_none() {
            state.running = false;
            state.paused = false;
        }
        if !state.running {
            state.paused = false;
            state.pause_started_at = None;
        }
        state.remaining_seconds = state.remaining_seconds.min(state.duration_seconds);
        state.remaining_seconds = state.remaining_at(now);
        self.state = state;
        self.completed = false;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin(&mut self, at: Millis) {
        self.state.running = true;
        self.state.paused = false;
        self.state.start_timestamp = Some(at);
        self.state.accumulated_pause_ms = 0;
        self.state.pause_started_at = None;
        self.state.remaining_seconds = self.state.duration_seconds;
        self.completed = false;
    }

    fn finish(&mut self, finished_at: Millis) -> Option<TimerEvent> {
        if self.completed {
            return None;
        }
        self.stop();
        self.completed = true;
        self.state.remaining_seconds = 0;
        Some(TimerEvent::Completed { finished_at })
    }
}

/// Render whole seconds as `MM:SS`.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
