use serde::{Deserialize, Serialize};

use crate::clock::Millis;
use crate::error::{CoreError, Result};
use crate::settings::Settings;
use crate::timer::{Phase, TimerState};

/// Both timers plus the active phase, as persisted under the `session` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSnapshot {
    pub mode: Phase,
    pub running: bool,
    pub paused: bool,
    pub work: TimerState,
    #[serde(rename = "break")]
    pub break_timer: TimerState,
    pub saved_at: Millis,
}

impl PhaseSnapshot {
    /// Milliseconds since the snapshot was written. A `saved_at` in the
    /// future counts as zero.
    pub fn age_ms(&self, now: Millis) -> u64 {
        u64::try_from(now.saturating_sub(self.saved_at)).unwrap_or(0)
    }

    pub fn timer(&self, phase: Phase) -> &TimerState {
        match phase {
            Phase::Work => &self.work,
            Phase::Break => &self.break_timer,
        }
    }

    /// Parse a stored record, accepting the older remaining-seconds layout.
    ///
    /// Legacy records carry no save time. It is recovered from the active
    /// timer's start, pause total and remaining seconds when the record has
    /// a start timestamp, and taken as `now` otherwise.
    pub fn from_json(raw: &str, settings: &Settings, now: Millis) -> Result<Self> {
        match serde_json::from_str::<PhaseSnapshot>(raw) {
            Ok(snapshot) => Ok(snapshot),
            Err(current_err) => match serde_json::from_str::<LegacySession>(raw) {
                Ok(legacy) => Ok(legacy.into_snapshot(settings, now)),
                Err(_) => Err(CoreError::MalformedSnapshot(current_err.to_string())),
            },
        }
    }
}

/// The remaining-seconds record written by the browser version.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacySession {
    mode: Phase,
    is_running: bool,
    #[serde(default)]
    is_paused: bool,
    work_remaining: u64,
    break_remaining: u64,
    #[serde(default)]
    work_start_time: Option<Millis>,
    #[serde(default)]
    break_start_time: Option<Millis>,
    /// Accumulated pause total, not a pause instant.
    #[serde(default)]
    work_paused_time: Option<u64>,
    #[serde(default)]
    break_paused_time: Option<u64>,
}

impl LegacySession {
    fn into_snapshot(self, settings: &Settings, now: Millis) -> PhaseSnapshot {
        let running = self.is_running;
        let paused = running && self.is_paused;
        let work_record = LegacyTimer {
            duration: settings.work_duration_seconds,
            remaining: self.work_remaining,
            start: self.work_start_time,
            paused_total: self.work_paused_time,
        };
        let break_record = LegacyTimer {
            duration: settings.break_duration_seconds,
            remaining: self.break_remaining,
            start: self.break_start_time,
            paused_total: self.break_paused_time,
        };
        let written_at = match self.mode {
            Phase::Work => work_record.written_at(),
            Phase::Break => break_record.written_at(),
        };
        let (work, break_timer) = match (running, self.mode) {
            (false, _) => (work_record.idle(), break_record.idle()),
            (true, Phase::Work) => (work_record.active(paused, now), break_record.idle()),
            (true, Phase::Break) => (work_record.idle(), break_record.active(paused, now)),
        };
        PhaseSnapshot {
            mode: self.mode,
            running,
            paused,
            work,
            break_timer,
            saved_at: written_at.unwrap_or(now),
        }
    }
}

struct LegacyTimer {
    duration: u64,
    remaining: u64,
    start: Option<Millis>,
    paused_total: Option<u64>,
}

impl LegacyTimer {
    fn idle(&self) -> TimerState {
        TimerState::idle(self.duration)
    }

    /// Instant the remaining value was last recomputed: start, plus time
    /// spent paused, plus the seconds already counted down.
    fn written_at(&self) -> Option<Millis> {
        let start = self.start?;
        let paused = i64::try_from(self.paused_total.unwrap_or(0)).unwrap_or(i64::MAX);
        Some(start.saturating_add(paused).saturating_add(self.elapsed_ms()))
    }

    fn elapsed_ms(&self) -> i64 {
        let remaining = self.remaining.min(self.duration);
        i64::try_from(self.duration - remaining)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000)
    }

    fn active(&self, paused: bool, now: Millis) -> TimerState {
        let remaining = self.remaining.min(self.duration);
        let synthesized_start = now.saturating_sub(self.elapsed_ms());

        let mut state = TimerState::idle(self.duration);
        state.running = true;
        state.remaining_seconds = remaining;
        if paused {
            // Only the frozen remaining value is trustworthy for a paused record.
            state.paused = true;
            state.start_timestamp = Some(synthesized_start);
            state.pause_started_at = Some(now);
        } else if let Some(start) = self.start {
            state.start_timestamp = Some(start);
            state.accumulated_pause_ms = self.paused_total.unwrap_or(0);
        } else {
            state.start_timestamp = Some(synthesized_start);
        }
        state
    }
}
