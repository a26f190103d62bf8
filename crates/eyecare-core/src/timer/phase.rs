use std::fmt;

use serde::{Deserialize, Serialize};

/// The two countdown categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Break,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::Break => "Break",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Observable state of the phase controller.
///
/// There is no `BreakPaused`: breaks cannot be paused by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseState {
    Idle,
    WorkRunning,
    WorkPaused,
    BreakRunning,
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PhaseState::Idle => "idle",
            PhaseState::WorkRunning => "work_running",
            PhaseState::WorkPaused => "work_paused",
            PhaseState::BreakRunning => "break_running",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Phase::Break).unwrap(), "\"break\"");
        let parsed: Phase = serde_json::from_str("\"work\"").unwrap();
        assert_eq!(parsed, Phase::Work);
    }

    #[test]
    fn state_display_matches_serde() {
        for state in [
            PhaseState::Idle,
            PhaseState::WorkRunning,
            PhaseState::WorkPaused,
            PhaseState::BreakRunning,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json.trim_matches('"'), state.to_string());
        }
    }
}
