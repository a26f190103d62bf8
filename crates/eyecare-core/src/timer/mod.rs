mod engine;
mod phase;

pub use engine::{format_clock, TimerEngine, TimerState};
pub use phase::{Phase, PhaseState};
