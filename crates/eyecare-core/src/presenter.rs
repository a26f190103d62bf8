use crate::stats::Statistics;
use crate::timer::{Phase, PhaseState};

/// One-way display hooks called by the phase controller.
///
/// The controller never waits on a presenter and ignores what it does;
/// every hook defaults to a no-op.
pub trait Presenter {
    /// The active timer's displayed whole-second value changed.
    fn on_tick(&mut self, _phase: Phase, _remaining_secs: u64, _total_secs: u64) {}

    /// The controller moved to a new state.
    fn on_phase_change(&mut self, _phase: Phase, _state: PhaseState) {}

    /// A work/break cycle was counted.
    fn on_complete(&mut self, _stats: &Statistics) {}
}

/// Presenter for headless use.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {}
