use std::io::{self, Write};

use eyecare_core::{format_clock, Phase, PhaseState, Presenter, Statistics};

const BAR_WIDTH: usize = 24;

/// Redraws a single status line on stdout.
#[derive(Debug, Default)]
pub struct TerminalPresenter {
    state: Option<PhaseState>,
}

impl TerminalPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn label(&self) -> &'static str {
        match self.state {
            Some(PhaseState::WorkRunning) => "working",
            Some(PhaseState::WorkPaused) => "paused",
            Some(PhaseState::BreakRunning) => "look away",
            Some(PhaseState::Idle) | None => "idle",
        }
    }
}

fn bar(remaining: u64, total: u64) -> String {
    let filled = if total == 0 {
        0
    } else {
        let done = total.saturating_sub(remaining);
        (done.saturating_mul(BAR_WIDTH as u64) / total) as usize
    };
    format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

impl Presenter for TerminalPresenter {
    fn on_tick(&mut self, _phase: Phase, remaining_secs: u64, total_secs: u64) {
        let mut out = io::stdout().lock();
        let _ = write!(
            out,
            "\r{:<9} {} [{}]",
            self.label(),
            format_clock(remaining_secs),
            bar(remaining_secs, total_secs)
        );
        let _ = out.flush();
    }

    fn on_phase_change(&mut self, phase: Phase, state: PhaseState) {
        if self.state == Some(state) {
            return;
        }
        self.state = Some(state);
        let hint = match state {
            PhaseState::Idle => "p to start, q to quit",
            PhaseState::WorkRunning => "p to pause, r to reset",
            PhaseState::WorkPaused => "p to resume, r to reset",
            PhaseState::BreakRunning => "look 20 feet away; s to skip",
        };
        println!("\n{phase}: {hint}");
    }

    fn on_complete(&mut self, stats: &Statistics) {
        println!(
            "\ncycle done: {} today, {} total",
            stats.today_count, stats.total_count
        );
    }
}
