use clap::Subcommand;
use eyecare_core::{PhaseController, PhaseState};

use crate::context::AppContext;
use crate::notifier::DesktopNotifier;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start work from idle, or resume a paused work timer
    Start,
    /// Pause the running work timer
    Pause,
    /// Resume the paused work timer
    Resume,
    /// Pause when running, start or resume otherwise
    Toggle,
    /// End the current break now (counts the cycle)
    Skip,
    /// Stop both timers and forget the saved session
    Reset,
    /// Print current timer state as JSON
    Status,
}

impl TimerAction {
    fn is_query(&self) -> bool {
        matches!(self, TimerAction::Status)
    }
}

fn apply(controller: &mut PhaseController, action: TimerAction) {
    match action {
        TimerAction::Start => {
            controller.start();
        }
        TimerAction::Pause => {
            controller.pause();
        }
        TimerAction::Resume => {
            controller.resume();
        }
        TimerAction::Toggle => {
            controller.toggle();
        }
        TimerAction::Skip => {
            controller.skip();
        }
        TimerAction::Reset => {
            controller.reset();
        }
        TimerAction::Status => {}
    }
}

/// Every invocation restores the saved session (fast-forwarding through
/// anything that finished in between), applies one command and saves.
///
/// While another process owns the data directory only `status` is served,
/// from a read-only view of what it last saved.
pub fn run(ctx: &AppContext, action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let Some(_owner) = ctx.try_claim()? else {
        if !action.is_query() {
            return Err(ctx.busy());
        }
        let mut view = ctx.observer();
        view.restore();
        view.poll();
        println!("{}", serde_json::to_string_pretty(&view.status())?);
        return Ok(());
    };

    let mut controller = ctx
        .controller()
        .with_notifier(Box::new(DesktopNotifier::new()));
    controller.restore();
    controller.poll();
    apply(&mut controller, action);
    if controller.state() != PhaseState::Idle {
        controller.flush();
    }
    println!("{}", serde_json::to_string_pretty(&controller.status())?);
    Ok(())
}
