//! Foreground reminder loop.
//!
//! One `select!` over the poll interval, stdin command lines and shutdown
//! signals, on a single-threaded runtime. The controller is only touched
//! from this loop, and the loop owns the data directory until it exits.

use std::time::Duration;

use eyecare_core::{PhaseController, PhaseState};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::context::AppContext;
use crate::notifier::DesktopNotifier;
use crate::presenter::TerminalPresenter;

pub fn run(ctx: &AppContext, no_autostart: bool) -> Result<(), Box<dyn std::error::Error>> {
    let owner = ctx.claim()?;
    info!(lock = %owner.path().display(), "owning data directory");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let mut controller = ctx
        .controller()
        .with_notifier(Box::new(DesktopNotifier::new()))
        .with_presenter(Box::new(TerminalPresenter::new()));
    let poll_every = ctx.config.engine.poll_interval();
    runtime.block_on(drive(&mut controller, poll_every, no_autostart));
    // A pending stdin read would otherwise hold up shutdown.
    runtime.shutdown_background();
    drop(owner);
    Ok(())
}

async fn drive(controller: &mut PhaseController, poll_every: Duration, no_autostart: bool) {
    if controller.restore() == PhaseState::Idle && !no_autostart {
        controller.start();
    }

    let mut ticker = tokio::time::interval(poll_every);
    // After a suspend, poll once rather than replaying every missed tick.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                controller.poll();
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if !handle_line(controller, line.trim()) {
                        break;
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!("stdin closed: {e}");
                    stdin_open = false;
                }
            },
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    controller.flush();
    println!();
}

/// Apply one interactive command. Returns `false` to quit.
fn handle_line(controller: &mut PhaseController, line: &str) -> bool {
    match line {
        "p" => {
            controller.toggle();
        }
        "s" => {
            controller.skip();
        }
        "r" => {
            controller.reset();
        }
        "q" => return false,
        "" => {}
        other => eprintln!("unknown command '{other}' (p pause/resume, s skip, r reset, q quit)"),
    }
    true
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyecare_core::{ManualClock, MemoryStore};

    fn controller() -> PhaseController {
        PhaseController::new(
            Box::new(MemoryStore::new()),
            Box::new(ManualClock::new(1_704_877_200_000)),
        )
    }

    #[test]
    fn stdin_commands_drive_the_controller() {
        let mut ctl = controller();
        assert!(handle_line(&mut ctl, "p"));
        assert_eq!(ctl.state(), PhaseState::WorkRunning);
        assert!(handle_line(&mut ctl, "p"));
        assert_eq!(ctl.state(), PhaseState::WorkPaused);
        assert!(handle_line(&mut ctl, "r"));
        assert_eq!(ctl.state(), PhaseState::Idle);
        assert!(handle_line(&mut ctl, "bogus"));
        assert!(!handle_line(&mut ctl, "q"));
    }
}
