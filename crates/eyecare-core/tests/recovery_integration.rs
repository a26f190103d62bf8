//! Integration tests for session recovery.
//!
//! Each test runs one controller, lets it save, drops it, moves the clock
//! and restores a second controller from the same store, the way a restart
//! or a wake from sleep does.

use std::cell::RefCell;
use std::rc::Rc;

use eyecare_core::storage::{PersistentStore, SESSION_KEY};
use eyecare_core::{
    ManualClock, MemoryStore, Millis, Notifier, NotifyError, Phase, PhaseController, PhaseState,
    Settings,
};

const T0: Millis = 1_704_877_200_000;

#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Rc<RefCell<Vec<Phase>>>,
}

impl Notifier for RecordingNotifier {
    fn send_reminder(&mut self, phase: Phase, _settings: &Settings) -> Result<(), NotifyError> {
        self.sent.borrow_mut().push(phase);
        Ok(())
    }
}

fn controller(store: &MemoryStore, clock: &ManualClock) -> PhaseController {
    PhaseController::new(Box::new(store.clone()), Box::new(clock.clone()))
}

/// Run work for `secs` seconds, then save and drop the controller.
fn work_then_quit(store: &MemoryStore, clock: &ManualClock, secs: i64) {
    let mut ctl = controller(store, clock);
    ctl.start();
    clock.advance_secs(secs);
    ctl.poll();
    ctl.flush();
}

#[test]
fn test_running_work_resumes_with_gap_counted() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(T0);
    work_then_quit(&store, &clock, 700);

    clock.advance_secs(250);
    let mut ctl = controller(&store, &clock);
    assert_eq!(ctl.restore(), PhaseState::WorkRunning);
    assert_eq!(ctl.status().remaining_secs, 250);

    clock.advance_secs(1);
    ctl.poll();
    assert_eq!(ctl.status().remaining_secs, 249);
}

#[test]
fn test_snapshot_at_threshold_is_discarded() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(T0);
    work_then_quit(&store, &clock, 700);

    clock.advance_secs(300);
    let mut ctl = controller(&store, &clock);
    assert_eq!(ctl.restore(), PhaseState::Idle);
    assert_eq!(ctl.status().remaining_secs, 1200);
    assert!(store.get(SESSION_KEY).unwrap().is_none());
}

#[test]
fn test_break_finished_while_closed_counts_once() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(T0);
    {
        let mut ctl = controller(&store, &clock);
        ctl.start();
        clock.advance_secs(1200);
        assert_eq!(ctl.poll(), PhaseState::BreakRunning);
        clock.advance_secs(5);
        ctl.poll();
        ctl.flush();
    }

    clock.advance_secs(60);
    let mut ctl = controller(&store, &clock);
    assert_eq!(ctl.restore(), PhaseState::Idle);
    assert_eq!(ctl.stats().today_count, 1);
    assert_eq!(ctl.stats().total_count, 1);
    assert!(store.get(SESSION_KEY).unwrap().is_none());

    // A second restart finds nothing left to count.
    let mut again = controller(&store, &clock);
    assert_eq!(again.restore(), PhaseState::Idle);
    assert_eq!(again.stats().total_count, 1);
}

#[test]
fn test_work_and_break_both_elapsed_cascade_to_idle() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(T0);
    work_then_quit(&store, &clock, 1100);

    clock.advance_secs(200);
    let notifier = RecordingNotifier::default();
    let mut ctl = controller(&store, &clock).with_notifier(Box::new(notifier.clone()));
    assert_eq!(ctl.restore(), PhaseState::Idle);
    assert_eq!(ctl.stats().total_count, 1);
    assert_eq!(ctl.stats().total_break_time, 20);
    assert_eq!(*notifier.sent.borrow(), vec![Phase::Work, Phase::Break]);
}

#[test]
fn test_break_placed_at_work_deadline() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(T0);
    work_then_quit(&store, &clock, 1190);

    // Work ran out 5 seconds ago, so 5 seconds of the break are gone too.
    clock.advance_secs(15);
    let mut ctl = controller(&store, &clock);
    assert_eq!(ctl.restore(), PhaseState::BreakRunning);
    let status = ctl.status();
    assert_eq!(status.phase, Phase::Break);
    assert_eq!(status.remaining_secs, 15);
    assert_eq!(ctl.stats().total_count, 0);
}

#[test]
fn test_paused_work_restores_frozen() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(T0);
    {
        let mut ctl = controller(&store, &clock);
        ctl.start();
        clock.advance_secs(100);
        ctl.poll();
        ctl.pause();
    }

    clock.advance_secs(200);
    let mut ctl = controller(&store, &clock);
    assert_eq!(ctl.restore(), PhaseState::WorkPaused);
    assert_eq!(ctl.status().remaining_secs, 1100);

    ctl.resume();
    clock.advance_secs(1);
    ctl.poll();
    assert_eq!(ctl.status().remaining_secs, 1099);
}

#[test]
fn test_clock_moved_backwards_keeps_full_countdown() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(T0);
    {
        let mut ctl = controller(&store, &clock);
        ctl.start();
        clock.advance_secs(10);
        ctl.flush();
    }

    clock.set(T0 - 60_000);
    let mut ctl = controller(&store, &clock);
    assert_eq!(ctl.restore(), PhaseState::WorkRunning);
    assert_eq!(ctl.status().remaining_secs, 1200);
}

#[test]
fn test_legacy_record_is_read() {
    let store = MemoryStore::new();
    store
        .set(
            SESSION_KEY,
            r#"{"mode":"work","isRunning":true,"isPaused":false,"workRemaining":900,"breakRemaining":20,"workStartTime":null,"breakStartTime":null,"workPausedTime":0,"breakPausedTime":0}"#,
        )
        .unwrap();
    let clock = ManualClock::new(T0);
    let mut ctl = controller(&store, &clock);
    assert_eq!(ctl.restore(), PhaseState::WorkRunning);
    assert_eq!(ctl.status().remaining_secs, 900);

    // Saved back in the current format.
    ctl.flush();
    let raw = store.get(SESSION_KEY).unwrap().unwrap();
    assert!(raw.contains("savedAt"));
}

#[test]
fn test_malformed_record_starts_fresh() {
    let store = MemoryStore::new();
    store.set(SESSION_KEY, "{\"mode\": 7}").unwrap();
    let clock = ManualClock::new(T0);
    let mut ctl = controller(&store, &clock);
    assert_eq!(ctl.restore(), PhaseState::Idle);
    assert!(store.get(SESSION_KEY).unwrap().is_none());
}

#[test]
fn test_idle_snapshot_restores_idle() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(T0);
    {
        let mut ctl = controller(&store, &clock);
        ctl.flush();
    }
    let mut ctl = controller(&store, &clock);
    assert_eq!(ctl.restore(), PhaseState::Idle);
    assert_eq!(ctl.status().remaining_secs, 1200);
}

#[test]
fn test_snapshot_durations_survive_settings_change() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(T0);
    work_then_quit(&store, &clock, 60);

    // Settings written behind the session's back, e.g. by another process.
    Settings {
        work_duration_seconds: 600,
        ..Settings::default()
    }
    .save(&store)
    .unwrap();

    let mut ctl = controller(&store, &clock);
    assert_eq!(ctl.restore(), PhaseState::WorkRunning);
    assert_eq!(ctl.status().total_secs, 1200);
    assert_eq!(ctl.status().remaining_secs, 1140);

    ctl.reset();
    assert_eq!(ctl.status().total_secs, 600);
}

#[test]
fn test_pause_after_deadline_starts_the_break() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(T0);
    {
        let mut ctl = controller(&store, &clock);
        ctl.start();
        // Work ran out 50ms ago but nothing has polled since.
        clock.advance_ms(1_200_050);
        assert_eq!(ctl.pause(), PhaseState::BreakRunning);
        ctl.flush();
    }

    clock.advance_secs(30);
    let mut ctl = controller(&store, &clock);
    assert_eq!(ctl.restore(), PhaseState::Idle);
    assert_eq!(ctl.stats().total_count, 1);
}

#[test]
fn test_work_paused_past_deadline_is_not_stuck_at_zero() {
    let store = MemoryStore::new();
    let paused_at = T0 + 1_200_050;
    let raw = format!(
        r#"{{"mode":"work","running":true,"paused":true,"savedAt":{paused_at},
            "work":{{"durationSeconds":1200,"remainingSeconds":0,"running":true,"paused":true,
                     "startTimestamp":{T0},"accumulatedPauseMs":0,"pauseStartedAt":{paused_at}}},
            "break":{{"durationSeconds":20}}}}"#
    );
    store.set(SESSION_KEY, &raw).unwrap();

    // Finishes at its deadline, so the break is 10 seconds in.
    let clock = ManualClock::new(paused_at + 10_000);
    let mut ctl = controller(&store, &clock);
    assert_eq!(ctl.restore(), PhaseState::BreakRunning);
    assert_eq!(ctl.status().remaining_secs, 10);
}

#[test]
fn test_old_legacy_record_is_stale() {
    let store = MemoryStore::new();
    let three_days_ago = T0 - 3 * 24 * 3600 * 1000;
    let raw = format!(
        r#"{{"mode":"work","isRunning":true,"isPaused":false,"workRemaining":900,"breakRemaining":20,"workStartTime":{three_days_ago},"workPausedTime":0}}"#
    );
    store.set(SESSION_KEY, &raw).unwrap();

    let clock = ManualClock::new(T0);
    let mut ctl = controller(&store, &clock);
    assert_eq!(ctl.restore(), PhaseState::Idle);
    assert_eq!(ctl.stats().total_count, 0);
    assert!(store.get(SESSION_KEY).unwrap().is_none());
}
