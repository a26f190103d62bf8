//! Work/break state machine.
//!
//! [`PhaseController`] owns the two timer engines and every collaborator.
//! The driver calls [`PhaseController::poll`] on its cadence and forwards
//! user commands; everything else (phase switches, reminders, statistics,
//! autosave) happens inside.
//!
//! ```text
//!            start             work completes
//!   Idle ─────────────▶ WorkRunning ─────────────▶ BreakRunning
//!    ▲                   │     ▲                        │
//!    │             pause │     │ resume                 │ break completes
//!    │                   ▼     │                        │ or skip
//!    │                  WorkPaused                      │
//!    └──────────────────────────────────────────────────┘
//!                (reset returns to Idle from anywhere)
//! ```

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{date_of, Clock, Millis};
use crate::error::{CoreError, Result};
use crate::events::TimerEvent;
use crate::notify::{Notifier, SilentNotifier};
use crate::presenter::{NullPresenter, Presenter};
use crate::session::{PhaseSnapshot, SessionStore};
use crate::settings::Settings;
use crate::stats::Statistics;
use crate::storage::{EngineConfig, PersistentStore};
use crate::timer::{format_clock, Phase, PhaseState, TimerEngine};

/// Read-only view of the controller for display and CLI output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub state: PhaseState,
    pub phase: Phase,
    pub remaining_secs: u64,
    pub total_secs: u64,
    /// `MM:SS` rendering of `remaining_secs`.
    pub display: String,
    pub progress: f64,
    pub stats: Statistics,
}

pub struct PhaseController {
    work: TimerEngine,
    rest: TimerEngine,
    mode: Phase,
    settings: Settings,
    stats: Statistics,
    sessions: SessionStore,
    engine_config: EngineConfig,
    last_saved_at: Option<Millis>,
    /// False after a statistics write failed; the store copy is then behind.
    stats_synced: bool,
    store: Box<dyn PersistentStore>,
    clock: Box<dyn Clock>,
    notifier: Box<dyn Notifier>,
    presenter: Box<dyn Presenter>,
}

impl PhaseController {
    /// Build an idle controller, loading settings and statistics from
    /// `store`. Reminders and display hooks default to no-ops.
    pub fn new(store: Box<dyn PersistentStore>, clock: Box<dyn Clock>) -> Self {
        let settings = Settings::load(store.as_ref());
        let stats = Statistics::load(store.as_ref(), clock.today());
        let engine_config = EngineConfig::default();
        Self {
            work: TimerEngine::new(settings.work_duration_seconds),
            rest: TimerEngine::new(settings.break_duration_seconds),
            mode: Phase::Work,
            settings,
            stats,
            sessions: SessionStore::new(engine_config.stale_after_secs),
            engine_config,
            last_saved_at: None,
            stats_synced: true,
            store,
            clock,
            notifier: Box::new(SilentNotifier),
            presenter: Box::new(NullPresenter),
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_presenter(mut self, presenter: Box<dyn Presenter>) -> Self {
        self.presenter = presenter;
        self
    }

    pub fn with_engine_config(mut self, config: EngineConfig) -> Self {
        self.sessions = SessionStore::new(config.stale_after_secs);
        self.engine_config = config;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> PhaseState {
        if self.work.is_running() {
            if self.work.is_paused() {
                PhaseState::WorkPaused
            } else {
                PhaseState::WorkRunning
            }
        } else if self.rest.is_running() {
            PhaseState::BreakRunning
        } else {
            PhaseState::Idle
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn engine(&self, phase: Phase) -> &TimerEngine {
        match phase {
            Phase::Work => &self.work,
            Phase::Break => &self.rest,
        }
    }

    pub fn status(&self) -> Status {
        let engine = self.engine(self.mode);
        let remaining_secs = engine.remaining();
        Status {
            state: self.state(),
            phase: self.mode,
            remaining_secs,
            total_secs: engine.duration(),
            display: format_clock(remaining_secs),
            progress: engine.progress(),
            stats: self.stats.clone(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Pick up a saved session, fast-forwarding through any phase that
    /// ended while nothing was running.
    pub fn restore(&mut self) -> PhaseState {
        let now = self.clock.now_ms();
        let Some(snapshot) = self
            .sessions
            .load(self.store.as_ref(), &self.settings, now)
        else {
            return self.state();
        };
        self.rehydrate(snapshot, now);
        info!(state = %self.state(), "session restored");
        self.poll_at(now);
        self.announce();
        self.state()
    }

    /// Begin a work countdown from Idle, or resume a paused one.
    pub fn start(&mut self) -> PhaseState {
        match self.state() {
            PhaseState::Idle => {
                let now = self.clock.now_ms();
                self.mode = Phase::Work;
                self.work.reset(Some(self.settings.work_duration_seconds));
                self.work.start(now);
                info!(duration_secs = self.work.duration(), "work started");
                self.announce();
                self.save_at(now);
            }
            PhaseState::WorkPaused => return self.resume(),
            state => debug!(%state, "start ignored"),
        }
        self.state()
    }

    pub fn pause(&mut self) -> PhaseState {
        if self.state() != PhaseState::WorkRunning {
            debug!(state = %self.state(), "pause ignored");
            return self.state();
        }
        let now = self.clock.now_ms();
        // A deadline that passed since the last poll wins over the pause.
        self.poll_at(now);
        if self.state() != PhaseState::WorkRunning {
            return self.state();
        }
        self.work.pause(now);
        info!(remaining_secs = self.work.remaining(), "work paused");
        self.announce();
        self.save_at(now);
        self.state()
    }

    pub fn resume(&mut self) -> PhaseState {
        if self.state() != PhaseState::WorkPaused {
            debug!(state = %self.state(), "resume ignored");
            return self.state();
        }
        let now = self.clock.now_ms();
        self.work.resume(now);
        info!(remaining_secs = self.work.remaining(), "work resumed");
        self.announce();
        self.save_at(now);
        self.state()
    }

    /// Start or resume when stopped, pause when counting down work.
    pub fn toggle(&mut self) -> PhaseState {
        match self.state() {
            PhaseState::WorkRunning => self.pause(),
            PhaseState::Idle | PhaseState::WorkPaused => self.start(),
            PhaseState::BreakRunning => {
                debug!("toggle ignored during break");
                self.state()
            }
        }
    }

    /// End the break now. Counts the cycle exactly like a natural finish.
    pub fn skip(&mut self) -> PhaseState {
        let now = self.clock.now_ms();
        self.poll_at(now);
        if self.state() != PhaseState::BreakRunning {
            debug!(state = %self.state(), "skip ignored");
            return self.state();
        }
        if let Some(TimerEvent::Completed { finished_at }) = self.rest.complete(now) {
            info!("break skipped");
            self.on_break_complete(finished_at);
        }
        self.state()
    }

    /// Stop everything, restore configured durations, forget the session.
    pub fn reset(&mut self) -> PhaseState {
        let now = self.clock.now_ms();
        self.poll_at(now);
        self.reset_engines();
        self.clear_session();
        info!("timers reset");
        self.announce();
        self.state()
    }

    /// Replace the settings. Only allowed while Idle.
    ///
    /// # Errors
    ///
    /// Returns `NotIdle` while a countdown is active, or
    /// `InvalidConfiguration` when a duration is out of range.
    pub fn apply_settings(&mut self, settings: Settings) -> Result<()> {
        let state = self.state();
        if state != PhaseState::Idle {
            return Err(CoreError::NotIdle { state });
        }
        settings.validate()?;
        if let Err(e) = settings.save(self.store.as_ref()) {
            warn!("settings kept in memory only: {e}");
        }
        self.settings = settings;
        self.reset_engines();
        info!(
            work_secs = self.settings.work_duration_seconds,
            break_secs = self.settings.break_duration_seconds,
            "settings applied"
        );
        Ok(())
    }

    pub fn reset_stats(&mut self) -> &Statistics {
        self.stats = Statistics::new(self.clock.today());
        self.save_stats();
        info!("statistics reset");
        &self.stats
    }

    /// Advance the active timer to the current instant and autosave.
    pub fn poll(&mut self) -> PhaseState {
        let now = self.clock.now_ms();
        if self.stats.roll_over(date_of(now)) {
            self.save_stats();
        }
        self.poll_at(now);
        self.autosave(now);
        self.state()
    }

    /// Save the session unconditionally. Call before suspending or exiting.
    pub fn flush(&mut self) {
        let now = self.clock.now_ms();
        self.save_at(now);
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Drain engine events as of `now`. A work completion starts the break
    /// at the instant work ran out, so a break that also ended before `now`
    /// completes on the next pass of the loop.
    fn poll_at(&mut self, now: Millis) {
        loop {
            let event = match self.mode {
                Phase::Work => self.work.poll(now),
                Phase::Break => self.rest.poll(now),
            };
            match event {
                None => break,
                Some(TimerEvent::Tick {
                    remaining_secs,
                    total_secs,
                }) => {
                    self.presenter.on_tick(self.mode, remaining_secs, total_secs);
                    break;
                }
                Some(TimerEvent::Completed { finished_at }) => match self.mode {
                    Phase::Work => self.on_work_complete(finished_at),
                    Phase::Break => self.on_break_complete(finished_at),
                },
            }
        }
    }

    fn on_work_complete(&mut self, finished_at: Millis) {
        info!("work complete, break starts");
        self.dispatch_reminder(Phase::Work);
        self.mode = Phase::Break;
        self.rest.reset(Some(self.settings.break_duration_seconds));
        self.rest.start_at(finished_at);
        self.announce();
        self.save_at(finished_at);
    }

    fn on_break_complete(&mut self, finished_at: Millis) {
        self.refresh_stats();
        self.stats
            .record_cycle(date_of(finished_at), self.settings.break_duration_seconds);
        self.save_stats();
        info!(
            today = self.stats.today_count,
            total = self.stats.total_count,
            "cycle complete"
        );
        self.dispatch_reminder(Phase::Break);
        self.reset_engines();
        self.clear_session();
        self.presenter.on_complete(&self.stats);
        self.announce();
    }

    fn rehydrate(&mut self, snapshot: PhaseSnapshot, now: Millis) {
        self.reset_engines();
        if !snapshot.running {
            debug!("saved session was idle");
            return;
        }
        let mode = snapshot.mode;
        let engine = match mode {
            Phase::Work => &mut self.work,
            Phase::Break => &mut self.rest,
        };
        engine.restore(snapshot.timer(mode).clone(), now);
        if !engine.is_running() {
            debug!(%mode, "saved session had no running timer");
            engine.reset(None);
            return;
        }
        match mode {
            Phase::Work if snapshot.paused && !engine.is_paused() => {
                engine.pause(snapshot.saved_at.min(now));
            }
            Phase::Work if !snapshot.paused && engine.is_paused() => {
                engine.resume(now);
            }
            // Breaks cannot be paused.
            Phase::Break if engine.is_paused() => {
                engine.resume(now);
            }
            _ => {}
        }
        // Paused at or after its deadline: let it finish there instead of
        // sitting at zero.
        if engine.is_paused() && engine.state().remaining_at(now) == 0 {
            let paused_at = engine.state().pause_started_at.unwrap_or(now);
            debug!(%mode, "saved session was paused past its deadline");
            engine.resume(paused_at);
        }
        self.mode = mode;
    }

    fn reset_engines(&mut self) {
        self.work.reset(Some(self.settings.work_duration_seconds));
        self.rest.reset(Some(self.settings.break_duration_seconds));
        self.mode = Phase::Work;
        self.last_saved_at = None;
    }

    fn autosave(&mut self, now: Millis) {
        if self.state() == PhaseState::Idle {
            return;
        }
        let due = match self.last_saved_at {
            Some(last) => {
                now.saturating_sub(last)
                    >= i64::try_from(self.engine_config.autosave_interval_ms).unwrap_or(i64::MAX)
            }
            None => true,
        };
        if due {
            self.save_at(now);
        }
    }

    /// Pick up counters another process wrote since they were loaded.
    /// Skipped while the store is behind the in-memory copy.
    fn refresh_stats(&mut self) {
        if !self.stats_synced {
            return;
        }
        match Statistics::stored(self.store.as_ref()) {
            Ok(Some(stored)) => self.stats = stored,
            Ok(None) => {}
            Err(e) => debug!("keeping in-memory statistics: {e}"),
        }
    }

    fn save_stats(&mut self) {
        match self.stats.save(self.store.as_ref()) {
            Ok(()) => self.stats_synced = true,
            Err(e) => {
                warn!("statistics kept in memory only: {e}");
                self.stats_synced = false;
            }
        }
    }

    fn save_at(&mut self, at: Millis) {
        let state = self.state();
        let snapshot = PhaseSnapshot {
            mode: self.mode,
            running: state != PhaseState::Idle,
            paused: state == PhaseState::WorkPaused,
            work: self.work.state().clone(),
            break_timer: self.rest.state().clone(),
            saved_at: at,
        };
        if let Err(e) = self.sessions.save(self.store.as_ref(), &snapshot) {
            warn!("session kept in memory only: {e}");
        }
        self.last_saved_at = Some(at);
    }

    fn clear_session(&mut self) {
        if let Err(e) = self.sessions.clear(self.store.as_ref()) {
            warn!("could not clear saved session: {e}");
        }
        self.last_saved_at = None;
    }

    fn dispatch_reminder(&mut self, phase: Phase) {
        if let Err(e) = self.notifier.send_reminder(phase, &self.settings) {
            warn!(%phase, "reminder not delivered: {e}");
        }
    }

    fn announce(&mut self) {
        let state = self.state();
        let engine = self.engine(self.mode);
        let (remaining, total) = (engine.remaining(), engine.duration());
        self.presenter.on_phase_change(self.mode, state);
        self.presenter.on_tick(self.mode, remaining, total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;

    const T0: Millis = 1_704_877_200_000;

    fn controller() -> (PhaseController, ManualClock, MemoryStore) {
        let clock = ManualClock::new(T0);
        let store = MemoryStore::new();
        let ctl = PhaseController::new(Box::new(store.clone()), Box::new(clock.clone()));
        (ctl, clock, store)
    }

    #[test]
    fn starts_idle_with_full_durations() {
        let (ctl, _, _) = controller();
        let status = ctl.status();
        assert_eq!(status.state, PhaseState::Idle);
        assert_eq!(status.phase, Phase::Work);
        assert_eq!(status.remaining_secs, 1200);
        assert_eq!(status.display, "20:00");
    }

    #[test]
    fn work_runs_into_break_then_idle() {
        let (mut ctl, clock, _) = controller();
        assert_eq!(ctl.start(), PhaseState::WorkRunning);

        clock.advance_secs(1200);
        assert_eq!(ctl.poll(), PhaseState::BreakRunning);
        assert_eq!(ctl.status().remaining_secs, 20);

        clock.advance_secs(20);
        assert_eq!(ctl.poll(), PhaseState::Idle);
        assert_eq!(ctl.stats().today_count, 1);
        assert_eq!(ctl.stats().total_break_time, 20);
        assert_eq!(ctl.status().remaining_secs, 1200);
    }

    #[test]
    fn invalid_commands_are_ignored() {
        let (mut ctl, _, _) = controller();
        assert_eq!(ctl.pause(), PhaseState::Idle);
        assert_eq!(ctl.resume(), PhaseState::Idle);
        assert_eq!(ctl.skip(), PhaseState::Idle);

        ctl.start();
        assert_eq!(ctl.skip(), PhaseState::WorkRunning);
        assert_eq!(ctl.start(), PhaseState::WorkRunning);
    }

    #[test]
    fn toggle_cycles_pause_and_resume() {
        let (mut ctl, clock, _) = controller();
        assert_eq!(ctl.toggle(), PhaseState::WorkRunning);
        clock.advance_secs(100);
        ctl.poll();
        assert_eq!(ctl.toggle(), PhaseState::WorkPaused);
        clock.advance_secs(600);
        ctl.poll();
        assert_eq!(ctl.status().remaining_secs, 1100);
        assert_eq!(ctl.toggle(), PhaseState::WorkRunning);
        clock.advance_secs(1);
        ctl.poll();
        assert_eq!(ctl.status().remaining_secs, 1099);
    }

    #[test]
    fn settings_change_requires_idle() {
        let (mut ctl, _, _) = controller();
        ctl.start();
        let shorter = Settings {
            work_duration_seconds: 600,
            ..Settings::default()
        };
        assert!(matches!(
            ctl.apply_settings(shorter.clone()),
            Err(CoreError::NotIdle {
                state: PhaseState::WorkRunning
            })
        ));
        ctl.reset();
        ctl.apply_settings(shorter).unwrap();
        assert_eq!(ctl.status().remaining_secs, 600);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let (mut ctl, _, _) = controller();
        let bad = Settings {
            break_duration_seconds: 1,
            ..Settings::default()
        };
        assert!(matches!(
            ctl.apply_settings(bad),
            Err(CoreError::InvalidConfiguration { .. })
        ));
        assert_eq!(ctl.settings(), &Settings::default());
    }

    #[test]
    fn autosave_respects_interval() {
        let (mut ctl, clock, store) = controller();
        ctl.start();
        let first = store.get(crate::storage::SESSION_KEY).unwrap().unwrap();

        clock.advance_ms(500);
        ctl.poll();
        assert_eq!(store.get(crate::storage::SESSION_KEY).unwrap().unwrap(), first);

        clock.advance_ms(500);
        ctl.poll();
        assert_ne!(store.get(crate::storage::SESSION_KEY).unwrap().unwrap(), first);
    }

    #[test]
    fn reset_clears_saved_session() {
        let (mut ctl, clock, store) = controller();
        ctl.start();
        clock.advance_secs(5);
        ctl.poll();
        assert_eq!(ctl.reset(), PhaseState::Idle);
        assert!(store.get(crate::storage::SESSION_KEY).unwrap().is_none());
    }
}
