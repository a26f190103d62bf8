//! # Eyecare Core Library
//!
//! Core logic for a 20-20-20 eye care reminder: every twenty minutes of
//! work, look twenty feet away for twenty seconds. The CLI binary is a thin
//! driver over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a wall-clock countdown that recomputes remaining time
//!   from timestamps on every `poll()`, so late polls never drift
//! - **Phase Controller**: the work/break state machine that owns two
//!   engines, dispatches reminders and counts completed cycles
//! - **Session**: snapshot persistence with a staleness window and
//!   fast-forward through phases that ended while nothing was running
//! - **Storage**: SQLite or in-memory key-value store, plus a TOML runtime
//!   configuration file
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: drift-corrected countdown
//! - [`PhaseController`]: work/break orchestration
//! - [`SessionStore`]: snapshot save/load
//! - [`PersistentStore`]: key-value persistence seam

pub mod clock;
pub mod controller;
pub mod error;
pub mod events;
pub mod notify;
pub mod presenter;
pub mod session;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, Millis, SystemClock};
pub use controller::{PhaseController, Status};
pub use error::{ConfigError, CoreError, NotifyError, StorageError};
pub use events::TimerEvent;
pub use notify::{Notifier, Reminder, SilentNotifier};
pub use presenter::{NullPresenter, Presenter};
pub use session::{PhaseSnapshot, SessionStore};
pub use settings::Settings;
pub use stats::Statistics;
pub use storage::{Config, Database, EngineConfig, MemoryStore, PersistentStore};
pub use timer::{format_clock, Phase, PhaseState, TimerEngine, TimerState};
