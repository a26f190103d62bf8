//! Time sources.
//!
//! Every timestamp in the crate is an `i64` count of milliseconds since the
//! Unix epoch. The timer engine never reads the clock itself; callers pass
//! `now` in, and the phase controller reads it through a [`Clock`] so that
//! simulations and tests can move time by hand.
//!
//! The engine assumes the clock does not run backwards. When it does, the
//! computed elapsed time is clamped to zero instead of producing a countdown
//! longer than its configured duration.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

/// Milliseconds since the Unix epoch.
pub type Millis = i64;

/// A source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> Millis;

    /// Calendar date (UTC) of the current instant.
    fn today(&self) -> NaiveDate {
        date_of(self.now_ms())
    }
}

/// Reads the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        Utc::now().timestamp_millis()
    }
}

/// A hand-driven clock. Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_ms: Millis) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: Millis) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance_ms(secs.saturating_mul(1000));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}

/// Calendar date (UTC) of an epoch-millisecond instant.
pub fn date_of(ms: Millis) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_default()
        .date_naive()
}
