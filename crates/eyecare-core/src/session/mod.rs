//! Session persistence.
//!
//! A single snapshot of both timers and the active phase, written while a
//! cycle is in progress and read back on startup. Loading applies the
//! staleness rule; fast-forwarding through phases that ended in the gap is
//! the controller's job.

mod snapshot;
mod store;

pub use snapshot::PhaseSnapshot;
pub use store::SessionStore;
