//! Reminder dispatch seam.
//!
//! The controller hands a [`Reminder`] to its [`Notifier`] at every phase
//! end. Delivery is fire-and-forget: errors are logged by the controller and
//! never change timer state.

use crate::error::NotifyError;
use crate::settings::Settings;
use crate::timer::Phase;

/// Text of one reminder, chosen by the phase that just ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub phase: Phase,
    pub title: String,
    pub body: String,
    /// Whether the reminder should stay up until acknowledged.
    pub requires_interaction: bool,
}

impl Reminder {
    pub fn for_phase(phase: Phase, settings: &Settings) -> Self {
        match phase {
            Phase::Work => Self {
                phase,
                title: "Time for an eye break".to_string(),
                body: format!(
                    "Look at something 20 feet (6 m) away for {} seconds",
                    settings.break_duration_seconds
                ),
                requires_interaction: true,
            },
            Phase::Break => Self {
                phase,
                title: "Break over".to_string(),
                body: "Back to focused work".to_string(),
                requires_interaction: false,
            },
        }
    }
}

/// Delivers reminders to the user.
pub trait Notifier {
    /// `phase` is the phase that just ended.
    fn send_reminder(&mut self, phase: Phase, settings: &Settings) -> Result<(), NotifyError>;
}

/// Drops every reminder.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn send_reminder(&mut self, _phase: Phase, _settings: &Settings) -> Result<(), NotifyError> {
        Ok(())
    }
}
