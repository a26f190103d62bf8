use std::io::Write;

use eyecare_core::{Notifier, NotifyError, Phase, Reminder, Settings};
use notify_rust::{Notification, Timeout};
use tracing::warn;

/// Desktop notification plus terminal bell, each gated by its setting.
pub struct DesktopNotifier {
    bell: Box<dyn Write>,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self::with_bell(Box::new(std::io::stderr()))
    }

    fn with_bell(bell: Box<dyn Write>) -> Self {
        Self { bell }
    }

    fn ring(&mut self) {
        let rung = self.bell.write_all(b"\x07").and_then(|()| self.bell.flush());
        if let Err(e) = rung {
            warn!("terminal bell failed: {e}");
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for DesktopNotifier {
    fn send_reminder(&mut self, phase: Phase, settings: &Settings) -> Result<(), NotifyError> {
        if settings.sound_enabled {
            self.ring();
        }
        if !settings.notification_enabled {
            return Ok(());
        }
        let reminder = Reminder::for_phase(phase, settings);
        let timeout = if reminder.requires_interaction {
            Timeout::Never
        } else {
            Timeout::Default
        };
        Notification::new()
            .summary(&reminder.title)
            .body(&reminder.body)
            .appname("eyecare")
            .timeout(timeout)
            .show()
            .map(|_| ())
            .map_err(|e| NotifyError(e.to_string()))
    }
}
