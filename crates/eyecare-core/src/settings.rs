//! User settings.
//!
//! Persisted as JSON under the `settings` key. Durations are validated here,
//! at the boundary; the timers downstream assume they are in range.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, CoreError, Result, StorageError};
use crate::storage::{PersistentStore, SETTINGS_KEY};

pub const WORK_DURATION_RANGE: RangeInclusive<u64> = 60..=3600;
pub const BREAK_DURATION_RANGE: RangeInclusive<u64> = 5..=120;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_work_duration", alias = "workDuration")]
    pub work_duration_seconds: u64,
    #[serde(default = "default_break_duration", alias = "breakDuration")]
    pub break_duration_seconds: u64,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub notification_enabled: bool,
}

fn default_work_duration() -> u64 {
    20 * 60
}
fn default_break_duration() -> u64 {
    20
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration_seconds: default_work_duration(),
            break_duration_seconds: default_break_duration(),
            sound_enabled: true,
            notification_enabled: true,
        }
    }
}

impl Settings {
    /// Check both durations against their accepted ranges.
    pub fn validate(&self) -> Result<()> {
        check_range(
            "workDurationSeconds",
            self.work_duration_seconds,
            &WORK_DURATION_RANGE,
        )?;
        check_range(
            "breakDurationSeconds",
            self.break_duration_seconds,
            &BREAK_DURATION_RANGE,
        )
    }

    /// Read from the store, falling back to defaults when the entry is
    /// missing, unreadable or out of range.
    pub fn load(store: &dyn PersistentStore) -> Self {
        let raw = match store.get(SETTINGS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(e) => {
                warn!("could not read settings, using defaults: {e}");
                return Self::default();
            }
        };
        match serde_json::from_str::<Settings>(&raw) {
            Ok(settings) => match settings.validate() {
                Ok(()) => settings,
                Err(e) => {
                    warn!("stored settings rejected, using defaults: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                warn!("stored settings are malformed, using defaults: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &dyn PersistentStore) -> std::result::Result<(), StorageError> {
        let json = serde_json::to_string(self)
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        store.set(SETTINGS_KEY, &json)
    }

    /// Get a setting as a string by its camelCase key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = json.get(key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Return a copy with one setting changed, validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value does not parse as
    /// the key's type, or the result is out of range.
    pub fn with_value(&self, key: &str, value: &str) -> Result<Self> {
        let mut json = serde_json::to_value(self)?;
        let obj = json
            .as_object_mut()
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let existing = obj
            .get(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => value
                .parse::<bool>()
                .map(serde_json::Value::Bool)
                .map_err(|_| ConfigError::ParseFailed(format!("'{value}' is not a bool")))?,
            serde_json::Value::Number(_) => value
                .parse::<u64>()
                .map(|n| serde_json::Value::Number(n.into()))
                .map_err(|_| {
                    ConfigError::ParseFailed(format!("'{value}' is not a whole number"))
                })?,
            _ => serde_json::Value::String(value.into()),
        };
        obj.insert(key.to_string(), new_value);

        let updated: Settings = serde_json::from_value(json)?;
        updated.validate()?;
        Ok(updated)
    }
}

fn check_range(key: &str, value: u64, range: &RangeInclusive<u64>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::InvalidConfiguration {
            key: key.to_string(),
            message: format!(
                "{value} is outside {}..={} seconds",
                range.start(),
                range.end()
            ),
        })
    }
}
