//! Completed-cycle statistics.
//!
//! Counters persisted as JSON under the `stats` key. `today_count` rolls
//! over on the first load of a new UTC calendar day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::storage::{PersistentStore, STATS_KEY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default)]
    pub today_count: u64,
    #[serde(default)]
    pub total_count: u64,
    pub last_reset_date: NaiveDate,
    /// Seconds of configured break time across all counted cycles.
    #[serde(default)]
    pub total_break_time: u64,
}

impl Statistics {
    /// Zeroed counters dated `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today_count: 0,
            total_count: 0,
            last_reset_date: today,
            total_break_time: 0,
        }
    }

    /// Zero `today_count` if `today` is a different day than the last reset.
    ///
    /// Returns whether anything changed.
    pub fn roll_over(&mut self, today: NaiveDate) -> bool {
        if self.last_reset_date == today {
            return false;
        }
        debug!(from = %self.last_reset_date, to = %today, "daily count rolled over");
        self.today_count = 0;
        self.last_reset_date = today;
        true
    }

    /// Count one finished cycle that ended on `day`.
    ///
    /// A cycle that ended before the last reset date (a fast-forwarded break
    /// from before midnight) only counts toward the total.
    pub fn record_cycle(&mut self, day: NaiveDate, break_seconds: u64) {
        if day > self.last_reset_date {
            self.roll_over(day);
        }
        if day == self.last_reset_date {
            self.today_count += 1;
        }
        self.total_count += 1;
        self.total_break_time = self.total_break_time.saturating_add(break_seconds);
    }

    pub fn total_break_minutes(&self) -> u64 {
        self.total_break_time / 60
    }

    /// Read from the store and apply the daily rollover, writing it back
    /// when the day changed. Missing or unreadable entries start fresh.
    pub fn load(store: &dyn PersistentStore, today: NaiveDate) -> Self {
        let mut stats = match Self::stored(store) {
            Ok(Some(stats)) => stats,
            Ok(None) => Self::new(today),
            Err(e) => {
                warn!("could not read statistics, starting over: {e}");
                Self::new(today)
            }
        };
        if stats.roll_over(today) {
            if let Err(e) = stats.save(store) {
                warn!("could not persist statistics rollover: {e}");
            }
        }
        stats
    }

    /// The counters as currently stored, without any rollover.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or holds malformed JSON.
    pub fn stored(store: &dyn PersistentStore) -> Result<Option<Self>, StorageError> {
        let Some(raw) = store.get(STATS_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StorageError::QueryFailed(format!("malformed statistics: {e}")))
    }

    pub fn save(&self, store: &dyn PersistentStore) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(self).map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        store.set(STATS_KEY, &json)
    }
}
