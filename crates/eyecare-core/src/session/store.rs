use tracing::{debug, info, warn};

use super::PhaseSnapshot;
use crate::clock::Millis;
use crate::error::StorageError;
use crate::settings::Settings;
use crate::storage::{PersistentStore, SESSION_KEY};

/// Reads and writes the single persisted session slot.
#[derive(Debug, Clone, Copy)]
pub struct SessionStore {
    stale_after_ms: u64,
}

impl SessionStore {
    pub fn new(stale_after_secs: u64) -> Self {
        Self {
            stale_after_ms: stale_after_secs.saturating_mul(1000),
        }
    }

    /// Overwrite the slot with `snapshot`.
    pub fn save(
        &self,
        kv: &dyn PersistentStore,
        snapshot: &PhaseSnapshot,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        kv.set(SESSION_KEY, &json)
    }

    /// Read the slot as of `now`.
    ///
    /// Returns `None` when nothing is stored, the record cannot be parsed,
    /// or it is at least the staleness threshold old. Malformed and stale
    /// records are deleted.
    pub fn load(
        &self,
        kv: &dyn PersistentStore,
        settings: &Settings,
        now: Millis,
    ) -> Option<PhaseSnapshot> {
        let raw = match kv.get(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no saved session");
                return None;
            }
            Err(e) => {
                warn!("could not read saved session: {e}");
                return None;
            }
        };

        let snapshot = match PhaseSnapshot::from_json(&raw, settings, now) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("discarding saved session: {e}");
                self.discard(kv);
                return None;
            }
        };

        let age_ms = snapshot.age_ms(now);
        if age_ms >= self.stale_after_ms {
            info!(age_secs = age_ms / 1000, "saved session is stale, starting fresh");
            self.discard(kv);
            return None;
        }
        debug!(age_ms, mode = %snapshot.mode, "loaded saved session");
        Some(snapshot)
    }

    pub fn clear(&self, kv: &dyn PersistentStore) -> Result<(), StorageError> {
        kv.remove(SESSION_KEY)
    }

    fn discard(&self, kv: &dyn PersistentStore) {
        if let Err(e) = self.clear(kv) {
            warn!("could not delete saved session: {e}");
        }
    }
}
