use std::path::PathBuf;

use eyecare_core::storage::{
    self, Config, Database, MemoryStore, PersistentStore, SESSION_KEY, SETTINGS_KEY, STATS_KEY,
};
use eyecare_core::{ConfigError, PhaseController, SystemClock};
use tracing::warn;

use crate::lock::OwnerLock;

/// What every command needs: where state lives and how the engine is tuned.
pub struct AppContext {
    pub data_dir: PathBuf,
    pub config: Config,
    config_error: Option<ConfigError>,
}

impl AppContext {
    /// Resolve the data directory and read `config.toml`.
    ///
    /// A broken config file is not fatal; defaults are used and the problem
    /// is reported once logging is up.
    pub fn load(data_dir: Option<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let data_dir = match data_dir {
            Some(dir) => {
                std::fs::create_dir_all(&dir)?;
                dir
            }
            None => storage::data_dir()?,
        };
        let (config, config_error) = match Config::load_from(&data_dir) {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        };
        Ok(Self {
            data_dir,
            config,
            config_error,
        })
    }

    pub fn report_config_fallback(&self) {
        if let Some(e) = &self.config_error {
            warn!("using default configuration: {e}");
        }
    }

    /// Open the database, degrading to an in-memory store when it is
    /// unavailable.
    pub fn open_store(&self) -> Box<dyn PersistentStore> {
        match Database::open_in(&self.data_dir) {
            Ok(db) => Box::new(db),
            Err(e) => {
                warn!("state will not survive this run: {e}");
                Box::new(MemoryStore::new())
            }
        }
    }

    /// Become the owner of the data directory, or `None` when another
    /// process already is.
    pub fn try_claim(&self) -> std::io::Result<Option<OwnerLock>> {
        OwnerLock::try_acquire(&self.data_dir)
    }

    /// Like [`try_claim`](Self::try_claim), but contention is an error.
    pub fn claim(&self) -> Result<OwnerLock, Box<dyn std::error::Error>> {
        self.try_claim()?.ok_or_else(|| self.busy())
    }

    pub fn busy(&self) -> Box<dyn std::error::Error> {
        format!(
            "{} is owned by another eyecare process; send commands to a running `eyecare run` on its stdin",
            self.data_dir.display()
        )
        .into()
    }

    /// A controller on the system clock with no reminders or display.
    /// Only the owner of the data directory may drive it.
    pub fn controller(&self) -> PhaseController {
        PhaseController::new(self.open_store(), Box::new(SystemClock))
            .with_engine_config(self.config.engine.clone())
    }

    /// A controller over a private copy of the stored state. It can restore
    /// and fast-forward for display without writing anything back.
    pub fn observer(&self) -> PhaseController {
        let source = self.open_store();
        let copy = MemoryStore::new();
        for key in [SETTINGS_KEY, STATS_KEY, SESSION_KEY] {
            let value = match source.get(key) {
                Ok(Some(value)) => value,
                Ok(None) => continue,
                Err(e) => {
                    warn!(key, "could not read stored state: {e}");
                    continue;
                }
            };
            if let Err(e) = copy.set(key, &value) {
                warn!(key, "could not copy stored state: {e}");
            }
        }
        PhaseController::new(Box::new(copy), Box::new(SystemClock))
            .with_engine_config(self.config.engine.clone())
    }
}
