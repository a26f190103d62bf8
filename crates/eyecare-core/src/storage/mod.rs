mod config;
pub mod database;
pub mod memory;

pub use config::{Config, EngineConfig, LogConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::error::StorageError;

/// Key holding the user settings blob.
pub const SETTINGS_KEY: &str = "settings";
/// Key holding the completion statistics blob.
pub const STATS_KEY: &str = "stats";
/// Key holding the single persisted session snapshot.
pub const SESSION_KEY: &str = "session";

/// Blocking key-value persistence.
///
/// Calls complete before returning, so a save issued right before the
/// process is suspended or exits has landed by the time it returns.
pub trait PersistentStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Returns the data directory for databases and config files.
///
/// `EYECARE_DATA_DIR` wins when set. Otherwise `~/.config/eyecare[-dev]/`,
/// with the `-dev` suffix selected by `EYECARE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("EYECARE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("EYECARE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("eyecare-dev")
            } else {
                base_dir.join("eyecare")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
