//! Core error types for eyecare-core.
//!
//! Collaborator failures (storage, notifications) are mostly logged and
//! swallowed by the phase controller; these types surface at the edges where
//! a caller can still act on them (settings changes, CLI commands).

use std::path::PathBuf;
use thiserror::Error;

use crate::timer::PhaseState;

/// Core error type for eyecare-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence backend errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Runtime configuration file errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A setting outside its accepted range, rejected at the boundary
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfiguration { key: String, message: String },

    /// A persisted session record that cannot be parsed
    #[error("Malformed session snapshot: {0}")]
    MalformedSnapshot(String),

    /// Settings can only change while nothing is counting down
    #[error("Settings can only be changed while idle (current state: {state})")]
    NotIdle { state: PhaseState },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistence backend errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the database file
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked by another process
    #[error("Database is locked")]
    Locked,

    /// Storage is disabled or otherwise refusing writes
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Runtime configuration file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown settings key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse a configuration value
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// A notification collaborator failed to deliver a reminder.
#[derive(Error, Debug)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked
                    || inner.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
