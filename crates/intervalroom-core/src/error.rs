//! Core error types for intervalroom-core.
//!
//! Nothing in the timer core is fatal to the host process. These types exist
//! so callers can report *why* a side effect went missing; the controller
//! itself logs and swallows store and cue failures.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for intervalroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Plan construction errors
    #[error("Invalid plan: {0}")]
    Plan(#[from] PlanError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Persistence-related errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Rejected plan parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// Round count below one
    #[error("round count must be at least 1, got {0}")]
    InvalidRounds(u32),

    /// Unknown preset name
    #[error("unknown preset '{0}' (expected 'tabata' or 'emom')")]
    UnknownPreset(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Data directory could not be resolved or created
    #[error("Failed to prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Persistence surface errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Stored record could not be decoded
    #[error("Corrupt session record: {0}")]
    Corrupt(String),

    /// Session lock file could not be opened or locked
    #[error("Failed to lock {path}: {source}")]
    LockFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another process holds the session
    #[error("session is held by another intervalroom process (a foreground `timer run`); use its controls or stop it first")]
    Owned,
}

/// Cue and status-surface failures. Always swallowed by the controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CueError {
    /// The output device is not present on this host
    #[error("{0} unavailable")]
    Unavailable(&'static str),

    /// The device rejected the request
    #[error("cue failed: {0}")]
    Failed(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_error_converts_into_core_error() {
        let err: CoreError = PlanError::InvalidRounds(0).into();
        assert_eq!(err.to_string(), "Invalid plan: round count must be at least 1, got 0");
    }

    #[test]
    fn store_error_converts_into_core_error() {
        let err: CoreError = StoreError::Owned.into();
        assert!(err.to_string().starts_with("Store error: session is held"));
    }

    #[test]
    fn non_lock_sqlite_failure_maps_to_query_failed() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::QueryFailed(_)));
    }
}
