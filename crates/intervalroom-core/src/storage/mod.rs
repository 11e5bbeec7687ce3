mod config;
pub mod database;
pub mod session_lock;
pub mod session_store;

pub use config::{Config, ConfigSettings, TimerConfig};
pub use database::{Database, KeyValueStore, MemoryStore};
pub use session_lock::SessionLock;
pub use session_store::{PersistedSession, SessionStore, SESSION_KEY};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `INTERVALROOM_DATA_DIR` overrides the location outright. Otherwise this is
/// `~/.config/intervalroom[-dev]/`, with the `-dev` suffix selected by
/// `INTERVALROOM_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("INTERVALROOM_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("INTERVALROOM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("intervalroom-dev")
            } else {
                base_dir.join("intervalroom")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
