//! Persisted session record.
//!
//! One flat JSON record under [`SESSION_KEY`]. Every field is required: a
//! record missing any of them does not decode and counts as absent.

use serde::{Deserialize, Serialize};

use super::database::KeyValueStore;
use crate::error::StoreError;
use crate::timer::Plan;

pub const SESSION_KEY: &str = "interval_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistedSession {
    pub plan: Plan,
    /// Monotonic clock ms; 0 = unset.
    pub start_timestamp: u64,
    pub accumulated_pause_ms: u64,
    /// 0 = not currently paused.
    pub pause_begin_ms: u64,
    pub is_running: bool,
}

/// Codec between [`PersistedSession`] and a key-value store.
pub struct SessionStore {
    kv: Box<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(kv: impl KeyValueStore + 'static) -> Self {
        Self { kv: Box::new(kv) }
    }

    /// Read the record. `Ok(None)` when nothing is stored.
    ///
    /// # Errors
    /// Returns [`StoreError::Corrupt`] when a record exists but cannot be
    /// decoded, or the backend's error when the read itself fails.
    pub fn load(&self) -> Result<Option<PersistedSession>, StoreError> {
        let Some(json) = self.kv.get(SESSION_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    pub fn save(&self, session: &PersistedSession) -> Result<(), StoreError> {
        let json = serde_json::to_string(session).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        self.kv.set(SESSION_KEY, &json)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.kv.remove(SESSION_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn record() -> PersistedSession {
        PersistedSession {
            plan: Plan::new(10, 20, 10, 8, 30).unwrap(),
            start_timestamp: 1_000,
            accumulated_pause_ms: 2_500,
            pause_begin_ms: 0,
            is_running: true,
        }
    }

    #[test]
    fn save_load_clear() {
        let store = SessionStore::new(MemoryStore::new());
        assert_eq!(store.load().unwrap(), None);
        store.save(&record()).unwrap();
        assert_eq!(store.load().unwrap(), Some(record()));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn record_layout_is_flat_and_named() {
        let value = serde_json::to_value(record()).unwrap();
        assert_eq!(value["plan"]["rounds"], 8);
        assert_eq!(value["start_timestamp"], 1_000);
        assert_eq!(value["accumulated_pause_ms"], 2_500);
        assert_eq!(value["pause_begin_ms"], 0);
        assert_eq!(value["is_running"], true);
    }

    #[test]
    fn partial_record_is_corrupt() {
        let kv = MemoryStore::new();
        kv.set(SESSION_KEY, r#"{"start_timestamp":1000,"is_running":true}"#)
            .unwrap();
        let store = SessionStore::new(kv);
        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
    }
}
