use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, Plan, Snapshot};

/// Every state change of a session produces an Event.
///
/// Commands return `None` instead of an event when they are not valid in the
/// current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        plan: Plan,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        snapshot: Snapshot,
        at: DateTime<Utc>,
    },
    SessionResumed {
        snapshot: Snapshot,
        /// Length of the pause that just ended.
        paused_ms: u64,
        at: DateTime<Utc>,
    },
    /// Persisted session picked up after a restart.
    SessionRecovered {
        snapshot: Snapshot,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: Phase,
        to: Phase,
        round: u32,
        at: DateTime<Utc>,
    },
    /// Plan ran to completion.
    SessionFinished {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// Session ended by an explicit stop.
    SessionStopped {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
}
