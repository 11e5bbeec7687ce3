mod controller;
mod cues;
mod service;

pub use controller::{SessionStatus, TimerController, DEFAULT_STATUS_INTERVAL_MS};
pub use cues::{CueKind, CueTracker, Observation, COUNTDOWN_WINDOW};
pub use service::{TimerService, DEFAULT_TICK_INTERVAL};
