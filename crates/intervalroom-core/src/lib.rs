//! # Intervalroom Core Library
//!
//! This library provides the core logic for the Intervalroom interval-training
//! timer. Like its CLI, any GUI is meant to be a thin layer over the same
//! core library.
//!
//! ## Architecture
//!
//! - **Plan**: immutable warm-up / work / rest / rounds / cool-down description
//! - **Timer Engine**: a pure function from (now, start, paused time) to a
//!   [`Snapshot`] of the active phase and remaining time
//! - **Session Controller**: the single owner of mutable session state; it
//!   persists, recovers after a restart and decides when cues fire
//! - **Timer Service**: tokio wrapper that serializes commands and runs the
//!   cancellable tick loop
//! - **Storage**: SQLite key-value persistence and TOML configuration
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: phase/remaining-time computation
//! - [`TimerController`]: session state machine
//! - [`TimerService`]: async tick loop and snapshot broadcast
//! - [`Config`]: application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod notifier;
pub mod session;
pub mod settings;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{ConfigError, CoreError, CueError, PlanError, StoreError};
pub use events::Event;
pub use notifier::{Cue, Notifier, NullNotifier, RecordingNotifier, StatusPayload};
pub use session::{SessionStatus, TimerController, TimerService};
pub use settings::{CueSettings, CueSettingsSource, SharedSettings};
pub use storage::{
    Config, ConfigSettings, Database, KeyValueStore, MemoryStore, SessionLock, SessionStore,
};
pub use timer::{Phase, Plan, Snapshot, TimerEngine};
