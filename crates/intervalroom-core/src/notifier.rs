//! Outbound side channel: status surface, audio and haptic cues.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::CueError;
use crate::timer::{format_remaining, Phase, Snapshot};

/// Cue length. Short marks boundaries and countdown seconds; long marks the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cue {
    Short,
    Long,
}

/// Payload for the persistent status surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub phase: Phase,
    pub phase_label: String,
    /// `MM:SS`, or `H:MM:SS` from one hour up.
    pub remaining: String,
    /// `(current, total)`, only for Work and Rest.
    pub round: Option<(u32, u32)>,
}

impl StatusPayload {
    pub fn from_snapshot(snap: &Snapshot) -> Self {
        Self {
            phase: snap.phase,
            phase_label: snap.phase.label().to_string(),
            remaining: format_remaining(snap.remaining_secs),
            round: snap
                .phase
                .is_round_phase()
                .then_some((snap.round, snap.total_rounds)),
        }
    }
}

impl std::fmt::Display for StatusPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.phase_label, self.remaining)?;
        if let Some((current, total)) = self.round {
            write!(f, "  round {current}/{total}")?;
        }
        Ok(())
    }
}

/// Receiver of status updates and cues.
///
/// Implementations may fail freely; the controller logs and drops every error.
pub trait Notifier: Send + Sync {
    fn update_status(&self, payload: &StatusPayload) -> Result<(), CueError>;

    fn clear_status(&self) -> Result<(), CueError> {
        Ok(())
    }

    fn play(&self, cue: Cue) -> Result<(), CueError>;

    fn vibrate(&self, cue: Cue) -> Result<(), CueError>;

    /// Release any held device handles. Called when a session ends.
    fn release(&self) {}
}

/// Notifier that does nothing. Used when no output surface is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn update_status(&self, _payload: &StatusPayload) -> Result<(), CueError> {
        Ok(())
    }

    fn play(&self, _cue: Cue) -> Result<(), CueError> {
        Ok(())
    }

    fn vibrate(&self, _cue: Cue) -> Result<(), CueError> {
        Ok(())
    }
}

/// Everything a [`RecordingNotifier`] observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Status(StatusPayload),
    ClearStatus,
    Sound(Cue),
    Vibration(Cue),
    Release,
}

/// Notifier that records calls in order. Intended for tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    log: Mutex<Vec<Notification>>,
    fail_devices: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose sound and vibration devices always fail.
    pub fn broken() -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            fail_devices: true,
        }
    }

    pub fn take(&self) -> Vec<Notification> {
        self.log
            .lock()
            .map(|mut log| std::mem::take(&mut *log))
            .unwrap_or_default()
    }

    pub fn sounds(&self) -> Vec<Cue> {
        self.snapshot_log()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Sound(cue) => Some(cue),
                _ => None,
            })
            .collect()
    }

    pub fn vibrations(&self) -> Vec<Cue> {
        self.snapshot_log()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Vibration(cue) => Some(cue),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<StatusPayload> {
        self.snapshot_log()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Status(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn released(&self) -> bool {
        self.snapshot_log().contains(&Notification::Release)
    }

    fn snapshot_log(&self) -> Vec<Notification> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    fn push(&self, n: Notification) {
        if let Ok(mut log) = self.log.lock() {
            log.push(n);
        }
    }
}

impl Notifier for RecordingNotifier {
    fn update_status(&self, payload: &StatusPayload) -> Result<(), CueError> {
        self.push(Notification::Status(payload.clone()));
        Ok(())
    }

    fn clear_status(&self) -> Result<(), CueError> {
        self.push(Notification::ClearStatus);
        Ok(())
    }

    fn play(&self, cue: Cue) -> Result<(), CueError> {
        if self.fail_devices {
            return Err(CueError::Unavailable("audio"));
        }
        self.push(Notification::Sound(cue));
        Ok(())
    }

    fn vibrate(&self, cue: Cue) -> Result<(), CueError> {
        if self.fail_devices {
            return Err(CueError::Unavailable("vibration"));
        }
        self.push(Notification::Vibration(cue));
        Ok(())
    }

    fn release(&self) {
        self.push(Notification::Release);
    }
}
