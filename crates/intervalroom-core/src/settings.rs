//! Cue settings as seen by the controller.
//!
//! The controller asks for settings at every cue decision and never caches
//! them, so a change in the settings collaborator applies to the next cue.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueSettings {
    #[serde(default = "default_true")]
    pub sound: bool,
    #[serde(default = "default_true")]
    pub vibration: bool,
    #[serde(default = "default_true")]
    pub countdown: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CueSettings {
    fn default() -> Self {
        Self {
            sound: true,
            vibration: true,
            countdown: true,
        }
    }
}

/// Read capability for cue settings.
pub trait CueSettingsSource: Send + Sync {
    fn cue_settings(&self) -> CueSettings;
}

/// In-memory settings, shared between clones. Writers see their changes
/// reflected at the controller's next decision.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<CueSettings>>,
}

impl SharedSettings {
    pub fn new(settings: CueSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut CueSettings)) {
        if let Ok(mut guard) = self.inner.write() {
            f(&mut guard);
        }
    }
}

impl CueSettingsSource for SharedSettings {
    fn cue_settings(&self) -> CueSettings {
        self.inner.read().map(|s| *s).unwrap_or_default()
    }
}
