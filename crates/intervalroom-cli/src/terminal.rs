//! Terminal rendering for the foreground runner.

use std::io::Write;

use intervalroom_core::{Cue, CueError, Notifier, StatusPayload};

/// Draws the status line on stderr and rings the terminal bell for cues.
///
/// Terminals cannot vibrate; vibration cues report `Unavailable` and are
/// dropped by the controller.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn update_status(&self, payload: &StatusPayload) -> Result<(), CueError> {
        let mut err = std::io::stderr().lock();
        write!(err, "\r\x1b[2K{payload}")
            .and_then(|_| err.flush())
            .map_err(|e| CueError::Failed(e.to_string()))
    }

    fn clear_status(&self) -> Result<(), CueError> {
        let mut err = std::io::stderr().lock();
        write!(err, "\r\x1b[2K")
            .and_then(|_| err.flush())
            .map_err(|e| CueError::Failed(e.to_string()))
    }

    fn play(&self, cue: Cue) -> Result<(), CueError> {
        let bell = match cue {
            Cue::Short => "\x07",
            Cue::Long => "\x07\x07\x07",
        };
        let mut out = std::io::stdout().lock();
        write!(out, "{bell}")
            .and_then(|_| out.flush())
            .map_err(|e| CueError::Failed(e.to_string()))
    }

    fn vibrate(&self, _cue: Cue) -> Result<(), CueError> {
        Err(CueError::Unavailable("vibration"))
    }
}
