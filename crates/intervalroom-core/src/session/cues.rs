//! Cue detection over a stream of snapshots.
//!
//! The tracker only decides *that* a cue is due. Whether it sounds or
//! vibrates is left to the controller, which consults settings at that moment.

use crate::timer::{Phase, Snapshot};

/// Countdown cues fire for these remaining-second values.
pub const COUNTDOWN_WINDOW: std::ops::RangeInclusive<u64> = 1..=5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueKind {
    /// Entered Work, Rest or Cooldown, or a new round of the same phase.
    Boundary,
    /// Remaining seconds in a Work or Rest phase just changed to this value.
    Countdown(u64),
}

/// Outcome of observing one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Observation {
    pub transition: Option<(Phase, Phase)>,
    pub cue: Option<CueKind>,
}

#[derive(Debug, Clone, Default)]
pub struct CueTracker {
    last_phase: Option<Phase>,
    last_round: Option<u32>,
    last_remaining: Option<u64>,
    finish_cued: bool,
}

impl CueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything and treat the timer as Idle. Called on Start.
    pub fn reset(&mut self) {
        self.last_phase = Some(Phase::Idle);
        self.last_round = None;
        self.last_remaining = None;
        self.finish_cued = false;
    }

    /// Record a snapshot without firing anything.
    ///
    /// Used after Pause, Resume and recovery so the next tick does not
    /// mistake the command itself for a countdown step.
    pub fn seed(&mut self, snap: &Snapshot) {
        self.last_phase = Some(snap.phase);
        self.last_round = Some(snap.round);
        self.last_remaining = Some(snap.remaining_secs);
    }

    pub fn observe(&mut self, snap: &Snapshot) -> Observation {
        let prev_phase = self.last_phase.replace(snap.phase);
        let prev_round = self.last_round.replace(snap.round);
        let prev_remaining = self.last_remaining.replace(snap.remaining_secs);

        // Back-to-back rounds with no rest stay in Work but are still a boundary.
        let new_round = snap.phase.is_round_phase()
            && prev_round.is_some_and(|round| round != snap.round);

        if let Some(from) = prev_phase.filter(|p| *p != snap.phase || new_round) {
            let cue = matches!(snap.phase, Phase::Work | Phase::Rest | Phase::Cooldown)
                .then_some(CueKind::Boundary);
            return Observation {
                transition: Some((from, snap.phase)),
                cue,
            };
        }

        let countdown = snap.is_running
            && snap.phase.is_round_phase()
            && COUNTDOWN_WINDOW.contains(&snap.remaining_secs)
            && prev_remaining.is_some_and(|prev| prev != snap.remaining_secs);

        Observation {
            transition: None,
            cue: countdown.then_some(CueKind::Countdown(snap.remaining_secs)),
        }
    }

    /// True exactly once per session: the long end-of-session cue.
    pub fn take_finish_cue(&mut self) -> bool {
        !std::mem::replace(&mut self.finish_cued, true)
    }
}
