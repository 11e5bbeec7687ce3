use serde::{Deserialize, Serialize};

use super::plan::Phase;

/// Fully-derived description of the timer at one instant.
///
/// Progress values are computed on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    /// 1-based round; 0 while Idle or in Warmup.
    pub round: u32,
    pub total_rounds: u32,
    pub remaining_secs: u64,
    pub phase_total_secs: u64,
    /// Seconds since start, paused time excluded.
    pub elapsed_secs: u64,
    pub total_secs: u64,
    pub is_running: bool,
}

impl Snapshot {
    /// Snapshot before any start time exists.
    pub fn idle(total_rounds: u32, total_secs: u64) -> Self {
        Self {
            phase: Phase::Idle,
            round: 0,
            total_rounds,
            remaining_secs: 0,
            phase_total_secs: 0,
            elapsed_secs: 0,
            total_secs,
            is_running: false,
        }
    }

    /// Terminal snapshot. `elapsed_secs` is clamped to the plan length.
    pub fn finished(total_rounds: u32, elapsed_secs: u64, total_secs: u64) -> Self {
        Self {
            phase: Phase::Finished,
            round: total_rounds,
            total_rounds,
            remaining_secs: 0,
            phase_total_secs: 0,
            elapsed_secs: elapsed_secs.min(total_secs),
            total_secs,
            is_running: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn elapsed_in_phase_secs(&self) -> u64 {
        self.phase_total_secs - self.remaining_secs
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn phase_progress(&self) -> f64 {
        if self.phase_total_secs == 0 {
            return if self.is_finished() { 1.0 } else { 0.0 };
        }
        self.elapsed_in_phase_secs() as f64 / self.phase_total_secs as f64
    }

    /// 0.0 .. 1.0 progress across the whole plan.
    pub fn overall_progress(&self) -> f64 {
        if self.total_secs == 0 {
            return if self.is_finished() { 1.0 } else { 0.0 };
        }
        (self.elapsed_secs as f64 / self.total_secs as f64).min(1.0)
    }
}

/// Format seconds as `MM:SS`, or `H:MM:SS` from one hour up.
pub fn format_remaining(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_ratios() {
        let snap = Snapshot {
            phase: Phase::Work,
            round: 1,
            total_rounds: 8,
            remaining_secs: 15,
            phase_total_secs: 20,
            elapsed_secs: 15,
            total_secs: 270,
            is_running: true,
        };
        assert_eq!(snap.elapsed_in_phase_secs(), 5);
        assert!((snap.phase_progress() - 0.25).abs() < f64::EPSILON);
        assert!((snap.overall_progress() - 15.0 / 270.0).abs() < 1e-9);
    }

    #[test]
    fn finished_clamps_elapsed() {
        let snap = Snapshot::finished(8, 500, 270);
        assert_eq!(snap.elapsed_secs, 270);
        assert_eq!(snap.phase_progress(), 1.0);
        assert!(!snap.is_running);
    }

    #[test]
    fn formats_remaining_time() {
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(75), "01:15");
        assert_eq!(format_remaining(3725), "1:02:05");
    }
}
