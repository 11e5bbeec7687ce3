//! Timer engine implementation.
//!
//! The engine is a pure function of
//! `(now, start, accumulated pause, running flag)`. It holds no session state
//! and performs no I/O, so it can be called at any rate.
//!
//! ## Phase order
//!
//! ```text
//! Warmup -> (Work -> Rest) x (rounds - 1) -> Work -> Cooldown -> Finished
//! ```
//!
//! Zero-length phases never appear.
//!
//! ## Usage
//!
//! ```ignore
//! let engine = TimerEngine::new(plan);
//! let snap = engine.snapshot(now_ms, start_ms, paused_ms, true);
//! ```

use super::plan::{Phase, Plan};
use super::snapshot::Snapshot;

/// Stateless snapshot calculator for one plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEngine {
    plan: Plan,
}

impl TimerEngine {
    pub fn new(plan: Plan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// Snapshot at `now_ms` for a session that started at `start_ms`.
    ///
    /// `start_ms == 0` means the session has not started.
    pub fn snapshot(
        &self,
        now_ms: u64,
        start_ms: u64,
        accumulated_pause_ms: u64,
        is_running: bool,
    ) -> Snapshot {
        if start_ms == 0 {
            return Snapshot::idle(self.plan.rounds(), self.plan.total_duration());
        }
        let elapsed_ms = now_ms
            .saturating_sub(start_ms)
            .saturating_sub(accumulated_pause_ms);
        self.snapshot_at(elapsed_ms / 1000, is_running)
    }

    /// Snapshot keyed directly on whole elapsed seconds.
    pub fn snapshot_at(&self, elapsed_secs: u64, is_running: bool) -> Snapshot {
        let plan = &self.plan;
        let total = plan.total_duration();
        if elapsed_secs >= total {
            return Snapshot::finished(plan.rounds(), total, total);
        }

        let active = |phase: Phase, round: u32, duration: u64, counter: u64| Snapshot {
            phase,
            round,
            total_rounds: plan.rounds(),
            remaining_secs: duration - counter,
            phase_total_secs: duration,
            elapsed_secs,
            total_secs: total,
            is_running,
        };

        let mut counter = elapsed_secs;

        let warmup = plan.phase_duration(Phase::Warmup, 0);
        if counter < warmup {
            return active(Phase::Warmup, 0, warmup, counter);
        }
        counter -= warmup;

        for round in 1..=plan.rounds() {
            let work = plan.phase_duration(Phase::Work, round);
            if counter < work {
                return active(Phase::Work, round, work, counter);
            }
            counter -= work;

            let rest = plan.phase_duration(Phase::Rest, round);
            if counter < rest {
                return active(Phase::Rest, round, rest, counter);
            }
            counter -= rest;
        }

        // elapsed < total guarantees the remainder falls inside the cooldown.
        let cooldown = plan.phase_duration(Phase::Cooldown, plan.rounds());
        active(Phase::Cooldown, plan.rounds(), cooldown, counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> TimerEngine {
        TimerEngine::new(Plan::new(10, 20, 10, 8, 30).unwrap())
    }

    #[test]
    fn idle_before_start() {
        let snap = scenario().snapshot(50_000, 0, 0, true);
        assert_eq!(snap.phase, Phase::Idle);
        assert_eq!(snap.total_secs, 270);
        assert_eq!(snap.remaining_secs, 0);
        assert!(!snap.is_running);
    }

    #[test]
    fn work_at_fifteen_seconds() {
        let snap = scenario().snapshot(1_000 + 15_000, 1_000, 0, true);
        assert_eq!(snap.phase, Phase::Work);
        assert_eq!(snap.round, 1);
        assert_eq!(snap.remaining_secs, 15);
        assert_eq!(snap.phase_total_secs, 20);
        assert!(snap.is_running);
    }

    #[test]
    fn rest_at_thirty_one_seconds() {
        let snap = scenario().snapshot_at(31, true);
        assert_eq!(snap.phase, Phase::Rest);
        assert_eq!(snap.round, 1);
        assert_eq!(snap.remaining_secs, 9);
    }

    #[test]
    fn warmup_reports_round_zero() {
        let snap = scenario().snapshot_at(3, true);
        assert_eq!(snap.phase, Phase::Warmup);
        assert_eq!(snap.round, 0);
        assert_eq!(snap.remaining_secs, 7);
    }

    #[test]
    fn cooldown_and_finished() {
        let engine = scenario();
        let snap = engine.snapshot_at(240, true);
        assert_eq!(snap.phase, Phase::Cooldown);
        assert_eq!(snap.round, 8);
        assert_eq!(snap.remaining_secs, 30);

        let done = engine.snapshot_at(270, true);
        assert_eq!(done.phase, Phase::Finished);
        assert_eq!(done.round, 8);
        assert_eq!(done.remaining_secs, 0);
        assert_eq!(done.elapsed_secs, 270);
        assert!(!done.is_running);
    }

    #[test]
    fn paused_time_is_subtracted() {
        let snap = scenario().snapshot(100_000, 50_000, 35_000, false);
        assert_eq!(snap.elapsed_secs, 15);
        assert!(!snap.is_running);
    }

    #[test]
    fn clock_before_start_clamps_to_zero() {
        let snap = scenario().snapshot(500, 1_000, 0, true);
        assert_eq!(snap.elapsed_secs, 0);
        assert_eq!(snap.phase, Phase::Warmup);
    }

    #[test]
    fn truncates_partial_seconds() {
        let snap = scenario().snapshot(1_000 + 10_999, 1_000, 0, true);
        assert_eq!(snap.elapsed_secs, 10);
        assert_eq!(snap.phase, Phase::Work);
        assert_eq!(snap.remaining_secs, 20);
    }
}
