use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// One named segment of the workout timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Warmup,
    Work,
    Rest,
    Cooldown,
    Finished,
}

impl Phase {
    /// Human-readable name used on the status surface.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Idle => "Ready",
            Phase::Warmup => "Warm-up",
            Phase::Work => "Work",
            Phase::Rest => "Rest",
            Phase::Cooldown => "Cool-down",
            Phase::Finished => "Finished",
        }
    }

    /// Work and Rest are the phases that belong to a round.
    pub fn is_round_phase(self) -> bool {
        matches!(self, Phase::Work | Phase::Rest)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw plan parameters as they appear on disk and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanParams {
    pub warmup: u32,
    pub work: u32,
    pub rest: u32,
    pub rounds: u32,
    pub cooldown: u32,
}

/// Immutable interval plan. All durations are in seconds.
///
/// Construction rejects a round count of zero; there is no clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PlanParams", into = "PlanParams")]
pub struct Plan {
    warmup: u32,
    work: u32,
    rest: u32,
    rounds: u32,
    cooldown: u32,
}

/// A non-degenerate phase occurrence on the plan's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseSpan {
    pub phase: Phase,
    /// 1-based round, 0 for Warmup. Cooldown carries the final round.
    pub round: u32,
    /// Offset in seconds from session start.
    pub start: u64,
    pub duration: u64,
}

impl Plan {
    pub fn new(
        warmup: u32,
        work: u32,
        rest: u32,
        rounds: u32,
        cooldown: u32,
    ) -> Result<Self, PlanError> {
        if rounds == 0 {
            return Err(PlanError::InvalidRounds(rounds));
        }
        Ok(Self {
            warmup,
            work,
            rest,
            rounds,
            cooldown,
        })
    }

    /// 20s work / 10s rest, eight rounds.
    pub fn tabata() -> Self {
        Self {
            warmup: 0,
            work: 20,
            rest: 10,
            rounds: 8,
            cooldown: 0,
        }
    }

    /// Every minute on the minute: one 60s work block per round, no rest.
    pub fn emom(minutes: u32) -> Result<Self, PlanError> {
        Self::new(0, 60, 0, minutes, 0)
    }

    /// Look up a named preset.
    pub fn preset(name: &str, rounds: Option<u32>) -> Result<Self, PlanError> {
        match name.to_ascii_lowercase().as_str() {
            "tabata" => match rounds {
                Some(n) => Self::new(0, 20, 10, n, 0),
                None => Ok(Self::tabata()),
            },
            "emom" => Self::emom(rounds.unwrap_or(10)),
            _ => Err(PlanError::UnknownPreset(name.to_string())),
        }
    }

    pub fn warmup(&self) -> u32 {
        self.warmup
    }

    pub fn work(&self) -> u32 {
        self.work
    }

    pub fn rest(&self) -> u32 {
        self.rest
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    pub fn params(&self) -> PlanParams {
        PlanParams::from(*self)
    }

    /// Total plan length in seconds.
    pub fn total_duration(&self) -> u64 {
        let rounds = u64::from(self.rounds);
        u64::from(self.warmup)
            + u64::from(self.work) * rounds
            + u64::from(self.rest) * rounds.saturating_sub(1)
            + u64::from(self.cooldown)
    }

    /// Length of one occurrence of `phase` in `round`.
    ///
    /// Rest after the final round does not exist and reports 0.
    pub fn phase_duration(&self, phase: Phase, round: u32) -> u64 {
        match phase {
            Phase::Warmup => u64::from(self.warmup),
            Phase::Work => u64::from(self.work),
            Phase::Rest if round < self.rounds => u64::from(self.rest),
            Phase::Rest => 0,
            Phase::Cooldown => u64::from(self.cooldown),
            Phase::Idle | Phase::Finished => 0,
        }
    }

    /// Offset in seconds from session start at which `phase` of `round` begins.
    ///
    /// `round` is clamped into `1..=rounds` for Work and Rest.
    pub fn phase_start(&self, phase: Phase, round: u32) -> u64 {
        let round = u64::from(round.clamp(1, self.rounds));
        let warmup = u64::from(self.warmup);
        let cycle = u64::from(self.work) + u64::from(self.rest);
        match phase {
            Phase::Idle | Phase::Warmup => 0,
            Phase::Work => warmup + (round - 1) * cycle,
            Phase::Rest => warmup + (round - 1) * cycle + u64::from(self.work),
            Phase::Cooldown => self.total_duration() - u64::from(self.cooldown),
            Phase::Finished => self.total_duration(),
        }
    }

    /// The ordered timeline of non-zero-length phases.
    pub fn phases(&self) -> Vec<PhaseSpan> {
        let mut spans = Vec::new();
        let mut offset = 0u64;
        let mut push = |phase: Phase, round: u32, duration: u64| {
            if duration > 0 {
                spans.push(PhaseSpan {
                    phase,
                    round,
                    start: offset,
                    duration,
                });
                offset += duration;
            }
        };

        push(Phase::Warmup, 0, u64::from(self.warmup));
        for round in 1..=self.rounds {
            push(Phase::Work, round, self.phase_duration(Phase::Work, round));
            push(Phase::Rest, round, self.phase_duration(Phase::Rest, round));
        }
        push(Phase::Cooldown, self.rounds, u64::from(self.cooldown));
        spans
    }
}

impl TryFrom<PlanParams> for Plan {
    type Error = PlanError;

    fn try_from(p: PlanParams) -> Result<Self, Self::Error> {
        Plan::new(p.warmup, p.work, p.rest, p.rounds, p.cooldown)
    }
}

impl From<Plan> for PlanParams {
    fn from(plan: Plan) -> Self {
        Self {
            warmup: plan.warmup,
            work: plan.work,
            rest: plan.rest,
            rounds: plan.rounds,
            cooldown: plan.cooldown,
        }
    }
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            warmup: 10,
            work: 20,
            rest: 10,
            rounds: 8,
            cooldown: 30,
        }
    }
}
