use clap::{Args, Subcommand};
use intervalroom_core::timer::format_remaining;
use intervalroom_core::{Config, Plan, TimerEngine};
use serde_json::json;

/// Plan selection shared by `plan` and `timer` commands.
///
/// Unset fields fall back to the `[plan]` section of the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct PlanArgs {
    /// Named preset: "tabata" or "emom" (ignores the duration flags)
    #[arg(long)]
    pub preset: Option<String>,
    /// Warm-up seconds
    #[arg(long)]
    pub warmup: Option<u32>,
    /// Work seconds per round
    #[arg(long)]
    pub work: Option<u32>,
    /// Rest seconds between rounds
    #[arg(long)]
    pub rest: Option<u32>,
    /// Number of rounds (at least 1)
    #[arg(long)]
    pub rounds: Option<u32>,
    /// Cool-down seconds
    #[arg(long)]
    pub cooldown: Option<u32>,
}

impl PlanArgs {
    pub fn resolve(&self, config: &Config) -> Result<Plan, Box<dyn std::error::Error>> {
        if let Some(name) = &self.preset {
            return Ok(Plan::preset(name, self.rounds)?);
        }
        let base = config.plan;
        Ok(Plan::new(
            self.warmup.unwrap_or(base.warmup),
            self.work.unwrap_or(base.work),
            self.rest.unwrap_or(base.rest),
            self.rounds.unwrap_or(base.rounds),
            self.cooldown.unwrap_or(base.cooldown),
        )?)
    }
}

#[derive(Subcommand)]
pub enum PlanAction {
    /// Print the plan's total duration and phase timeline
    Show {
        #[command(flatten)]
        plan: PlanArgs,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Preview the snapshot at a given elapsed second
    At {
        /// Elapsed seconds since start
        elapsed: u64,
        #[command(flatten)]
        plan: PlanArgs,
    },
}

pub fn run(action: PlanAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    match action {
        PlanAction::Show { plan, json } => {
            let plan = plan.resolve(&config)?;
            if json {
                let out = json!({
                    "plan": plan,
                    "total_secs": plan.total_duration(),
                    "phases": plan.phases(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!(
                    "total {} ({} rounds)",
                    format_remaining(plan.total_duration()),
                    plan.rounds()
                );
                for span in plan.phases() {
                    let round = if span.phase.is_round_phase() {
                        format!(" {}/{}", span.round, plan.rounds())
                    } else {
                        String::new()
                    };
                    println!(
                        "{:>8}  {:<9}{:<7} {}",
                        format_remaining(span.start),
                        span.phase.label(),
                        round,
                        format_remaining(span.duration),
                    );
                }
            }
        }
        PlanAction::At { elapsed, plan } => {
            let plan = plan.resolve(&config)?;
            let snapshot = TimerEngine::new(plan).snapshot_at(elapsed, true);
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }
    Ok(())
}
