mod engine;
mod plan;
mod snapshot;

pub use engine::TimerEngine;
pub use plan::{Phase, PhaseSpan, Plan, PlanParams};
pub use snapshot::{format_remaining, Snapshot};
