pub mod plan;
pub mod runner;

pub use plan::{plan_units, unit_seed, WorkUnit};
pub use runner::{run_unit, RunOutput, RunSummary, Runner, UnitOutcome};
