//! Pipeline execution: the executor, its outcomes, and counters.

mod executor;
mod outcome;
mod stats;

pub use executor::PipelineExecutor;
pub use outcome::PipelineOutcome;
pub use stats::{ExecutionStats, StatsSnapshot};
