//! Execution counters.

use super::outcome::PipelineOutcome;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters accumulated across the executions of one executor.
///
/// All counters are monotonic; readers take a [`StatsSnapshot`] rather than
/// observing individual counters, so a snapshot is internally close to
/// consistent but not atomic across fields.
#[derive(Debug, Default)]
pub struct ExecutionStats {
    received: AtomicU64,
    kept: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
    duration_micros: AtomicU64,
}

impl ExecutionStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_outcome(&self, outcome: &PipelineOutcome, elapsed: Duration) {
        match outcome {
            PipelineOutcome::Kept(_) => self.kept.fetch_add(1, Ordering::Relaxed),
            PipelineOutcome::Dropped => self.dropped.fetch_add(1, Ordering::Relaxed),
            PipelineOutcome::Failed(_) => self.failed.fetch_add(1, Ordering::Relaxed),
        };
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.duration_micros.fetch_add(micros, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of the counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            kept: self.kept.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            total_duration: Duration::from_micros(self.duration_micros.load(Ordering::Relaxed)),
        }
    }
}

/// A point-in-time copy of [`ExecutionStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Documents handed to the executor.
    pub received: u64,
    /// Executions that finished with a surviving document.
    pub kept: u64,
    /// Executions that discarded their document.
    pub dropped: u64,
    /// Executions that failed.
    pub failed: u64,
    /// Wall time spent executing, summed across executions.
    pub total_duration: Duration,
}

impl StatsSnapshot {
    /// Executions that have started but not yet reached an outcome.
    #[must_use]
    pub const fn in_flight(&self) -> u64 {
        self.received
            .saturating_sub(self.kept + self.dropped + self.failed)
    }
}
