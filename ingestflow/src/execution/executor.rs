//! Drives documents through pipelines to a terminal outcome.

use super::outcome::PipelineOutcome;
use super::stats::{ExecutionStats, StatsSnapshot};
use crate::document::IngestDocument;
use crate::errors::ConfigError;
use crate::pipeline::PipelineResolver;
use crate::processors::ProcessorOutcome;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Runs documents through registered pipelines.
///
/// The executor resolves the pipeline per run, so concurrent executions are
/// independent and an execution keeps the pipeline it started with even when
/// the store changes underneath it. Errors never escape [`run`](Self::run);
/// they become [`PipelineOutcome::Failed`].
pub struct PipelineExecutor {
    resolver: Arc<dyn PipelineResolver>,
    stats: Arc<ExecutionStats>,
}

impl PipelineExecutor {
    /// Creates an executor resolving pipelines through `resolver`.
    #[must_use]
    pub fn new(resolver: Arc<dyn PipelineResolver>) -> Self {
        Self {
            resolver,
            stats: Arc::new(ExecutionStats::new()),
        }
    }

    /// A snapshot of the execution counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Runs `document` through the pipeline registered under `pipeline_id`.
    pub async fn run(&self, document: IngestDocument, pipeline_id: &str) -> PipelineOutcome {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        self.stats.record_received();
        debug!(%run_id, pipeline_id, "pipeline execution starting");

        let outcome = match self.resolver.resolve(pipeline_id) {
            None => PipelineOutcome::Failed(ConfigError::unknown_pipeline(pipeline_id).into()),
            Some(pipeline) => match pipeline.execute(document).await {
                Ok(ProcessorOutcome::Document(document)) => PipelineOutcome::Kept(document),
                Ok(ProcessorOutcome::Dropped) => PipelineOutcome::Dropped,
                Err(error) => PipelineOutcome::Failed(error),
            },
        };

        let elapsed = started.elapsed();
        match &outcome {
            PipelineOutcome::Kept(_) => {
                debug!(%run_id, pipeline_id, ?elapsed, "pipeline execution kept document");
            }
            PipelineOutcome::Dropped => {
                debug!(%run_id, pipeline_id, ?elapsed, "pipeline execution dropped document");
            }
            PipelineOutcome::Failed(failure) if !failure.is_recoverable() => {
                error!(
                    %run_id,
                    pipeline_id,
                    error = %failure,
                    recoverable = false,
                    "pipeline execution aborted"
                );
            }
            PipelineOutcome::Failed(failure) => {
                warn!(%run_id, pipeline_id, error = %failure, "pipeline execution failed");
            }
        }
        self.stats.record_outcome(&outcome, elapsed);
        outcome
    }
}

impl fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineExecutor")
            .field("stats", &self.stats.snapshot())
            .finish_non_exhaustive()
    }
}
