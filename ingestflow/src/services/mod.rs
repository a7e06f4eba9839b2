//! Runtime services shared by processors during execution.

mod lookup;
mod scheduler;
mod script;
mod task_executor;

pub use lookup::{LookupClient, StaticLookupClient};
pub use scheduler::{ScheduledCallback, Scheduler, SchedulerHandle, SchedulerTrigger, TokioScheduler};
pub use script::ScriptEvaluator;
pub use task_executor::{TaskExecutor, TokioTaskExecutor};

use crate::pipeline::PipelineResolver;
use std::fmt;
use std::sync::Arc;

/// The service bundle handed to processor factories.
///
/// Factories capture the services a processor needs at build time, so the
/// processor itself carries no registry or store reference. The scheduler and
/// task executor default to their tokio-backed implementations; the script
/// evaluator and lookup client are optional and absent unless installed.
#[derive(Clone)]
pub struct RuntimeServices {
    scheduler: Arc<dyn Scheduler>,
    task_executor: Arc<dyn TaskExecutor>,
    pipeline_resolver: Arc<dyn PipelineResolver>,
    script_evaluator: Option<Arc<dyn ScriptEvaluator>>,
    lookup_client: Option<Arc<dyn LookupClient>>,
}

impl RuntimeServices {
    /// Creates a service bundle around a pipeline resolver, with tokio-backed
    /// defaults for the scheduler and task executor.
    #[must_use]
    pub fn new(pipeline_resolver: Arc<dyn PipelineResolver>) -> Self {
        Self {
            scheduler: Arc::new(TokioScheduler::new()),
            task_executor: Arc::new(TokioTaskExecutor::new()),
            pipeline_resolver,
            script_evaluator: None,
            lookup_client: None,
        }
    }

    /// Replaces the scheduler.
    #[must_use]
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Replaces the task executor.
    #[must_use]
    pub fn with_task_executor(mut self, task_executor: Arc<dyn TaskExecutor>) -> Self {
        self.task_executor = task_executor;
        self
    }

    /// Installs a script evaluator.
    #[must_use]
    pub fn with_script_evaluator(mut self, evaluator: Arc<dyn ScriptEvaluator>) -> Self {
        self.script_evaluator = Some(evaluator);
        self
    }

    /// Installs a lookup client.
    #[must_use]
    pub fn with_lookup_client(mut self, client: Arc<dyn LookupClient>) -> Self {
        self.lookup_client = Some(client);
        self
    }

    /// The scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    /// The task executor.
    #[must_use]
    pub fn task_executor(&self) -> &Arc<dyn TaskExecutor> {
        &self.task_executor
    }

    /// The pipeline resolver.
    #[must_use]
    pub fn pipeline_resolver(&self) -> &Arc<dyn PipelineResolver> {
        &self.pipeline_resolver
    }

    /// The script evaluator, if one is installed.
    #[must_use]
    pub fn script_evaluator(&self) -> Option<&Arc<dyn ScriptEvaluator>> {
        self.script_evaluator.as_ref()
    }

    /// The lookup client, if one is installed.
    #[must_use]
    pub fn lookup_client(&self) -> Option<&Arc<dyn LookupClient>> {
        self.lookup_client.as_ref()
    }
}

impl fmt::Debug for RuntimeServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeServices")
            .field("script_evaluator", &self.script_evaluator.is_some())
            .field("lookup_client", &self.lookup_client.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::InMemoryPipelineStore;

    #[test]
    fn test_defaults_have_no_optional_services() {
        let services = RuntimeServices::new(Arc::new(InMemoryPipelineStore::new()));
        assert!(services.script_evaluator().is_none());
        assert!(services.lookup_client().is_none());
    }

    #[test]
    fn test_with_lookup_client_installs_client() {
        let services = RuntimeServices::new(Arc::new(InMemoryPipelineStore::new()))
            .with_lookup_client(Arc::new(StaticLookupClient::new()));
        assert!(services.lookup_client().is_some());
    }
}
