//! Invokes another pipeline as a single step.

use super::{Completion, Processor, ProcessorOutcome};
use crate::config::ProcessorConfig;
use crate::document::IngestDocument;
use crate::errors::{ConfigError, ProcessorError};
use crate::pipeline::PipelineResolver;
use crate::services::RuntimeServices;
use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Runs the named pipeline against the document.
///
/// The target is looked up at execution time, so the step always sees the
/// registered pipeline current at that moment. The document's call stack
/// rejects re-entering a pipeline that is already running, which turns
/// mutually recursive pipeline configurations into cycle errors instead of
/// unbounded recursion.
pub struct PipelineProcessor {
    pipeline_id: String,
    resolver: Weak<dyn PipelineResolver>,
    ignore_missing_pipeline: bool,
    tag: Option<String>,
    description: Option<String>,
}

impl PipelineProcessor {
    /// The registry type name.
    pub const TYPE: &'static str = "pipeline";

    /// Creates a processor that invokes `pipeline_id` through `resolver`.
    pub fn new(pipeline_id: impl Into<String>, resolver: Weak<dyn PipelineResolver>) -> Self {
        Self {
            pipeline_id: pipeline_id.into(),
            resolver,
            ignore_missing_pipeline: false,
            tag: None,
            description: None,
        }
    }

    /// Controls whether a missing target pipeline is tolerated.
    #[must_use]
    pub const fn with_ignore_missing_pipeline(mut self, ignore_missing_pipeline: bool) -> Self {
        self.ignore_missing_pipeline = ignore_missing_pipeline;
        self
    }

    /// Sets the instance tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Builds the processor from configuration, consuming `name` and the
    /// optional `ignore_missing_pipeline` flag.
    pub fn from_config(
        config: &mut ProcessorConfig,
        services: &RuntimeServices,
    ) -> Result<Arc<dyn Processor>, ConfigError> {
        let pipeline_id = config.take_string("name")?;
        let ignore_missing_pipeline = config.take_bool_or("ignore_missing_pipeline", false)?;

        let mut processor = Self::new(pipeline_id, Arc::downgrade(services.pipeline_resolver()))
            .with_ignore_missing_pipeline(ignore_missing_pipeline);
        processor.tag = config.tag().map(ToOwned::to_owned);
        processor.description = config.description().map(ToOwned::to_owned);
        Ok(Arc::new(processor))
    }

    fn failure(&self, message: impl Into<String>) -> ProcessorError {
        let mut failure = ProcessorError::new(Self::TYPE, message);
        if let Some(tag) = &self.tag {
            failure = failure.with_tag(tag.as_str());
        }
        failure
    }
}

impl fmt::Debug for PipelineProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineProcessor")
            .field("pipeline_id", &self.pipeline_id)
            .field("ignore_missing_pipeline", &self.ignore_missing_pipeline)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Processor for PipelineProcessor {
    fn processor_type(&self) -> &str {
        Self::TYPE
    }

    fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn is_async(&self) -> bool {
        true
    }

    async fn execute_async(&self, document: IngestDocument, completion: Completion) {
        let resolver = match self.resolver.upgrade() {
            Some(resolver) => resolver,
            None => {
                completion.failure(self.failure("pipeline store is no longer available"));
                return;
            }
        };

        let pipeline = match resolver.resolve(&self.pipeline_id) {
            Some(pipeline) => pipeline,
            None => {
                if self.ignore_missing_pipeline {
                    debug!(pipeline_id = %self.pipeline_id, "target pipeline missing, passing document through");
                    completion.document(document);
                } else {
                    completion.failure(
                        self.failure(format!("pipeline [{}] does not exist", self.pipeline_id)),
                    );
                }
                return;
            }
        };

        match pipeline.execute(document).await {
            Ok(ProcessorOutcome::Document(document)) => completion.document(document),
            Ok(ProcessorOutcome::Dropped) => completion.dropped(),
            Err(error) => completion.failure(error),
        }
    }
}
