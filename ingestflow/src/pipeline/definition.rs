//! Pipeline definitions and their execution walk.

use super::compound::CompoundProcessor;
use crate::errors::{ConfigError, IngestError, ProcessorError};
use crate::document::IngestDocument;
use crate::processors::{ProcessorOutcome, ProcessorRegistry};
use crate::services::RuntimeServices;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// An ordered sequence of compound steps, with an optional pipeline-level
/// on-failure chain.
///
/// Pipelines are built once, immutable afterwards, and shared between
/// executions. Entering a pipeline pushes its id onto the document's call
/// stack; a pipeline already on the stack cannot be entered again.
#[derive(Debug)]
pub struct Pipeline {
    id: String,
    description: Option<String>,
    version: Option<i64>,
    processors: Vec<CompoundProcessor>,
    on_failure: Vec<CompoundProcessor>,
}

impl Pipeline {
    /// Creates an empty pipeline with the given id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            version: None,
            processors: Vec::new(),
            on_failure: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the version.
    #[must_use]
    pub const fn with_version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }

    /// Appends a compound step.
    #[must_use]
    pub fn with_processor(mut self, processor: CompoundProcessor) -> Self {
        self.processors.push(processor);
        self
    }

    /// Sets the pipeline-level on-failure chain.
    #[must_use]
    pub fn with_on_failure(mut self, handlers: Vec<CompoundProcessor>) -> Self {
        self.on_failure = handlers;
        self
    }

    /// Builds a pipeline from its configuration map.
    ///
    /// The map holds `processors` (required list of processor entries) plus
    /// optional `description`, `version`, and `on_failure`; anything else is
    /// rejected.
    pub fn from_config(
        id: impl Into<String>,
        mut config: Map<String, Value>,
        registry: &ProcessorRegistry,
        services: &RuntimeServices,
    ) -> Result<Self, ConfigError> {
        let id = id.into();

        let description = match config.remove("description") {
            None => None,
            Some(Value::String(description)) => Some(description),
            Some(_) => {
                return Err(ConfigError::invalid_pipeline(
                    id,
                    "[description] must be a string",
                ))
            }
        };
        let version = match config.remove("version") {
            None => None,
            Some(value) => match value.as_i64() {
                Some(version) => Some(version),
                None => {
                    return Err(ConfigError::invalid_pipeline(
                        id,
                        "[version] must be an integer",
                    ))
                }
            },
        };

        let processor_entries = match config.remove("processors") {
            None => {
                return Err(ConfigError::invalid_pipeline(
                    id,
                    "required field [processors] is missing",
                ))
            }
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(ConfigError::invalid_pipeline(
                    id,
                    "[processors] must be a list",
                ))
            }
        };
        let processors = processor_entries
            .iter()
            .map(|entry| CompoundProcessor::from_entry(entry, registry, services))
            .collect::<Result<Vec<_>, _>>()?;

        let on_failure = match config.remove("on_failure") {
            None => Vec::new(),
            Some(Value::Array(entries)) => {
                if entries.is_empty() {
                    return Err(ConfigError::invalid_pipeline(
                        id,
                        "[on_failure] cannot be an empty list",
                    ));
                }
                entries
                    .iter()
                    .map(|entry| CompoundProcessor::from_entry(entry, registry, services))
                    .collect::<Result<Vec<_>, _>>()?
            }
            Some(_) => {
                return Err(ConfigError::invalid_pipeline(
                    id,
                    "[on_failure] must be a list",
                ))
            }
        };

        if !config.is_empty() {
            let fields: Vec<String> = config.keys().cloned().collect();
            return Err(ConfigError::invalid_pipeline(
                id,
                format!("unexpected fields [{}]", fields.join(", ")),
            ));
        }

        Ok(Self {
            id,
            description,
            version,
            processors,
            on_failure,
        })
    }

    /// The pipeline id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The version, if any.
    #[must_use]
    pub const fn version(&self) -> Option<i64> {
        self.version
    }

    /// The compound steps, in execution order.
    #[must_use]
    pub fn processors(&self) -> &[CompoundProcessor] {
        &self.processors
    }

    /// The number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.processors.len()
    }

    /// Whether the pipeline has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Runs the pipeline against a document.
    ///
    /// The pipeline id is pushed onto the document's call stack for the
    /// duration of the run; re-entering a pipeline already on the stack fails
    /// with a cycle error before any step runs.
    pub async fn execute(
        &self,
        mut document: IngestDocument,
    ) -> Result<ProcessorOutcome, IngestError> {
        document.metadata_mut().enter_pipeline(&self.id)?;
        debug!(pipeline_id = %self.id, steps = self.processors.len(), "entering pipeline");

        match self.run_steps(document).await? {
            ProcessorOutcome::Document(mut document) => {
                document.metadata_mut().exit_pipeline();
                Ok(ProcessorOutcome::Document(document))
            }
            ProcessorOutcome::Dropped => Ok(ProcessorOutcome::Dropped),
        }
    }

    async fn run_steps(
        &self,
        document: IngestDocument,
    ) -> Result<ProcessorOutcome, IngestError> {
        let mut current = document;
        for (index, step) in self.processors.iter().enumerate() {
            debug!(
                pipeline_id = %self.id,
                step = index,
                processor_type = step.processor().processor_type(),
                "running processor"
            );

            // Kept only while a pipeline-level chain exists to replay onto.
            let snapshot = if self.on_failure.is_empty() {
                None
            } else {
                Some(current.clone())
            };

            match step.execute(current).await {
                Ok(ProcessorOutcome::Document(next)) => current = next,
                Ok(ProcessorOutcome::Dropped) => return Ok(ProcessorOutcome::Dropped),
                Err(error) if !error.is_recoverable() => return Err(error),
                Err(IngestError::Processor(failure)) => {
                    return match snapshot {
                        Some(snapshot) => self.run_failure_chain(snapshot, failure).await,
                        None => Err(failure.into()),
                    };
                }
                Err(error) => return Err(error),
            }
        }
        Ok(ProcessorOutcome::Document(current))
    }

    /// Runs the pipeline-level recovery chain.
    ///
    /// When the chain completes, its output is the outcome of the whole
    /// pipeline; the steps after the failure point do not run.
    async fn run_failure_chain(
        &self,
        mut document: IngestDocument,
        failure: ProcessorError,
    ) -> Result<ProcessorOutcome, IngestError> {
        warn!(
            pipeline_id = %self.id,
            error = %failure,
            "step failed, running pipeline on-failure chain"
        );
        document
            .metadata_mut()
            .set_failure_details(failure.failure_details());

        let mut current = document;
        for handler in &self.on_failure {
            match handler.execute(current).await? {
                ProcessorOutcome::Document(next) => current = next,
                ProcessorOutcome::Dropped => return Ok(ProcessorOutcome::Dropped),
            }
        }
        current.metadata_mut().clear_failure_details();
        Ok(ProcessorOutcome::Document(current))
    }
}
