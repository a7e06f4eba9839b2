//! Error types for the ingestflow engine.
//!
//! The taxonomy separates four concerns:
//! - configuration errors, raised while building processors and pipelines
//! - document errors, raised by field access on an ingest document
//! - processor errors, raised while a step runs and recoverable on-failure
//! - cycle and contract violations, which abort the execution outright

use serde_json::{Map, Value};
use thiserror::Error;

/// The main error type for ingestflow operations.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A processor or pipeline configuration was rejected.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A document field access failed.
    #[error("{0}")]
    Document(#[from] DocumentError),

    /// A processor failed while executing.
    #[error("{0}")]
    Processor(#[from] ProcessorError),

    /// A pipeline invoked itself, directly or transitively.
    #[error("{0}")]
    Cycle(#[from] CycleError),

    /// A processor broke the execution contract.
    #[error("{0}")]
    Contract(#[from] ContractViolationError),
}

impl IngestError {
    /// Whether an on-failure chain is allowed to handle this error.
    ///
    /// Cycle and contract violations are defects of the pipeline wiring, not
    /// of the document in flight; they bypass recovery chains and abort the
    /// execution.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Cycle(_) | Self::Contract(_))
    }
}

/// Errors raised while constructing processors or pipelines.
///
/// A configuration error stops registration; the pipeline never runs.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// No factory is registered under the requested type name.
    #[error("unknown processor type [{processor_type}]")]
    UnknownProcessorType {
        /// The unrecognized type name.
        processor_type: String,
    },

    /// A required configuration field was absent.
    #[error("[{processor_type}] required configuration field [{field}] is missing")]
    MissingField {
        /// The processor type being built.
        processor_type: String,
        /// The missing field name.
        field: String,
    },

    /// A configuration field had the wrong shape or an unusable value.
    #[error("[{processor_type}] configuration field [{field}] is invalid: {reason}")]
    InvalidValue {
        /// The processor type being built.
        processor_type: String,
        /// The offending field name.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A factory left configuration fields it does not recognize.
    #[error("[{processor_type}] unexpected configuration fields [{}]", fields.join(", "))]
    UnconsumedFields {
        /// The processor type being built.
        processor_type: String,
        /// The leftover field names.
        fields: Vec<String>,
    },

    /// A processor list entry was not an object with exactly one type key.
    #[error("malformed processor entry: {reason}")]
    MalformedEntry {
        /// Why the entry was rejected.
        reason: String,
    },

    /// A pipeline definition was structurally invalid.
    #[error("pipeline [{pipeline_id}] is invalid: {reason}")]
    InvalidPipeline {
        /// The pipeline being built.
        pipeline_id: String,
        /// Why the definition was rejected.
        reason: String,
    },

    /// A pipeline id could not be resolved.
    #[error("pipeline [{pipeline_id}] does not exist")]
    UnknownPipeline {
        /// The unresolvable pipeline id.
        pipeline_id: String,
    },
}

impl ConfigError {
    /// Creates an unknown processor type error.
    #[must_use]
    pub fn unknown_processor_type(processor_type: impl Into<String>) -> Self {
        Self::UnknownProcessorType {
            processor_type: processor_type.into(),
        }
    }

    /// Creates a missing field error.
    #[must_use]
    pub fn missing_field(processor_type: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            processor_type: processor_type.into(),
            field: field.into(),
        }
    }

    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(
        processor_type: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            processor_type: processor_type.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unconsumed fields error.
    #[must_use]
    pub fn unconsumed_fields(processor_type: impl Into<String>, fields: Vec<String>) -> Self {
        Self::UnconsumedFields {
            processor_type: processor_type.into(),
            fields,
        }
    }

    /// Creates a malformed entry error.
    #[must_use]
    pub fn malformed_entry(reason: impl Into<String>) -> Self {
        Self::MalformedEntry {
            reason: reason.into(),
        }
    }

    /// Creates an invalid pipeline error.
    #[must_use]
    pub fn invalid_pipeline(pipeline_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPipeline {
            pipeline_id: pipeline_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unknown pipeline error.
    #[must_use]
    pub fn unknown_pipeline(pipeline_id: impl Into<String>) -> Self {
        Self::UnknownPipeline {
            pipeline_id: pipeline_id.into(),
        }
    }
}

/// Errors raised by field access on an ingest document.
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    /// A read addressed a path that does not exist.
    #[error("field [{path}] not present in document")]
    FieldNotFound {
        /// The dotted path that was requested.
        path: String,
    },

    /// A traversal met a value that cannot contain the next segment.
    #[error("cannot resolve [{segment}] as part of path [{path}]: value is of type [{actual}]")]
    TypeConflict {
        /// The full dotted path being traversed.
        path: String,
        /// The segment that could not be resolved.
        segment: String,
        /// The type actually found at that point.
        actual: String,
    },

    /// A path string could not be parsed.
    #[error("path [{path}] is not valid: {reason}")]
    InvalidPath {
        /// The rejected path string.
        path: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl DocumentError {
    /// Creates a field not found error.
    #[must_use]
    pub fn field_not_found(path: impl Into<String>) -> Self {
        Self::FieldNotFound { path: path.into() }
    }

    /// Creates a type conflict error.
    #[must_use]
    pub fn type_conflict(
        path: impl Into<String>,
        segment: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::TypeConflict {
            path: path.into(),
            segment: segment.into(),
            actual: actual.into(),
        }
    }

    /// Creates an invalid path error.
    #[must_use]
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Error raised when a processor fails while executing against a document.
///
/// Carries the identity of the failing processor so recovery chains and logs
/// can report which step broke.
#[derive(Debug, Error)]
#[error("processor [{processor_type}] failed: {message}")]
pub struct ProcessorError {
    /// The type name of the failing processor.
    pub processor_type: String,
    /// The instance tag of the failing processor, if configured.
    pub tag: Option<String>,
    /// What went wrong.
    pub message: String,
    /// The underlying cause, when one exists.
    pub source: Option<anyhow::Error>,
}

impl ProcessorError {
    /// Creates a new processor error.
    #[must_use]
    pub fn new(processor_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            processor_type: processor_type.into(),
            tag: None,
            message: message.into(),
            source: None,
        }
    }

    /// Sets the instance tag of the failing processor.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Sets the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// The failure details recorded on the document envelope while an
    /// on-failure chain runs.
    #[must_use]
    pub fn failure_details(&self) -> Map<String, Value> {
        let mut details = Map::new();
        details.insert(
            crate::document::ON_FAILURE_MESSAGE_FIELD.to_string(),
            Value::String(self.message.clone()),
        );
        details.insert(
            crate::document::ON_FAILURE_PROCESSOR_TYPE_FIELD.to_string(),
            Value::String(self.processor_type.clone()),
        );
        if let Some(ref tag) = self.tag {
            details.insert(
                crate::document::ON_FAILURE_PROCESSOR_TAG_FIELD.to_string(),
                Value::String(tag.clone()),
            );
        }
        details
    }
}

/// Error raised when a pipeline invocation would re-enter a pipeline that is
/// already on the call stack.
#[derive(Debug, Clone, Error)]
#[error("cycle detected in pipeline calls: {}", cycle_path.join(" -> "))]
pub struct CycleError {
    /// The call stack plus the re-entered pipeline id.
    pub cycle_path: Vec<String>,
}

impl CycleError {
    /// Creates a new cycle error from the call stack and the pipeline whose
    /// invocation closed the loop.
    #[must_use]
    pub fn new(mut stack: Vec<String>, reentered: impl Into<String>) -> Self {
        stack.push(reentered.into());
        Self { cycle_path: stack }
    }
}

/// Error raised when a processor breaks the execution contract.
///
/// These are wiring defects rather than runtime conditions: the wrong execute
/// form was invoked, or an asynchronous processor abandoned its completion
/// handle. They are never handled by on-failure chains.
#[derive(Debug, Clone, Error)]
#[error("contract violation in processor [{processor_type}]: {message}")]
pub struct ContractViolationError {
    /// The type name of the offending processor.
    pub processor_type: String,
    /// The instance tag of the offending processor, if configured.
    pub tag: Option<String>,
    /// The violated rule.
    pub message: String,
}

impl ContractViolationError {
    /// Creates a new contract violation.
    #[must_use]
    pub fn new(processor_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            processor_type: processor_type.into(),
            tag: None,
            message: message.into(),
        }
    }

    /// Sets the instance tag of the offending processor.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// The synchronous execute form was invoked on an asynchronous processor.
    #[must_use]
    pub fn sync_called_on_async(processor_type: impl Into<String>) -> Self {
        Self::new(
            processor_type,
            "synchronous execute invoked on an asynchronous processor",
        )
    }

    /// The asynchronous execute form was invoked on a synchronous processor.
    #[must_use]
    pub fn async_called_on_sync(processor_type: impl Into<String>) -> Self {
        Self::new(
            processor_type,
            "asynchronous execute invoked on a synchronous processor",
        )
    }

    /// An asynchronous processor returned without resolving its completion.
    #[must_use]
    pub fn completion_dropped(processor_type: impl Into<String>) -> Self {
        Self::new(
            processor_type,
            "completion handle dropped without being resolved",
        )
    }
}
