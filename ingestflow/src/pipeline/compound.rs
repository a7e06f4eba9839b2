//! The compound step: one processor with a guard and a recovery chain.

use super::condition::{Condition, ScriptCondition};
use crate::config::ProcessorConfig;
use crate::errors::{ConfigError, IngestError, ProcessorError};
use crate::document::IngestDocument;
use crate::processors::{Completion, Processor, ProcessorOutcome, ProcessorRegistry};
use crate::services::RuntimeServices;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{Map, Value};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, warn};

/// A processor wrapped with an optional guard and an optional on-failure
/// recovery chain.
///
/// Per traversal, the wrapped step is skipped when the guard says so, run
/// otherwise, and on failure handed to the recovery path: `ignore_failure`
/// swallows the failure outright, an on-failure chain runs against the
/// document as it stood just before the failing step, and with neither the
/// failure propagates to the enclosing pipeline.
#[derive(Debug)]
pub struct CompoundProcessor {
    condition: Option<Arc<dyn Condition>>,
    processor: Arc<dyn Processor>,
    ignore_failure: bool,
    on_failure: Vec<CompoundProcessor>,
}

impl CompoundProcessor {
    /// Wraps a bare processor.
    #[must_use]
    pub fn new(processor: Arc<dyn Processor>) -> Self {
        Self {
            condition: None,
            processor,
            ignore_failure: false,
            on_failure: Vec::new(),
        }
    }

    /// Sets the guard condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Arc<dyn Condition>) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Sets whether failures of the wrapped step are swallowed.
    #[must_use]
    pub const fn with_ignore_failure(mut self, ignore_failure: bool) -> Self {
        self.ignore_failure = ignore_failure;
        self
    }

    /// Sets the on-failure recovery chain.
    #[must_use]
    pub fn with_on_failure(mut self, handlers: Vec<CompoundProcessor>) -> Self {
        self.on_failure = handlers;
        self
    }

    /// The wrapped processor.
    #[must_use]
    pub fn processor(&self) -> &dyn Processor {
        self.processor.as_ref()
    }

    /// Whether a failure of the wrapped step can be handled here.
    #[must_use]
    pub fn handles_failures(&self) -> bool {
        self.ignore_failure || !self.on_failure.is_empty()
    }

    /// Builds a compound step from one processor list entry.
    ///
    /// An entry is an object with exactly one key, the processor type, whose
    /// value holds the configuration fields. The common fields `tag`,
    /// `description`, `if`, `ignore_failure`, and `on_failure` are consumed
    /// here; everything else must be consumed by the factory, and leftovers
    /// fail construction.
    pub fn from_entry(
        entry: &Value,
        registry: &ProcessorRegistry,
        services: &RuntimeServices,
    ) -> Result<Self, ConfigError> {
        let (processor_type, fields) = entry_parts(entry)?;
        let mut config = ProcessorConfig::from_fields(processor_type, fields.clone())?;

        let condition = match config.take_string_opt("if")? {
            None => None,
            Some(source) => match services.script_evaluator() {
                Some(evaluator) => {
                    let script = ScriptCondition::new(source, Arc::clone(evaluator));
                    Some(Arc::new(script) as Arc<dyn Condition>)
                }
                None => {
                    return Err(ConfigError::invalid_value(
                        processor_type,
                        "if",
                        "no script evaluator configured",
                    ))
                }
            },
        };
        let ignore_failure = config.take_bool_or("ignore_failure", false)?;

        let on_failure = match config.take_list_opt("on_failure")? {
            None => Vec::new(),
            Some(entries) => {
                if entries.is_empty() {
                    return Err(ConfigError::invalid_value(
                        processor_type,
                        "on_failure",
                        "cannot be an empty list",
                    ));
                }
                entries
                    .iter()
                    .map(|handler| Self::from_entry(handler, registry, services))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        let processor = registry.create(&mut config, services)?;
        config.ensure_consumed()?;

        Ok(Self {
            condition,
            processor,
            ignore_failure,
            on_failure,
        })
    }

    /// Runs the compound step against a document.
    pub fn execute(
        &self,
        document: IngestDocument,
    ) -> BoxFuture<'_, Result<ProcessorOutcome, IngestError>> {
        async move {
            let document = match &self.condition {
                None => document,
                Some(condition) => match condition.evaluate(&document) {
                    Ok(true) => document,
                    Ok(false) => {
                        debug!(
                            processor_type = self.processor.processor_type(),
                            tag = self.processor.tag(),
                            "condition is false, skipping processor"
                        );
                        return Ok(ProcessorOutcome::Document(document));
                    }
                    Err(source) => {
                        let failure = self
                            .named_failure("condition evaluation failed")
                            .with_source(source);
                        // The step never ran, so the document is still in its
                        // pre-step state.
                        return self.recover(document, failure).await;
                    }
                },
            };

            let snapshot = if self.handles_failures() {
                Some(document.clone())
            } else {
                None
            };

            match self.run_processor(document).await {
                Ok(outcome) => Ok(outcome),
                Err(error) if !error.is_recoverable() => Err(error),
                Err(error) => {
                    let failure = self.step_failure(error);
                    match snapshot {
                        Some(snapshot) => self.recover(snapshot, failure).await,
                        None => Err(failure.into()),
                    }
                }
            }
        }
        .boxed()
    }

    /// Dispatches to whichever execute form the processor supports.
    async fn run_processor(
        &self,
        document: IngestDocument,
    ) -> Result<ProcessorOutcome, IngestError> {
        if self.processor.is_async() {
            let (completion, receiver) = Completion::pair();
            self.processor.execute_async(document, completion).await;
            receiver.outcome(self.processor.processor_type()).await
        } else {
            self.processor.execute(document)
        }
    }

    async fn recover(
        &self,
        document: IngestDocument,
        failure: ProcessorError,
    ) -> Result<ProcessorOutcome, IngestError> {
        if self.ignore_failure {
            debug!(
                processor_type = %failure.processor_type,
                error = %failure,
                "processor failed, failure ignored"
            );
            return Ok(ProcessorOutcome::Document(document));
        }
        if self.on_failure.is_empty() {
            return Err(failure.into());
        }

        warn!(
            processor_type = %failure.processor_type,
            error = %failure,
            "processor failed, running on-failure chain"
        );
        let mut document = document;
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

    /// Normalizes a step error into a processor failure carrying the step's
    /// identity.
    fn step_failure(&self, error: IngestError) -> ProcessorError {
        match error {
            IngestError::Processor(mut failure) => {
                if failure.tag.is_none() {
                    if let Some(tag) = self.processor.tag() {
                        failure = failure.with_tag(tag);
                    }
                }
                failure
            }
            other => {
                let message = other.to_string();
                self.named_failure(message)
                    .with_source(anyhow::Error::new(other))
            }
        }
    }

    fn named_failure(&self, message: impl Into<String>) -> ProcessorError {
        let mut failure = ProcessorError::new(self.processor.processor_type(), message);
        if let Some(tag) = self.processor.tag() {
            failure = failure.with_tag(tag);
        }
        failure
    }
}

fn entry_parts(entry: &Value) -> Result<(&str, &Map<String, Value>), ConfigError> {
    let entry = entry.as_object().ok_or_else(|| {
        ConfigError::malformed_entry("entry must be an object with a single processor type key")
    })?;
    if entry.len() != 1 {
        return Err(ConfigError::malformed_entry(format!(
            "expected a single processor type key, found {}",
            entry.len()
        )));
    }
    let (processor_type, fields) = match entry.iter().next() {
        Some(parts) => parts,
        None => {
            return Err(ConfigError::malformed_entry(
                "expected a single processor type key, found none",
            ))
        }
    };
    let fields = fields.as_object().ok_or_else(|| {
        ConfigError::malformed_entry(format!(
            "configuration for processor [{processor_type}] must be an object"
        ))
    })?;
    Ok((processor_type, fields))
}
