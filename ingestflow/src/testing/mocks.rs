//! Mock processors and services for testing.

use crate::document::IngestDocument;
use crate::errors::{IngestError, ProcessorError};
use crate::processors::{Completion, Processor, ProcessorOutcome};
use crate::services::ScriptEvaluator;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A processor that records each execution and passes the document through.
///
/// Several instances can share one log to observe cross-step ordering.
#[derive(Debug)]
pub struct RecordingProcessor {
    label: String,
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingProcessor {
    /// Creates a recording processor with its own log.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_log(label, Arc::new(Mutex::new(Vec::new())))
    }

    /// Creates a recording processor appending to a shared log.
    #[must_use]
    pub fn with_log(label: impl Into<String>, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            label: label.into(),
            log,
        }
    }

    /// Creates an empty log to share between instances.
    #[must_use]
    pub fn shared_log() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    /// The number of times this instance ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.log
            .lock()
            .iter()
            .filter(|entry| **entry == self.label)
            .count()
    }

    /// The recorded labels, in execution order.
    #[must_use]
    pub fn recorded(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

#[async_trait]
impl Processor for RecordingProcessor {
    fn processor_type(&self) -> &str {
        "record"
    }

    fn tag(&self) -> Option<&str> {
        Some(&self.label)
    }

    fn execute(&self, document: IngestDocument) -> Result<ProcessorOutcome, IngestError> {
        self.log.lock().push(self.label.clone());
        Ok(ProcessorOutcome::Document(document))
    }
}

/// A processor that always fails.
#[derive(Debug)]
pub struct FailingProcessor {
    message: String,
    tag: Option<String>,
}

impl FailingProcessor {
    /// Creates a processor failing with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tag: None,
        }
    }

    /// Sets the instance tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

#[async_trait]
impl Processor for FailingProcessor {
    fn processor_type(&self) -> &str {
        "failing"
    }

    fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    fn execute(&self, _document: IngestDocument) -> Result<ProcessorOutcome, IngestError> {
        let mut failure = ProcessorError::new("failing", self.message.clone());
        if let Some(tag) = &self.tag {
            failure = failure.with_tag(tag.as_str());
        }
        Err(failure.into())
    }
}

/// An asynchronous processor that resolves its completion from a spawned task
/// after a delay.
#[derive(Debug)]
pub struct SlowAsyncProcessor {
    delay: Duration,
}

impl SlowAsyncProcessor {
    /// Creates a processor that takes `delay` to finish.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Creates a processor with the delay in milliseconds.
    #[must_use]
    pub const fn with_delay_ms(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

#[async_trait]
impl Processor for SlowAsyncProcessor {
    fn processor_type(&self) -> &str {
        "slow"
    }

    fn is_async(&self) -> bool {
        true
    }

    async fn execute_async(&self, document: IngestDocument, completion: Completion) {
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            completion.document(document);
        });
    }
}

/// An asynchronous processor that abandons its completion without resolving
/// it, which the execution surfaces as a contract violation.
#[derive(Debug, Default)]
pub struct NeverResolvingProcessor;

impl NeverResolvingProcessor {
    /// Creates the processor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Processor for NeverResolvingProcessor {
    fn processor_type(&self) -> &str {
        "never"
    }

    fn is_async(&self) -> bool {
        true
    }

    async fn execute_async(&self, _document: IngestDocument, completion: Completion) {
        drop(completion);
    }
}

/// A script evaluator over a tiny fixed expression language.
///
/// Supported sources: `true`, `false`, `has:<path>`, and `eq:<path>:<json>`.
/// Anything else evaluates to an error.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockScriptEvaluator;

impl MockScriptEvaluator {
    /// Creates the evaluator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ScriptEvaluator for MockScriptEvaluator {
    fn evaluate_condition(&self, source: &str, document: &IngestDocument) -> anyhow::Result<bool> {
        if source == "true" {
            return Ok(true);
        }
        if source == "false" {
            return Ok(false);
        }
        if let Some(path) = source.strip_prefix("has:") {
            return Ok(document.has(path));
        }
        if let Some(rest) = source.strip_prefix("eq:") {
            if let Some((path, expected)) = rest.split_once(':') {
                let expected: Value = serde_json::from_str(expected)?;
                return Ok(document.get(path).is_ok_and(|value| value == &expected));
            }
        }
        anyhow::bail!("unsupported condition [{source}]")
    }
}
