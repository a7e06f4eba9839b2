//! Processor trait and implementations.
//!
//! Processors are the fundamental units of document transformation. A
//! processor either completes synchronously through [`Processor::execute`],
//! or asynchronously through [`Processor::execute_async`] by resolving a
//! single-fire [`Completion`]; the [`Processor::is_async`] flag says which
//! form the implementation supports.

mod append;
mod case;
mod completion;
mod drop;
mod enrich;
mod fail;
mod gsub;
mod pipeline;
mod registry;
mod remove;
mod rename;
mod set;

pub use append::AppendProcessor;
pub use case::{CaseProcessor, CaseTransform};
pub use completion::{Completion, CompletionReceiver};
pub use drop::DropProcessor;
pub use enrich::EnrichProcessor;
pub use fail::FailProcessor;
pub use gsub::GsubProcessor;
pub use pipeline::PipelineProcessor;
pub use registry::{ProcessorFactory, ProcessorRegistry};
pub use remove::RemoveProcessor;
pub use rename::RenameProcessor;
pub use set::SetProcessor;

use crate::document::IngestDocument;
use crate::errors::{ContractViolationError, IngestError};
use async_trait::async_trait;
use std::fmt::Debug;

/// The result of one processor run.
#[derive(Debug)]
pub enum ProcessorOutcome {
    /// The document, possibly mutated, to hand to the next step.
    Document(IngestDocument),
    /// The document should be discarded without error.
    Dropped,
}

impl ProcessorOutcome {
    /// Whether this outcome is the drop signal.
    #[must_use]
    pub const fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped)
    }

    /// Returns the forwarded document, if any.
    #[must_use]
    pub fn into_document(self) -> Option<IngestDocument> {
        match self {
            Self::Document(document) => Some(document),
            Self::Dropped => None,
        }
    }
}

/// Trait for pipeline processors.
///
/// A processor receives ownership of the document, transforms it, and either
/// forwards it, signals a drop, or fails. Implementations override exactly
/// one execute form and report it through [`is_async`](Self::is_async):
///
/// - Synchronous processors override [`execute`](Self::execute). The call
///   must not block on I/O; long work belongs behind the asynchronous form.
/// - Asynchronous processors override [`execute_async`](Self::execute_async)
///   and resolve the completion exactly once, from whatever task finishes
///   the work.
///
/// Calling the form an implementation does not support fails with a
/// [`ContractViolationError`] rather than silently doing nothing. Processor
/// instances are shared between concurrent executions and must be safe to
/// invoke from several tasks at once.
#[async_trait]
pub trait Processor: Send + Sync + Debug {
    /// The type name this processor is registered under.
    fn processor_type(&self) -> &str;

    /// The instance tag distinguishing this occurrence, if configured.
    fn tag(&self) -> Option<&str> {
        None
    }

    /// The human-readable description, if configured.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Whether this processor completes through the asynchronous form.
    fn is_async(&self) -> bool {
        false
    }

    /// Executes the processor synchronously.
    fn execute(&self, _document: IngestDocument) -> Result<ProcessorOutcome, IngestError> {
        Err(ContractViolationError::sync_called_on_async(self.processor_type()).into())
    }

    /// Executes the processor asynchronously, resolving `completion` exactly
    /// once when the work finishes.
    async fn execute_async(&self, _document: IngestDocument, completion: Completion) {
        completion.failure(ContractViolationError::async_called_on_sync(self.processor_type()));
    }
}

/// A simple function-based synchronous processor.
pub struct FnProcessor<F>
where
    F: Fn(IngestDocument) -> Result<ProcessorOutcome, IngestError> + Send + Sync,
{
    processor_type: String,
    tag: Option<String>,
    func: F,
}

impl<F> FnProcessor<F>
where
    F: Fn(IngestDocument) -> Result<ProcessorOutcome, IngestError> + Send + Sync,
{
    /// Creates a new function-based processor.
    pub fn new(processor_type: impl Into<String>, func: F) -> Self {
        Self {
            processor_type: processor_type.into(),
            tag: None,
            func,
        }
    }

    /// Sets the instance tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

impl<F> Debug for FnProcessor<F>
where
    F: Fn(IngestDocument) -> Result<ProcessorOutcome, IngestError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnProcessor")
            .field("processor_type", &self.processor_type)
            .field("tag", &self.tag)
            .finish()
    }
}

#[async_trait]
impl<F> Processor for FnProcessor<F>
where
    F: Fn(IngestDocument) -> Result<ProcessorOutcome, IngestError> + Send + Sync,
{
    fn processor_type(&self) -> &str {
        &self.processor_type
    }

    fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    fn execute(&self, document: IngestDocument) -> Result<ProcessorOutcome, IngestError> {
        (self.func)(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct BareProcessor;

    #[async_trait]
    impl Processor for BareProcessor {
        fn processor_type(&self) -> &str {
            "bare"
        }
    }

    #[test]
    fn test_fn_processor() {
        let processor = FnProcessor::new("touch", |mut document: IngestDocument| {
            document.set("touched", true)?;
            Ok(ProcessorOutcome::Document(document))
        })
        .with_tag("t1");

        assert_eq!(processor.processor_type(), "touch");
        assert_eq!(processor.tag(), Some("t1"));
        assert!(!processor.is_async());

        let outcome = processor.execute(IngestDocument::new()).unwrap();
        let document = outcome.into_document().unwrap();
        assert_eq!(document.get("touched").unwrap(), &json!(true));
    }

    #[test]
    fn test_default_sync_form_is_a_violation() {
        #[derive(Debug)]
        struct AsyncOnly;

        #[async_trait]
        impl Processor for AsyncOnly {
            fn processor_type(&self) -> &str {
                "async_only"
            }

            fn is_async(&self) -> bool {
                true
            }

            async fn execute_async(&self, document: IngestDocument, completion: Completion) {
                completion.document(document);
            }
        }

        let err = AsyncOnly.execute(IngestDocument::new()).unwrap_err();
        assert!(matches!(err, IngestError::Contract(_)));
    }

    #[tokio::test]
    async fn test_default_async_form_is_a_violation() {
        let (completion, receiver) = Completion::pair();
        BareProcessor
            .execute_async(IngestDocument::new(), completion)
            .await;

        let err = receiver.outcome("bare").await.unwrap_err();
        assert!(matches!(err, IngestError::Contract(_)));
    }

    #[test]
    fn test_outcome_helpers() {
        let document_outcome = ProcessorOutcome::Document(IngestDocument::new());
        assert!(!document_outcome.is_dropped());
        assert!(document_outcome.into_document().is_some());

        let dropped = ProcessorOutcome::Dropped;
        assert!(dropped.is_dropped());
        assert!(dropped.into_document().is_none());
    }
}
