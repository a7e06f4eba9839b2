//! Single-fire completion handles for asynchronous processors.
//!
//! A [`Completion`] is the only way an asynchronous processor can report its
//! outcome. Resolving consumes the handle, so a second invocation is
//! impossible by construction; dropping the handle without resolving it is
//! detected on the receiving side and surfaced as a contract violation.

use super::ProcessorOutcome;
use crate::document::IngestDocument;
use crate::errors::{ContractViolationError, IngestError};
use tokio::sync::oneshot;

type CompletionResult = Result<ProcessorOutcome, IngestError>;

/// The write side of a completion, handed to an asynchronous processor.
#[derive(Debug)]
pub struct Completion {
    sender: oneshot::Sender<CompletionResult>,
}

impl Completion {
    /// Creates a connected completion pair.
    #[must_use]
    pub fn pair() -> (Self, CompletionReceiver) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, CompletionReceiver { receiver })
    }

    /// Resolves the completion with a full result.
    pub fn resolve(self, result: CompletionResult) {
        // The receiver only disappears when the execution was abandoned;
        // there is nobody left to care about the outcome.
        let _ = self.sender.send(result);
    }

    /// Resolves the completion with a forwarded document.
    pub fn document(self, document: IngestDocument) {
        self.resolve(Ok(ProcessorOutcome::Document(document)));
    }

    /// Resolves the completion with the drop signal.
    pub fn dropped(self) {
        self.resolve(Ok(ProcessorOutcome::Dropped));
    }

    /// Resolves the completion with a failure.
    pub fn failure(self, error: impl Into<IngestError>) {
        self.resolve(Err(error.into()));
    }
}

/// The read side of a completion, awaited by the execution walk.
#[derive(Debug)]
pub struct CompletionReceiver {
    receiver: oneshot::Receiver<CompletionResult>,
}

impl CompletionReceiver {
    /// Waits for the processor to resolve its completion.
    ///
    /// A handle that was dropped unresolved yields a
    /// [`ContractViolationError`] naming the offending processor.
    pub async fn outcome(self, processor_type: &str) -> CompletionResult {
        match self.receiver.await {
            Ok(result) => result,
            Err(_) => Err(ContractViolationError::completion_dropped(processor_type).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_resolve_with_document() {
        let (completion, receiver) = Completion::pair();
        let mut document = IngestDocument::new();
        document.set("done", true).unwrap();
        completion.document(document);

        let outcome = receiver.outcome("test").await.unwrap();
        let document = outcome.into_document().unwrap();
        assert_eq!(document.get("done").unwrap(), &json!(true));
    }

    #[tokio::test]
    async fn test_resolve_with_drop_signal() {
        let (completion, receiver) = Completion::pair();
        completion.dropped();

        let outcome = receiver.outcome("test").await.unwrap();
        assert!(outcome.is_dropped());
    }

    #[tokio::test]
    async fn test_resolve_with_failure() {
        let (completion, receiver) = Completion::pair();
        completion.failure(crate::errors::ProcessorError::new("test", "boom"));

        let err = receiver.outcome("test").await.unwrap_err();
        assert!(matches!(err, IngestError::Processor(_)));
    }

    #[tokio::test]
    async fn test_unresolved_completion_is_a_violation() {
        let (completion, receiver) = Completion::pair();
        drop(completion);

        let err = receiver.outcome("enrich").await.unwrap_err();
        match err {
            IngestError::Contract(violation) => {
                assert_eq!(violation.processor_type, "enrich");
                assert!(violation.message.contains("without being resolved"));
            }
            other => panic!("expected a contract violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_from_spawned_task() {
        let (completion, receiver) = Completion::pair();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            completion.document(IngestDocument::new());
        });

        assert!(receiver.outcome("test").await.is_ok());
    }

    #[tokio::test]
    async fn test_resolve_after_receiver_gone_is_silent() {
        let (completion, receiver) = Completion::pair();
        drop(receiver);
        // Must not panic.
        completion.document(IngestDocument::new());
    }
}
