//! Fails the document on purpose.

use super::{Processor, ProcessorOutcome};
use crate::config::ProcessorConfig;
use crate::document::IngestDocument;
use crate::errors::{ConfigError, IngestError, ProcessorError};
use crate::services::RuntimeServices;
use async_trait::async_trait;
use std::sync::Arc;

/// Raises a failure with a configured message.
///
/// Useful behind a condition to reject documents that violate an expectation,
/// letting the surrounding on-failure handling take over.
#[derive(Debug)]
pub struct FailProcessor {
    message: String,
    tag: Option<String>,
    description: Option<String>,
}

impl FailProcessor {
    /// The registry type name.
    pub const TYPE: &'static str = "fail";

    /// Creates a processor that always fails with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tag: None,
            description: None,
        }
    }

    /// Sets the instance tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Builds the processor from configuration, consuming `message`.
    pub fn from_config(
        config: &mut ProcessorConfig,
        _services: &RuntimeServices,
    ) -> Result<Arc<dyn Processor>, ConfigError> {
        let message = config.take_string("message")?;

        let mut processor = Self::new(message);
        processor.tag = config.tag().map(ToOwned::to_owned);
        processor.description = config.description().map(ToOwned::to_owned);
        Ok(Arc::new(processor))
    }
}

#[async_trait]
impl Processor for FailProcessor {
    fn processor_type(&self) -> &str {
        Self::TYPE
    }

    fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn execute(&self, _document: IngestDocument) -> Result<ProcessorOutcome, IngestError> {
        let mut failure = ProcessorError::new(Self::TYPE, self.message.clone());
        if let Some(tag) = &self.tag {
            failure = failure.with_tag(tag.as_str());
        }
        Err(failure.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_always_fails() {
        let processor = FailProcessor::new("unsupported event shape");

        let result = processor.execute(IngestDocument::new());

        match result {
            Err(IngestError::Processor(failure)) => {
                assert_eq!(failure.message, "unsupported event shape");
                assert_eq!(failure.processor_type, "fail");
            }
            other => panic!("expected processor failure, got {other:?}"),
        }
    }

    #[test]
    fn test_fail_carries_tag() {
        let processor = FailProcessor::new("nope").with_tag("guard");

        let result = processor.execute(IngestDocument::new());

        match result {
            Err(IngestError::Processor(failure)) => {
                assert_eq!(failure.tag.as_deref(), Some("guard"));
            }
            other => panic!("expected processor failure, got {other:?}"),
        }
    }
}
