//! Discards the document without error.

use super::{Processor, ProcessorOutcome};
use crate::config::ProcessorConfig;
use crate::document::IngestDocument;
use crate::errors::{ConfigError, IngestError};
use crate::services::RuntimeServices;
use async_trait::async_trait;
use std::sync::Arc;

/// Signals that the document should be discarded.
///
/// Usually paired with a condition; an unconditional drop discards every
/// document that reaches it.
#[derive(Debug, Default)]
pub struct DropProcessor {
    tag: Option<String>,
    description: Option<String>,
}

impl DropProcessor {
    /// The registry type name.
    pub const TYPE: &'static str = "drop";

    /// Creates a drop processor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the instance tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Builds the processor from configuration. Takes no settings of its own.
    pub fn from_config(
        config: &mut ProcessorConfig,
        _services: &RuntimeServices,
    ) -> Result<Arc<dyn Processor>, ConfigError> {
        let mut processor = Self::new();
        processor.tag = config.tag().map(ToOwned::to_owned);
        processor.description = config.description().map(ToOwned::to_owned);
        Ok(Arc::new(processor))
    }
}

#[async_trait]
impl Processor for DropProcessor {
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
        Ok(ProcessorOutcome::Dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_discards_document() {
        let processor = DropProcessor::new();

        let outcome = processor.execute(IngestDocument::new()).unwrap();

        assert!(outcome.is_dropped());
    }
}
