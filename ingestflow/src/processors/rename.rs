//! Moves a field to a new path.

use super::{Processor, ProcessorOutcome};
use crate::config::ProcessorConfig;
use crate::document::IngestDocument;
use crate::errors::{ConfigError, DocumentError, IngestError, ProcessorError};
use crate::services::RuntimeServices;
use async_trait::async_trait;
use std::sync::Arc;

/// Renames a field, failing when the source is absent or the target already
/// exists.
#[derive(Debug)]
pub struct RenameProcessor {
    field: String,
    target_field: String,
    ignore_missing: bool,
    tag: Option<String>,
    description: Option<String>,
}

impl RenameProcessor {
    /// The registry type name.
    pub const TYPE: &'static str = "rename";

    /// Creates a processor that moves `field` to `target_field`.
    pub fn new(field: impl Into<String>, target_field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            target_field: target_field.into(),
            ignore_missing: false,
            tag: None,
            description: None,
        }
    }

    /// Controls whether an absent source field is tolerated.
    #[must_use]
    pub const fn with_ignore_missing(mut self, ignore_missing: bool) -> Self {
        self.ignore_missing = ignore_missing;
        self
    }

    /// Sets the instance tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Builds the processor from configuration, consuming `field`,
    /// `target_field`, and the optional `ignore_missing` flag.
    pub fn from_config(
        config: &mut ProcessorConfig,
        _services: &RuntimeServices,
    ) -> Result<Arc<dyn Processor>, ConfigError> {
        let field = config.take_string("field")?;
        let target_field = config.take_string("target_field")?;
        let ignore_missing = config.take_bool_or("ignore_missing", false)?;

        let mut processor = Self::new(field, target_field).with_ignore_missing(ignore_missing);
        processor.tag = config.tag().map(ToOwned::to_owned);
        processor.description = config.description().map(ToOwned::to_owned);
        Ok(Arc::new(processor))
    }
}

#[async_trait]
impl Processor for RenameProcessor {
    fn processor_type(&self) -> &str {
        Self::TYPE
    }

    fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn execute(&self, mut document: IngestDocument) -> Result<ProcessorOutcome, IngestError> {
        if !document.has(&self.field) {
            if self.ignore_missing {
                return Ok(ProcessorOutcome::Document(document));
            }
            return Err(DocumentError::field_not_found(&self.field).into());
        }
        if document.has(&self.target_field) {
            return Err(ProcessorError::new(
                Self::TYPE,
                format!("field [{}] already exists", self.target_field),
            )
            .into());
        }

        let value = document.remove(&self.field)?;
        document.set(&self.target_field, value)?;
        Ok(ProcessorOutcome::Document(document))
    }
}
