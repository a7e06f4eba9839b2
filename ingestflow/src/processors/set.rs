//! Sets a field to a configured value.

use super::{Processor, ProcessorOutcome};
use crate::config::ProcessorConfig;
use crate::document::IngestDocument;
use crate::errors::{ConfigError, IngestError};
use crate::services::RuntimeServices;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Writes a fixed value to a field, creating intermediate objects as needed.
///
/// With `override` disabled the processor leaves fields that already hold a
/// non-null value untouched.
#[derive(Debug)]
pub struct SetProcessor {
    field: String,
    value: Value,
    override_existing: bool,
    tag: Option<String>,
    description: Option<String>,
}

impl SetProcessor {
    /// The registry type name.
    pub const TYPE: &'static str = "set";

    /// Creates a processor that writes `value` to `field`, overriding any
    /// existing value.
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            override_existing: true,
            tag: None,
            description: None,
        }
    }

    /// Controls whether an existing non-null value is replaced.
    #[must_use]
    pub const fn with_override(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    /// Sets the instance tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Builds the processor from configuration, consuming `field`, `value`,
    /// and the optional `override` flag.
    pub fn from_config(
        config: &mut ProcessorConfig,
        _services: &RuntimeServices,
    ) -> Result<Arc<dyn Processor>, ConfigError> {
        let field = config.take_string("field")?;
        let value = config.take_value("value")?;
        let override_existing = config.take_bool_or("override", true)?;

        let mut processor = Self::new(field, value).with_override(override_existing);
        processor.tag = config.tag().map(ToOwned::to_owned);
        processor.description = config.description().map(ToOwned::to_owned);
        Ok(Arc::new(processor))
    }
}

#[async_trait]
impl Processor for SetProcessor {
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
        let occupied = document
            .get(&self.field)
            .is_ok_and(|value| !value.is_null());
        if self.override_existing || !occupied {
            document.set(&self.field, self.value.clone())?;
        }
        Ok(ProcessorOutcome::Document(document))
    }
}
