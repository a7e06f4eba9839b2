//! Regex find-and-replace on a string field.

use super::{Processor, ProcessorOutcome};
use crate::config::ProcessorConfig;
use crate::document::IngestDocument;
use crate::errors::{ConfigError, DocumentError, IngestError};
use crate::services::RuntimeServices;
use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;

/// Replaces every match of a pattern in a string field.
///
/// The pattern is compiled once when the processor is built; `$1`-style group
/// references in the replacement are expanded per match.
#[derive(Debug)]
pub struct GsubProcessor {
    field: String,
    pattern: Regex,
    replacement: String,
    target_field: Option<String>,
    ignore_missing: bool,
    tag: Option<String>,
    description: Option<String>,
}

impl GsubProcessor {
    /// The registry type name.
    pub const TYPE: &'static str = "gsub";

    /// Creates a processor replacing matches of `pattern` in `field` with
    /// `replacement`.
    pub fn new(field: impl Into<String>, pattern: Regex, replacement: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            pattern,
            replacement: replacement.into(),
            target_field: None,
            ignore_missing: false,
            tag: None,
            description: None,
        }
    }

    /// Writes the result to a different field.
    #[must_use]
    pub fn with_target_field(mut self, target_field: impl Into<String>) -> Self {
        self.target_field = Some(target_field.into());
        self
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

    /// Builds the processor from configuration. The `pattern` field must be a
    /// valid regular expression; compilation failures are configuration
    /// errors.
    pub fn from_config(
        config: &mut ProcessorConfig,
        _services: &RuntimeServices,
    ) -> Result<Arc<dyn Processor>, ConfigError> {
        let field = config.take_string("field")?;
        let pattern = config.take_string("pattern")?;
        let replacement = config.take_string("replacement")?;
        let target_field = config.take_string_opt("target_field")?;
        let ignore_missing = config.take_bool_or("ignore_missing", false)?;

        let pattern = Regex::new(&pattern).map_err(|error| {
            ConfigError::invalid_value(Self::TYPE, "pattern", error.to_string())
        })?;

        let mut processor =
            Self::new(field, pattern, replacement).with_ignore_missing(ignore_missing);
        processor.target_field = target_field;
        processor.tag = config.tag().map(ToOwned::to_owned);
        processor.description = config.description().map(ToOwned::to_owned);
        Ok(Arc::new(processor))
    }
}

#[async_trait]
impl Processor for GsubProcessor {
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
        let replaced = match document.get_str(&self.field) {
            Ok(value) => self
                .pattern
                .replace_all(value, self.replacement.as_str())
                .into_owned(),
            Err(DocumentError::FieldNotFound { .. }) if self.ignore_missing => {
                return Ok(ProcessorOutcome::Document(document))
            }
            Err(error) => return Err(error.into()),
        };
        let target = self.target_field.as_deref().unwrap_or(&self.field);
        document.set(target, replaced)?;
        Ok(ProcessorOutcome::Document(document))
    }
}
