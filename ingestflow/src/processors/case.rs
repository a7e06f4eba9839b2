//! Uppercases or lowercases a string field.

use super::{Processor, ProcessorOutcome};
use crate::config::ProcessorConfig;
use crate::document::IngestDocument;
use crate::errors::{ConfigError, DocumentError, IngestError};
use crate::services::RuntimeServices;
use async_trait::async_trait;
use std::sync::Arc;

/// The direction of a case conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseTransform {
    /// Convert to upper case.
    Upper,
    /// Convert to lower case.
    Lower,
}

impl CaseTransform {
    /// The registry type name for this direction.
    #[must_use]
    pub const fn processor_type(self) -> &'static str {
        match self {
            Self::Upper => "uppercase",
            Self::Lower => "lowercase",
        }
    }

    fn apply(self, input: &str) -> String {
        match self {
            Self::Upper => input.to_uppercase(),
            Self::Lower => input.to_lowercase(),
        }
    }
}

/// Case-converts the string at `field`, writing the result back in place or
/// to `target_field`.
#[derive(Debug)]
pub struct CaseProcessor {
    transform: CaseTransform,
    field: String,
    target_field: Option<String>,
    ignore_missing: bool,
    tag: Option<String>,
    description: Option<String>,
}

impl CaseProcessor {
    /// Creates a processor converting `field` in the given direction.
    pub fn new(transform: CaseTransform, field: impl Into<String>) -> Self {
        Self {
            transform,
            field: field.into(),
            target_field: None,
            ignore_missing: false,
            tag: None,
            description: None,
        }
    }

    /// Writes the converted value to a different field.
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

    /// Builds an uppercase processor from configuration.
    pub fn uppercase_from_config(
        config: &mut ProcessorConfig,
        services: &RuntimeServices,
    ) -> Result<Arc<dyn Processor>, ConfigError> {
        Self::from_config(CaseTransform::Upper, config, services)
    }

    /// Builds a lowercase processor from configuration.
    pub fn lowercase_from_config(
        config: &mut ProcessorConfig,
        services: &RuntimeServices,
    ) -> Result<Arc<dyn Processor>, ConfigError> {
        Self::from_config(CaseTransform::Lower, config, services)
    }

    fn from_config(
        transform: CaseTransform,
        config: &mut ProcessorConfig,
        _services: &RuntimeServices,
    ) -> Result<Arc<dyn Processor>, ConfigError> {
        let field = config.take_string("field")?;
        let target_field = config.take_string_opt("target_field")?;
        let ignore_missing = config.take_bool_or("ignore_missing", false)?;

        let mut processor = Self::new(transform, field).with_ignore_missing(ignore_missing);
        processor.target_field = target_field;
        processor.tag = config.tag().map(ToOwned::to_owned);
        processor.description = config.description().map(ToOwned::to_owned);
        Ok(Arc::new(processor))
    }
}

#[async_trait]
impl Processor for CaseProcessor {
    fn processor_type(&self) -> &str {
        self.transform.processor_type()
    }

    fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn execute(&self, mut document: IngestDocument) -> Result<ProcessorOutcome, IngestError> {
        let converted = match document.get_str(&self.field) {
            Ok(value) => self.transform.apply(value),
            Err(DocumentError::FieldNotFound { .. }) if self.ignore_missing => {
                return Ok(ProcessorOutcome::Document(document))
            }
            Err(error) => return Err(error.into()),
        };
        let target = self.target_field.as_deref().unwrap_or(&self.field);
        document.set(target, converted)?;
        Ok(ProcessorOutcome::Document(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_uppercase_in_place() {
        let mut document = IngestDocument::new();
        document.set("method", "get").unwrap();

        let processor = CaseProcessor::new(CaseTransform::Upper, "method");
        let document = processor
            .execute(document)
            .unwrap()
            .into_document()
            .unwrap();

        assert_eq!(document.get("method").unwrap(), &json!("GET"));
    }

    #[test]
    fn test_lowercase_to_target_field() {
        let mut document = IngestDocument::new();
        document.set("level", "WARN").unwrap();

        let processor =
            CaseProcessor::new(CaseTransform::Lower, "level").with_target_field("level_lower");
        let document = processor
            .execute(document)
            .unwrap()
            .into_document()
            .unwrap();

        assert_eq!(document.get("level").unwrap(), &json!("WARN"));
        assert_eq!(document.get("level_lower").unwrap(), &json!("warn"));
    }

    #[test]
    fn test_non_string_field_fails() {
        let mut document = IngestDocument::new();
        document.set("level", 3).unwrap();

        let processor = CaseProcessor::new(CaseTransform::Upper, "level");
        let result = processor.execute(document);

        assert!(matches!(result, Err(IngestError::Document(_))));
    }

    #[test]
    fn test_missing_field_tolerated() {
        let processor =
            CaseProcessor::new(CaseTransform::Upper, "absent").with_ignore_missing(true);

        let outcome = processor.execute(IngestDocument::new());

        assert!(outcome.is_ok());
    }

    #[test]
    fn test_processor_type_follows_transform() {
        assert_eq!(
            CaseProcessor::new(CaseTransform::Upper, "f").processor_type(),
            "uppercase"
        );
        assert_eq!(
            CaseProcessor::new(CaseTransform::Lower, "f").processor_type(),
            "lowercase"
        );
    }
}
