//! Removes one or more fields from the document.

use super::{Processor, ProcessorOutcome};
use crate::config::ProcessorConfig;
use crate::document::IngestDocument;
use crate::errors::{ConfigError, DocumentError, IngestError};
use crate::services::RuntimeServices;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Removes fields, failing when a field is absent unless `ignore_missing` is
/// set.
#[derive(Debug)]
pub struct RemoveProcessor {
    fields: Vec<String>,
    ignore_missing: bool,
    tag: Option<String>,
    description: Option<String>,
}

impl RemoveProcessor {
    /// The registry type name.
    pub const TYPE: &'static str = "remove";

    /// Creates a processor that removes a single field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            fields: vec![field.into()],
            ignore_missing: false,
            tag: None,
            description: None,
        }
    }

    /// Controls whether absent fields are tolerated.
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

    /// Builds the processor from configuration. `field` is a path or a list
    /// of paths; `ignore_missing` defaults to false.
    pub fn from_config(
        config: &mut ProcessorConfig,
        _services: &RuntimeServices,
    ) -> Result<Arc<dyn Processor>, ConfigError> {
        let fields = match config.take_value("field")? {
            Value::String(field) => vec![field],
            Value::Array(entries) => {
                if entries.is_empty() {
                    return Err(ConfigError::invalid_value(
                        config.processor_type(),
                        "field",
                        "cannot be an empty list",
                    ));
                }
                entries
                    .into_iter()
                    .map(|entry| match entry {
                        Value::String(field) => Ok(field),
                        other => Err(ConfigError::invalid_value(
                            config.processor_type(),
                            "field",
                            format!("expected a string, got {other}"),
                        )),
                    })
                    .collect::<Result<Vec<_>, _>>()?
            }
            other => {
                return Err(ConfigError::invalid_value(
                    config.processor_type(),
                    "field",
                    format!("expected a string or list of strings, got {other}"),
                ))
            }
        };
        let ignore_missing = config.take_bool_or("ignore_missing", false)?;

        Ok(Arc::new(Self {
            fields,
            ignore_missing,
            tag: config.tag().map(ToOwned::to_owned),
            description: config.description().map(ToOwned::to_owned),
        }))
    }
}

#[async_trait]
impl Processor for RemoveProcessor {
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
        for field in &self.fields {
            match document.remove(field) {
                Ok(_) => {}
                Err(DocumentError::FieldNotFound { .. }) if self.ignore_missing => {}
                Err(error) => return Err(error.into()),
            }
        }
        Ok(ProcessorOutcome::Document(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::InMemoryPipelineStore;
    use serde_json::json;

    #[test]
    fn test_remove_existing_field() {
        let mut document = IngestDocument::new();
        document.set("temp", "scratch").unwrap();
        document.set("keep", true).unwrap();

        let processor = RemoveProcessor::new("temp");
        let document = processor
            .execute(document)
            .unwrap()
            .into_document()
            .unwrap();

        assert!(!document.has("temp"));
        assert_eq!(document.get("keep").unwrap(), &json!(true));
    }

    #[test]
    fn test_remove_missing_field_fails() {
        let processor = RemoveProcessor::new("absent");

        let result = processor.execute(IngestDocument::new());

        assert!(matches!(result, Err(IngestError::Document(_))));
    }

    #[test]
    fn test_remove_missing_field_tolerated() {
        let processor = RemoveProcessor::new("absent").with_ignore_missing(true);

        let outcome = processor.execute(IngestDocument::new());

        assert!(outcome.is_ok());
    }

    #[test]
    fn test_from_config_accepts_field_list() {
        let services = RuntimeServices::new(Arc::new(InMemoryPipelineStore::new()));
        let mut config =
            ProcessorConfig::new("remove").with_field("field", json!(["one", "two"]));
        let processor = RemoveProcessor::from_config(&mut config, &services).unwrap();

        let mut document = IngestDocument::new();
        document.set("one", 1).unwrap();
        document.set("two", 2).unwrap();
        document.set("three", 3).unwrap();
        let document = processor
            .execute(document)
            .unwrap()
            .into_document()
            .unwrap();

        assert!(!document.has("one"));
        assert!(!document.has("two"));
        assert!(document.has("three"));
    }

    #[test]
    fn test_from_config_rejects_empty_field_list() {
        let services = RuntimeServices::new(Arc::new(InMemoryPipelineStore::new()));
        let mut config = ProcessorConfig::new("remove").with_field("field", json!([]));

        let result = RemoveProcessor::from_config(&mut config, &services);

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
