//! Appends values to a sequence field.

use super::{Processor, ProcessorOutcome};
use crate::config::ProcessorConfig;
use crate::document::IngestDocument;
use crate::errors::{ConfigError, IngestError};
use crate::services::RuntimeServices;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Appends a value to a field, promoting scalars to sequences as needed.
///
/// With `allow_duplicates` disabled, values already present in the target
/// sequence are skipped.
#[derive(Debug)]
pub struct AppendProcessor {
    field: String,
    value: Value,
    allow_duplicates: bool,
    tag: Option<String>,
    description: Option<String>,
}

impl AppendProcessor {
    /// The registry type name.
    pub const TYPE: &'static str = "append";

    /// Creates a processor that appends `value` to `field`.
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            allow_duplicates: true,
            tag: None,
            description: None,
        }
    }

    /// Controls whether values already present are appended again.
    #[must_use]
    pub const fn with_allow_duplicates(mut self, allow_duplicates: bool) -> Self {
        self.allow_duplicates = allow_duplicates;
        self
    }

    /// Sets the instance tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Builds the processor from configuration, consuming `field`, `value`,
    /// and the optional `allow_duplicates` flag.
    pub fn from_config(
        config: &mut ProcessorConfig,
        _services: &RuntimeServices,
    ) -> Result<Arc<dyn Processor>, ConfigError> {
        let field = config.take_string("field")?;
        let value = config.take_value("value")?;
        let allow_duplicates = config.take_bool_or("allow_duplicates", true)?;

        let mut processor = Self::new(field, value).with_allow_duplicates(allow_duplicates);
        processor.tag = config.tag().map(ToOwned::to_owned);
        processor.description = config.description().map(ToOwned::to_owned);
        Ok(Arc::new(processor))
    }

    fn fresh_values(&self, document: &IngestDocument) -> Vec<Value> {
        let existing: &[Value] = match document.get(&self.field) {
            Ok(Value::Array(items)) => items,
            Ok(single) => std::slice::from_ref(single),
            Err(_) => &[],
        };
        let candidates = match &self.value {
            Value::Array(items) => items.clone(),
            single => vec![single.clone()],
        };
        candidates
            .into_iter()
            .filter(|candidate| !existing.contains(candidate))
            .collect()
    }
}

#[async_trait]
impl Processor for AppendProcessor {
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
        if self.allow_duplicates {
            document.append(&self.field, self.value.clone())?;
        } else {
            let fresh = self.fresh_values(&document);
            if !fresh.is_empty() {
                document.append(&self.field, Value::Array(fresh))?;
            }
        }
        Ok(ProcessorOutcome::Document(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_append_to_missing_field_creates_sequence() {
        let processor = AppendProcessor::new("tags", "alpha");

        let document = processor
            .execute(IngestDocument::new())
            .unwrap()
            .into_document()
            .unwrap();

        assert_eq!(document.get("tags").unwrap(), &json!(["alpha"]));
    }

    #[test]
    fn test_append_extends_existing_sequence() {
        let mut document = IngestDocument::new();
        document.set("tags", json!(["alpha"])).unwrap();

        let processor = AppendProcessor::new("tags", json!(["beta", "gamma"]));
        let document = processor
            .execute(document)
            .unwrap()
            .into_document()
            .unwrap();

        assert_eq!(
            document.get("tags").unwrap(),
            &json!(["alpha", "beta", "gamma"])
        );
    }

    #[test]
    fn test_append_promotes_scalar() {
        let mut document = IngestDocument::new();
        document.set("tags", "alpha").unwrap();

        let processor = AppendProcessor::new("tags", "beta");
        let document = processor
            .execute(document)
            .unwrap()
            .into_document()
            .unwrap();

        assert_eq!(document.get("tags").unwrap(), &json!(["alpha", "beta"]));
    }

    #[test]
    fn test_append_skips_duplicates_when_disallowed() {
        let mut document = IngestDocument::new();
        document.set("tags", json!(["alpha", "beta"])).unwrap();

        let processor = AppendProcessor::new("tags", json!(["beta", "gamma"]))
            .with_allow_duplicates(false);
        let document = processor
            .execute(document)
            .unwrap()
            .into_document()
            .unwrap();

        assert_eq!(
            document.get("tags").unwrap(),
            &json!(["alpha", "beta", "gamma"])
        );
    }

    #[test]
    fn test_append_all_duplicates_leaves_field_unchanged() {
        let mut document = IngestDocument::new();
        document.set("tags", json!(["alpha"])).unwrap();

        let processor = AppendProcessor::new("tags", "alpha").with_allow_duplicates(false);
        let document = processor
            .execute(document)
            .unwrap()
            .into_document()
            .unwrap();

        assert_eq!(document.get("tags").unwrap(), &json!(["alpha"]));
    }
}
