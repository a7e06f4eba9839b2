//! Processor configuration records.
//!
//! A [`ProcessorConfig`] carries the type name, optional tag and description,
//! and the remaining configuration fields for one processor. Factories read
//! their fields through the consuming `take_*` accessors; whatever is left
//! when construction finishes is a configuration error, surfaced by
//! [`ProcessorConfig::ensure_consumed`].

use crate::errors::ConfigError;
use serde_json::{Map, Value};

/// The configuration handed to a processor factory.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    processor_type: String,
    tag: Option<String>,
    description: Option<String>,
    fields: Map<String, Value>,
}

impl ProcessorConfig {
    /// Creates an empty configuration for the given processor type.
    #[must_use]
    pub fn new(processor_type: impl Into<String>) -> Self {
        Self {
            processor_type: processor_type.into(),
            tag: None,
            description: None,
            fields: Map::new(),
        }
    }

    /// Creates a configuration from a raw field map, extracting the common
    /// `tag` and `description` fields.
    pub fn from_fields(
        processor_type: impl Into<String>,
        mut fields: Map<String, Value>,
    ) -> Result<Self, ConfigError> {
        let processor_type = processor_type.into();
        let tag = take_optional_string(&processor_type, &mut fields, "tag")?;
        let description = take_optional_string(&processor_type, &mut fields, "description")?;
        Ok(Self {
            processor_type,
            tag,
            description,
            fields,
        })
    }

    /// The processor type name this configuration is for.
    #[must_use]
    pub fn processor_type(&self) -> &str {
        &self.processor_type
    }

    /// The instance tag, if configured.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// The human-readable description, if configured.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Sets the instance tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a configuration field.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Consumes and returns a required field.
    pub fn take_value(&mut self, field: &str) -> Result<Value, ConfigError> {
        self.fields
            .remove(field)
            .ok_or_else(|| ConfigError::missing_field(&self.processor_type, field))
    }

    /// Consumes and returns a field, if present.
    pub fn take_value_opt(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Consumes and returns a required string field.
    pub fn take_string(&mut self, field: &str) -> Result<String, ConfigError> {
        match self.take_value(field)? {
            Value::String(value) => Ok(value),
            other => Err(self.invalid(field, &other, "expected a string")),
        }
    }

    /// Consumes and returns a string field, if present.
    pub fn take_string_opt(&mut self, field: &str) -> Result<Option<String>, ConfigError> {
        match self.fields.remove(field) {
            None => Ok(None),
            Some(Value::String(value)) => Ok(Some(value)),
            Some(other) => Err(self.invalid(field, &other, "expected a string")),
        }
    }

    /// Consumes a boolean field, falling back to a default when absent.
    pub fn take_bool_or(&mut self, field: &str, default: bool) -> Result<bool, ConfigError> {
        match self.fields.remove(field) {
            None => Ok(default),
            Some(Value::Bool(value)) => Ok(value),
            Some(other) => Err(self.invalid(field, &other, "expected a boolean")),
        }
    }

    /// Consumes and returns a list field, if present.
    pub fn take_list_opt(&mut self, field: &str) -> Result<Option<Vec<Value>>, ConfigError> {
        match self.fields.remove(field) {
            None => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(other) => Err(self.invalid(field, &other, "expected a list")),
        }
    }

    /// The field names nothing has consumed yet.
    #[must_use]
    pub fn unconsumed(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Fails when any configuration field was left unconsumed.
    ///
    /// Called once per top-level construction, after the factory has read
    /// everything it recognizes.
    pub fn ensure_consumed(&self) -> Result<(), ConfigError> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::unconsumed_fields(
                &self.processor_type,
                self.unconsumed(),
            ))
        }
    }

    fn invalid(&self, field: &str, value: &Value, reason: &str) -> ConfigError {
        ConfigError::invalid_value(
            &self.processor_type,
            field,
            format!("{reason}, got {value}"),
        )
    }
}

fn take_optional_string(
    processor_type: &str,
    fields: &mut Map<String, Value>,
    field: &str,
) -> Result<Option<String>, ConfigError> {
    match fields.remove(field) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value)),
        Some(other) => Err(ConfigError::invalid_value(
            processor_type,
            field,
            format!("expected a string, got {other}"),
        )),
    }
}
