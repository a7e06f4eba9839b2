//! Ready-made fixtures for pipeline tests.

use super::mocks::MockScriptEvaluator;
use crate::document::IngestDocument;
use crate::errors::ConfigError;
use crate::execution::PipelineExecutor;
use crate::pipeline::{InMemoryPipelineStore, PipelineResolver};
use crate::processors::ProcessorRegistry;
use crate::services::{LookupClient, RuntimeServices};
use serde_json::Value;
use std::sync::Arc;

/// Builds a document from a JSON object literal.
#[must_use]
pub fn document(source: Value) -> IngestDocument {
    match source {
        Value::Object(map) => IngestDocument::from_source(map),
        _ => IngestDocument::new(),
    }
}

/// A pipeline store, registry, and service bundle wired together for tests.
///
/// The registry carries the builtins and the services carry a
/// [`MockScriptEvaluator`], so JSON pipeline definitions with `if` conditions
/// register without further setup.
#[derive(Debug)]
pub struct PipelineFixture {
    store: Arc<InMemoryPipelineStore>,
    registry: ProcessorRegistry,
    services: RuntimeServices,
}

impl PipelineFixture {
    /// Creates the fixture.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryPipelineStore::new());
        let resolver: Arc<dyn PipelineResolver> = Arc::clone(&store) as Arc<dyn PipelineResolver>;
        let services =
            RuntimeServices::new(resolver).with_script_evaluator(Arc::new(MockScriptEvaluator::new()));
        Self {
            store,
            registry: ProcessorRegistry::with_builtins(),
            services,
        }
    }

    /// Installs a lookup client on the fixture's services.
    #[must_use]
    pub fn with_lookup_client(mut self, client: Arc<dyn LookupClient>) -> Self {
        self.services = self.services.with_lookup_client(client);
        self
    }

    /// The pipeline store.
    #[must_use]
    pub fn store(&self) -> &Arc<InMemoryPipelineStore> {
        &self.store
    }

    /// The processor registry.
    #[must_use]
    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    /// The runtime services.
    #[must_use]
    pub fn services(&self) -> &RuntimeServices {
        &self.services
    }

    /// Registers a pipeline from a JSON definition.
    pub fn register_json(&self, pipeline_id: &str, definition: Value) -> Result<(), ConfigError> {
        let config = match definition {
            Value::Object(map) => map,
            _ => {
                return Err(ConfigError::invalid_pipeline(
                    pipeline_id,
                    "definition must be an object",
                ))
            }
        };
        self.store
            .register(pipeline_id, config, &self.registry, &self.services)
    }

    /// Creates an executor over the fixture's store.
    #[must_use]
    pub fn executor(&self) -> PipelineExecutor {
        PipelineExecutor::new(Arc::clone(&self.store) as Arc<dyn PipelineResolver>)
    }
}

impl Default for PipelineFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_fixture_builds_from_object() {
        let doc = document(json!({"a": {"b": 1}}));
        assert_eq!(doc.get("a.b").unwrap(), &json!(1));
    }

    #[test]
    fn test_register_json_accepts_valid_definition() {
        let fixture = PipelineFixture::new();

        let result = fixture.register_json(
            "logs",
            json!({
                "processors": [
                    {"set": {"field": "seen", "value": true}}
                ]
            }),
        );

        assert!(result.is_ok());
        assert!(fixture.store().contains("logs"));
    }

    #[test]
    fn test_register_json_rejects_non_object() {
        let fixture = PipelineFixture::new();

        let result = fixture.register_json("logs", json!([1, 2]));

        assert!(matches!(result, Err(ConfigError::InvalidPipeline { .. })));
    }
}
