//! Pipeline storage and lookup.

use super::definition::Pipeline;
use crate::errors::ConfigError;
use crate::processors::ProcessorRegistry;
use crate::services::RuntimeServices;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

/// Resolves pipeline ids to pipelines.
///
/// The executor and the pipeline processor look pipelines up through this
/// trait, so executions always see whatever the store holds at call time.
pub trait PipelineResolver: Send + Sync {
    /// Returns the pipeline registered under `pipeline_id`, if any.
    fn resolve(&self, pipeline_id: &str) -> Option<Arc<Pipeline>>;
}

/// A concurrent in-memory pipeline store.
#[derive(Debug, Default)]
pub struct InMemoryPipelineStore {
    pipelines: DashMap<String, Arc<Pipeline>>,
}

impl InMemoryPipelineStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pipelines: DashMap::new(),
        }
    }

    /// Builds a pipeline from configuration and registers it.
    ///
    /// Registration replaces any pipeline already stored under the same id.
    /// In-flight executions keep the pipeline they resolved.
    pub fn register(
        &self,
        pipeline_id: impl Into<String>,
        config: Map<String, Value>,
        registry: &ProcessorRegistry,
        services: &RuntimeServices,
    ) -> Result<(), ConfigError> {
        let pipeline_id = pipeline_id.into();
        let pipeline = Pipeline::from_config(pipeline_id.clone(), config, registry, services)?;
        info!(pipeline_id = %pipeline_id, steps = pipeline.len(), "registered pipeline");
        self.pipelines.insert(pipeline_id, Arc::new(pipeline));
        Ok(())
    }

    /// Inserts an already built pipeline, replacing any existing one with the
    /// same id.
    pub fn insert(&self, pipeline: Pipeline) {
        self.pipelines
            .insert(pipeline.id().to_owned(), Arc::new(pipeline));
    }

    /// Removes the pipeline registered under `pipeline_id`.
    pub fn remove(&self, pipeline_id: &str) -> Option<Arc<Pipeline>> {
        self.pipelines
            .remove(pipeline_id)
            .map(|(_, pipeline)| pipeline)
    }

    /// Whether a pipeline is registered under `pipeline_id`.
    #[must_use]
    pub fn contains(&self, pipeline_id: &str) -> bool {
        self.pipelines.contains_key(pipeline_id)
    }

    /// The ids of all registered pipelines.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.pipelines
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// The number of registered pipelines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

impl PipelineResolver for InMemoryPipelineStore {
    fn resolve(&self, pipeline_id: &str) -> Option<Arc<Pipeline>> {
        self.pipelines
            .get(pipeline_id)
            .map(|entry| Arc::clone(entry.value()))
    }
}
