//! Processor factories and the type registry.

use super::{
    AppendProcessor, CaseProcessor, CaseTransform, DropProcessor, EnrichProcessor, FailProcessor,
    GsubProcessor, PipelineProcessor, Processor, RemoveProcessor, RenameProcessor, SetProcessor,
};
use crate::config::ProcessorConfig;
use crate::errors::ConfigError;
use crate::services::RuntimeServices;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds a processor from its configuration.
///
/// A factory must consume every configuration field it understands; fields
/// still present after `create` returns are reported as unknown to the
/// caller. Any `Fn(&mut ProcessorConfig, &RuntimeServices)` with the right
/// return type is a factory.
pub trait ProcessorFactory: Send + Sync {
    /// Builds a processor, taking its settings out of `config`.
    fn create(
        &self,
        config: &mut ProcessorConfig,
        services: &RuntimeServices,
    ) -> Result<Arc<dyn Processor>, ConfigError>;
}

impl<F> ProcessorFactory for F
where
    F: Fn(&mut ProcessorConfig, &RuntimeServices) -> Result<Arc<dyn Processor>, ConfigError>
        + Send
        + Sync,
{
    fn create(
        &self,
        config: &mut ProcessorConfig,
        services: &RuntimeServices,
    ) -> Result<Arc<dyn Processor>, ConfigError> {
        self(config, services)
    }
}

/// Maps processor type names to their factories.
#[derive(Default)]
pub struct ProcessorRegistry {
    factories: RwLock<HashMap<String, Arc<dyn ProcessorFactory>>>,
}

impl ProcessorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry with every built-in processor type registered.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(SetProcessor::TYPE, SetProcessor::from_config);
        registry.register(RemoveProcessor::TYPE, RemoveProcessor::from_config);
        registry.register(RenameProcessor::TYPE, RenameProcessor::from_config);
        registry.register(AppendProcessor::TYPE, AppendProcessor::from_config);
        registry.register(
            CaseTransform::Upper.processor_type(),
            CaseProcessor::uppercase_from_config,
        );
        registry.register(
            CaseTransform::Lower.processor_type(),
            CaseProcessor::lowercase_from_config,
        );
        registry.register(GsubProcessor::TYPE, GsubProcessor::from_config);
        registry.register(FailProcessor::TYPE, FailProcessor::from_config);
        registry.register(DropProcessor::TYPE, DropProcessor::from_config);
        registry.register(PipelineProcessor::TYPE, PipelineProcessor::from_config);
        registry.register(EnrichProcessor::TYPE, EnrichProcessor::from_config);
        registry
    }

    /// Registers a factory under a type name, replacing any existing one.
    pub fn register(
        &self,
        processor_type: impl Into<String>,
        factory: impl ProcessorFactory + 'static,
    ) {
        self.factories
            .write()
            .insert(processor_type.into(), Arc::new(factory));
    }

    /// Builds a processor for the type named in `config`.
    ///
    /// Fails when no factory is registered for the type. The registry lock is
    /// not held while the factory runs.
    pub fn create(
        &self,
        config: &mut ProcessorConfig,
        services: &RuntimeServices,
    ) -> Result<Arc<dyn Processor>, ConfigError> {
        let factory = self
            .factories
            .read()
            .get(config.processor_type())
            .cloned();
        match factory {
            Some(factory) => factory.create(config, services),
            None => Err(ConfigError::unknown_processor_type(config.processor_type())),
        }
    }

    /// Whether a factory is registered for `processor_type`.
    #[must_use]
    pub fn contains(&self, processor_type: &str) -> bool {
        self.factories.read().contains_key(processor_type)
    }

    /// The registered type names, sorted.
    #[must_use]
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.read().keys().cloned().collect();
        types.sort();
        types
    }
}

impl fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("factories", &self.factories.read().len())
            .finish()
    }
}
