//! # Ingestflow
//!
//! A document ingest pipeline execution engine.
//!
//! Ingestflow runs JSON-like documents through configurable pipelines of
//! processors:
//!
//! - **Document model**: a field tree addressed by dotted paths, wrapped in a
//!   metadata envelope that tracks the pipeline call stack
//! - **Processors**: synchronous or asynchronous transformation steps, built
//!   from configuration through a factory registry
//! - **Failure handling**: per-step and per-pipeline on-failure chains, with
//!   failure details exposed to the recovery steps
//! - **Pipelines as steps**: pipelines can invoke each other, with cycles
//!   rejected at execution time
//! - **Executor**: drives a document to exactly one terminal outcome and
//!   keeps counters over its executions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ingestflow::prelude::*;
//! use std::sync::Arc;
//!
//! // Register a pipeline from configuration
//! let store = Arc::new(InMemoryPipelineStore::new());
//! let registry = ProcessorRegistry::with_builtins();
//! let services = RuntimeServices::new(store.clone());
//! store.register("logs", definition, &registry, &services)?;
//!
//! // Run a document through it
//! let executor = PipelineExecutor::new(store);
//! match executor.run(document, "logs").await {
//!     PipelineOutcome::Kept(document) => index(document),
//!     PipelineOutcome::Dropped => {}
//!     PipelineOutcome::Failed(error) => report(error),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod document;
pub mod errors;
pub mod execution;
pub mod pipeline;
pub mod processors;
pub mod services;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::ProcessorConfig;
    pub use crate::document::{DocumentMetadata, IngestDocument};
    pub use crate::errors::{
        ConfigError, ContractViolationError, CycleError, DocumentError, IngestError,
        ProcessorError,
    };
    pub use crate::execution::{PipelineExecutor, PipelineOutcome, StatsSnapshot};
    pub use crate::pipeline::{
        CompoundProcessor, Condition, InMemoryPipelineStore, Pipeline, PipelineResolver,
    };
    pub use crate::processors::{
        Completion, Processor, ProcessorFactory, ProcessorOutcome, ProcessorRegistry,
    };
    pub use crate::services::{
        LookupClient, RuntimeServices, Scheduler, SchedulerHandle, ScriptEvaluator, TaskExecutor,
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_builtins_are_registered() {
        let registry = crate::processors::ProcessorRegistry::with_builtins();
        assert!(registry.contains("set"));
        assert!(registry.contains("pipeline"));
    }
}
