//! Testing utilities for ingest pipelines.
//!
//! This module provides:
//! - Mock processors with call tracking
//! - A mock script evaluator over a tiny expression language
//! - A wired store/registry/services fixture for end-to-end tests

mod fixtures;
mod mocks;

pub use fixtures::{document, PipelineFixture};
pub use mocks::{
    FailingProcessor, MockScriptEvaluator, NeverResolvingProcessor, RecordingProcessor,
    SlowAsyncProcessor,
};

use tracing_subscriber::EnvFilter;

/// Installs a tracing subscriber writing to the test output capture.
///
/// Honors `RUST_LOG` when set. Repeat calls are no-ops; only the first
/// installation wins.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
