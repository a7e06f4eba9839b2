//! The ingest metadata envelope carried by every document.

use crate::errors::CycleError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envelope key for the failing step's error message during recovery.
pub const ON_FAILURE_MESSAGE_FIELD: &str = "on_failure_message";

/// Envelope key for the failing step's type name during recovery.
pub const ON_FAILURE_PROCESSOR_TYPE_FIELD: &str = "on_failure_processor_type";

/// Envelope key for the failing step's tag during recovery.
pub const ON_FAILURE_PROCESSOR_TAG_FIELD: &str = "on_failure_processor_tag";

/// Metadata the engine tracks alongside a document's fields.
///
/// The envelope exists for the whole life of the document: arrival time,
/// identity fields for the eventual destination, the stack of pipelines
/// currently executing against the document, and the failure details visible
/// to an on-failure chain while it runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// When the document entered the engine.
    pub timestamp: DateTime<Utc>,

    /// The destination index, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    /// The document id, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The routing value, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing: Option<String>,

    pipeline_stack: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    failure_details: Option<Map<String, Value>>,
}

impl DocumentMetadata {
    /// Creates a new envelope stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            index: None,
            id: None,
            routing: None,
            pipeline_stack: Vec::new(),
            failure_details: None,
        }
    }

    /// Sets the destination index.
    #[must_use]
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    /// Sets the document id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the routing value.
    #[must_use]
    pub fn with_routing(mut self, routing: impl Into<String>) -> Self {
        self.routing = Some(routing.into());
        self
    }

    /// The pipelines currently executing against this document, outermost
    /// first.
    #[must_use]
    pub fn pipeline_stack(&self) -> &[String] {
        &self.pipeline_stack
    }

    /// Whether the given pipeline is already executing against this document.
    #[must_use]
    pub fn on_pipeline_stack(&self, pipeline_id: &str) -> bool {
        self.pipeline_stack.iter().any(|id| id == pipeline_id)
    }

    /// Records entry into a pipeline.
    ///
    /// Fails when the pipeline is already on the stack: running it again
    /// would loop forever.
    pub fn enter_pipeline(&mut self, pipeline_id: impl Into<String>) -> Result<(), CycleError> {
        let pipeline_id = pipeline_id.into();
        if self.on_pipeline_stack(&pipeline_id) {
            return Err(CycleError::new(self.pipeline_stack.clone(), pipeline_id));
        }
        self.pipeline_stack.push(pipeline_id);
        Ok(())
    }

    /// Records exit from the most recently entered pipeline.
    pub fn exit_pipeline(&mut self) -> Option<String> {
        self.pipeline_stack.pop()
    }

    /// The failure details of the step an on-failure chain is recovering
    /// from, present only while the chain runs.
    #[must_use]
    pub fn failure_details(&self) -> Option<&Map<String, Value>> {
        self.failure_details.as_ref()
    }

    /// Attaches failure details for the duration of a recovery chain.
    pub fn set_failure_details(&mut self, details: Map<String, Value>) {
        self.failure_details = Some(details);
    }

    /// Removes the failure details once a recovery chain finishes.
    pub fn clear_failure_details(&mut self) {
        self.failure_details = None;
    }
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self::new()
    }
}
