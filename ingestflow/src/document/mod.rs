//! The document model.
//!
//! This module contains the types a pipeline operates on:
//! - The mutable field tree with dotted-path access
//! - The metadata envelope (timestamp, identity, pipeline call stack,
//!   failure details)

mod ingest_document;
mod metadata;
mod path;

pub use ingest_document::IngestDocument;
pub use metadata::{
    DocumentMetadata, ON_FAILURE_MESSAGE_FIELD, ON_FAILURE_PROCESSOR_TAG_FIELD,
    ON_FAILURE_PROCESSOR_TYPE_FIELD,
};
