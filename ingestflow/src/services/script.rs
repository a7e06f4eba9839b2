//! Script evaluation capability.

use crate::document::IngestDocument;

/// Trait for evaluating condition scripts against a document.
///
/// The engine never interprets script sources itself; a host embeds whatever
/// script language it supports behind this interface. Conditional steps built
/// from an `if` configuration field delegate here.
pub trait ScriptEvaluator: Send + Sync {
    /// Evaluates a boolean condition script against the document.
    fn evaluate_condition(&self, source: &str, document: &IngestDocument)
        -> anyhow::Result<bool>;
}
