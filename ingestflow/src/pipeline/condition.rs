//! Guard conditions for conditional step execution.

use crate::document::IngestDocument;
use crate::services::ScriptEvaluator;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// Trait for the boolean guard in front of a step.
///
/// Evaluated against the document before the wrapped processor runs; `false`
/// passes the document through untouched. An evaluation error counts as a
/// failure of the guarded step and goes through its recovery path.
pub trait Condition: Send + Sync + Debug {
    /// Evaluates the condition against the document.
    fn evaluate(&self, document: &IngestDocument) -> anyhow::Result<bool>;
}

/// A condition with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct AlwaysCondition {
    value: bool,
}

impl AlwaysCondition {
    /// Creates a condition that always evaluates to `value`.
    #[must_use]
    pub const fn new(value: bool) -> Self {
        Self { value }
    }
}

impl Condition for AlwaysCondition {
    fn evaluate(&self, _document: &IngestDocument) -> anyhow::Result<bool> {
        Ok(self.value)
    }
}

/// True when a dotted path resolves to a value.
#[derive(Debug, Clone)]
pub struct HasFieldCondition {
    field: String,
}

impl HasFieldCondition {
    /// Creates a condition on the presence of `field`.
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl Condition for HasFieldCondition {
    fn evaluate(&self, document: &IngestDocument) -> anyhow::Result<bool> {
        Ok(document.has(&self.field))
    }
}

/// True when a dotted path resolves to an expected value.
///
/// A missing field or an unresolvable path is simply `false`.
#[derive(Debug, Clone)]
pub struct FieldEqualsCondition {
    field: String,
    expected: Value,
}

impl FieldEqualsCondition {
    /// Creates a condition comparing `field` against `expected`.
    #[must_use]
    pub fn new(field: impl Into<String>, expected: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
        }
    }
}

impl Condition for FieldEqualsCondition {
    fn evaluate(&self, document: &IngestDocument) -> anyhow::Result<bool> {
        Ok(document
            .get(&self.field)
            .is_ok_and(|value| value == &self.expected))
    }
}

/// A closure-based condition.
pub struct FnCondition<F>
where
    F: Fn(&IngestDocument) -> bool + Send + Sync,
{
    func: F,
}

impl<F> FnCondition<F>
where
    F: Fn(&IngestDocument) -> bool + Send + Sync,
{
    /// Creates a condition from a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Debug for FnCondition<F>
where
    F: Fn(&IngestDocument) -> bool + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCondition").finish()
    }
}

impl<F> Condition for FnCondition<F>
where
    F: Fn(&IngestDocument) -> bool + Send + Sync,
{
    fn evaluate(&self, document: &IngestDocument) -> anyhow::Result<bool> {
        Ok((self.func)(document))
    }
}

/// A condition delegating to the host's script evaluator.
///
/// This is what an `if` configuration field builds.
pub struct ScriptCondition {
    source: String,
    evaluator: Arc<dyn ScriptEvaluator>,
}

impl ScriptCondition {
    /// Creates a condition from a script source and its evaluator.
    #[must_use]
    pub fn new(source: impl Into<String>, evaluator: Arc<dyn ScriptEvaluator>) -> Self {
        Self {
            source: source.into(),
            evaluator,
        }
    }

    /// The script source this condition evaluates.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Debug for ScriptCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptCondition")
            .field("source", &self.source)
            .finish()
    }
}

impl Condition for ScriptCondition {
    fn evaluate(&self, document: &IngestDocument) -> anyhow::Result<bool> {
        self.evaluator.evaluate_condition(&self.source, document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(source: Value) -> IngestDocument {
        match source {
            Value::Object(map) => IngestDocument::from_source(map),
            _ => IngestDocument::new(),
        }
    }

    #[test]
    fn test_always_condition() {
        let doc = IngestDocument::new();
        assert!(AlwaysCondition::new(true).evaluate(&doc).unwrap());
        assert!(!AlwaysCondition::new(false).evaluate(&doc).unwrap());
    }

    #[test]
    fn test_has_field_condition() {
        let doc = document(json!({"user": {"name": "kim"}}));
        assert!(HasFieldCondition::new("user.name").evaluate(&doc).unwrap());
        assert!(!HasFieldCondition::new("user.age").evaluate(&doc).unwrap());
    }

    #[test]
    fn test_field_equals_condition() {
        let doc = document(json!({"status": 200}));
        assert!(FieldEqualsCondition::new("status", 200).evaluate(&doc).unwrap());
        assert!(!FieldEqualsCondition::new("status", 404).evaluate(&doc).unwrap());
        assert!(!FieldEqualsCondition::new("missing", 200).evaluate(&doc).unwrap());
    }

    #[test]
    fn test_fn_condition() {
        let doc = document(json!({"n": 3}));
        let condition = FnCondition::new(|doc: &IngestDocument| {
            doc.get("n").is_ok_and(|v| v == &json!(3))
        });
        assert!(condition.evaluate(&doc).unwrap());
    }

    #[test]
    fn test_script_condition_delegates() {
        #[derive(Debug)]
        struct EchoEvaluator;

        impl ScriptEvaluator for EchoEvaluator {
            fn evaluate_condition(
                &self,
                source: &str,
                _document: &IngestDocument,
            ) -> anyhow::Result<bool> {
                match source {
                    "true" => Ok(true),
                    "false" => Ok(false),
                    other => anyhow::bail!("unknown script [{other}]"),
                }
            }
        }

        let doc = IngestDocument::new();
        let evaluator = Arc::new(EchoEvaluator);

        assert!(ScriptCondition::new("true", evaluator.clone()).evaluate(&doc).unwrap());
        assert!(!ScriptCondition::new("false", evaluator.clone()).evaluate(&doc).unwrap());
        assert!(ScriptCondition::new("boom", evaluator).evaluate(&doc).is_err());
    }
}
