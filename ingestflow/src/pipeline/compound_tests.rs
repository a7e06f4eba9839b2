//! Comprehensive tests for compound steps: guards, ignore_failure, and
//! on-failure recovery chains, plus configuration parsing via `from_entry`.

#[cfg(test)]
mod tests {
    use crate::document::{
        IngestDocument, ON_FAILURE_MESSAGE_FIELD, ON_FAILURE_PROCESSOR_TAG_FIELD,
        ON_FAILURE_PROCESSOR_TYPE_FIELD,
    };
    use crate::errors::{ConfigError, IngestError, ProcessorError};
    use crate::pipeline::{
        AlwaysCondition, CompoundProcessor, InMemoryPipelineStore, PipelineResolver,
        ScriptCondition,
    };
    use crate::processors::{DropProcessor, FnProcessor, Processor, ProcessorOutcome, SetProcessor};
    use crate::services::RuntimeServices;
    use crate::testing::{
        document, FailingProcessor, MockScriptEvaluator, NeverResolvingProcessor, PipelineFixture,
        RecordingProcessor, SlowAsyncProcessor,
    };
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn kept(result: Result<ProcessorOutcome, IngestError>) -> IngestDocument {
        match result {
            Ok(ProcessorOutcome::Document(document)) => document,
            other => panic!("expected a forwarded document, got {other:?}"),
        }
    }

    fn step_failure(result: Result<ProcessorOutcome, IngestError>) -> ProcessorError {
        match result {
            Err(IngestError::Processor(failure)) => failure,
            other => panic!("expected a processor failure, got {other:?}"),
        }
    }

    /// Services with no script evaluator, no lookup client.
    fn bare_services() -> RuntimeServices {
        let store = Arc::new(InMemoryPipelineStore::new());
        RuntimeServices::new(store as Arc<dyn PipelineResolver>)
    }

    #[tokio::test]
    async fn test_bare_step_runs_processor() {
        let step = CompoundProcessor::new(Arc::new(SetProcessor::new("greeting", "hello")));

        let result = step.execute(IngestDocument::new()).await;

        let document = kept(result);
        assert_eq!(document.get("greeting").unwrap(), &json!("hello"));
    }

    #[tokio::test]
    async fn test_false_condition_skips_processor() {
        let recorder = Arc::new(RecordingProcessor::new("skipped"));
        let step = CompoundProcessor::new(Arc::clone(&recorder) as Arc<dyn Processor>)
            .with_condition(Arc::new(AlwaysCondition::new(false)));

        let result = step.execute(document(json!({"x": 1}))).await;

        let output = kept(result);
        assert_eq!(recorder.call_count(), 0);
        assert_eq!(output.get("x").unwrap(), &json!(1));
    }

    #[tokio::test]
    async fn test_true_condition_runs_processor() {
        let recorder = Arc::new(RecordingProcessor::new("ran"));
        let step = CompoundProcessor::new(Arc::clone(&recorder) as Arc<dyn Processor>)
            .with_condition(Arc::new(AlwaysCondition::new(true)));

        kept(step.execute(IngestDocument::new()).await);

        assert_eq!(recorder.call_count(), 1);
    }

    #[tokio::test]
    async fn test_condition_error_fails_the_step() {
        let condition = ScriptCondition::new("garbage", Arc::new(MockScriptEvaluator::new()));
        let step = CompoundProcessor::new(Arc::new(SetProcessor::new("x", 1)))
            .with_condition(Arc::new(condition));

        let failure = step_failure(step.execute(IngestDocument::new()).await);

        assert_eq!(failure.processor_type, "set");
        assert_eq!(failure.message, "condition evaluation failed");
    }

    #[tokio::test]
    async fn test_condition_error_with_ignore_failure_passes_document() {
        let condition = ScriptCondition::new("garbage", Arc::new(MockScriptEvaluator::new()));
        let step = CompoundProcessor::new(Arc::new(SetProcessor::new("x", 1)))
            .with_condition(Arc::new(condition))
            .with_ignore_failure(true);

        let output = kept(step.execute(document(json!({"kept": true}))).await);

        assert_eq!(output.get("kept").unwrap(), &json!(true));
        assert!(!output.has("x"), "the guarded processor must not have run");
    }

    #[tokio::test]
    async fn test_failure_runs_on_failure_chain() {
        let step = CompoundProcessor::new(Arc::new(FailingProcessor::new("boom")))
            .with_on_failure(vec![CompoundProcessor::new(Arc::new(SetProcessor::new(
                "error", true,
            )))]);

        let output = kept(step.execute(IngestDocument::new()).await);

        assert_eq!(output.get("error").unwrap(), &json!(true));
    }

    #[tokio::test]
    async fn test_on_failure_chain_sees_failure_details() {
        let copier = FnProcessor::new("copy_details", |mut document: IngestDocument| {
            let details = document
                .metadata()
                .failure_details()
                .cloned()
                .unwrap_or_default();
            document.set("details", Value::Object(details))?;
            Ok(ProcessorOutcome::Document(document))
        });
        let step = CompoundProcessor::new(Arc::new(
            FailingProcessor::new("boom").with_tag("step-3"),
        ))
        .with_on_failure(vec![CompoundProcessor::new(Arc::new(copier))]);

        let output = kept(step.execute(IngestDocument::new()).await);

        let copied = format!("details.{ON_FAILURE_MESSAGE_FIELD}");
        assert_eq!(output.get(&copied).unwrap(), &json!("boom"));
        let copied = format!("details.{ON_FAILURE_PROCESSOR_TYPE_FIELD}");
        assert_eq!(output.get(&copied).unwrap(), &json!("failing"));
        let copied = format!("details.{ON_FAILURE_PROCESSOR_TAG_FIELD}");
        assert_eq!(output.get(&copied).unwrap(), &json!("step-3"));
        assert!(
            output.metadata().failure_details().is_none(),
            "details must be cleared once the chain succeeds"
        );
    }

    #[tokio::test]
    async fn test_on_failure_chain_runs_against_pre_step_document() {
        let mutator = FnProcessor::new("mutator", |mut document: IngestDocument| {
            document.set("half", true)?;
            Err(ProcessorError::new("mutator", "failed midway").into())
        });
        let step = CompoundProcessor::new(Arc::new(mutator)).with_on_failure(vec![
            CompoundProcessor::new(Arc::new(SetProcessor::new("handled", true))),
        ]);

        let output = kept(step.execute(document(json!({"original": 1}))).await);

        assert_eq!(output.get("original").unwrap(), &json!(1));
        assert_eq!(output.get("handled").unwrap(), &json!(true));
        assert!(
            !output.has("half"),
            "partial mutations of the failing step must be discarded"
        );
    }

    #[tokio::test]
    async fn test_ignore_failure_restores_pre_step_document() {
        let mutator = FnProcessor::new("mutator", |mut document: IngestDocument| {
            document.set("half", true)?;
            Err(ProcessorError::new("mutator", "failed midway").into())
        });
        let step = CompoundProcessor::new(Arc::new(mutator)).with_ignore_failure(true);

        let output = kept(step.execute(document(json!({"original": 1}))).await);

        assert_eq!(output.get("original").unwrap(), &json!(1));
        assert!(!output.has("half"));
    }

    #[tokio::test]
    async fn test_on_failure_chain_can_drop() {
        let step = CompoundProcessor::new(Arc::new(FailingProcessor::new("boom")))
            .with_on_failure(vec![CompoundProcessor::new(Arc::new(DropProcessor::new()))]);

        let result = step.execute(IngestDocument::new()).await;

        assert!(matches!(result, Ok(ProcessorOutcome::Dropped)));
    }

    #[tokio::test]
    async fn test_on_failure_chain_failure_propagates() {
        let step = CompoundProcessor::new(Arc::new(FailingProcessor::new("first")))
            .with_on_failure(vec![CompoundProcessor::new(Arc::new(
                FailingProcessor::new("second"),
            ))]);

        let failure = step_failure(step.execute(IngestDocument::new()).await);

        assert_eq!(failure.message, "second");
    }

    #[tokio::test]
    async fn test_contract_violation_bypasses_recovery() {
        let step = CompoundProcessor::new(Arc::new(NeverResolvingProcessor::new()))
            .with_ignore_failure(true)
            .with_on_failure(vec![CompoundProcessor::new(Arc::new(SetProcessor::new(
                "rescued", true,
            )))]);

        let result = step.execute(IngestDocument::new()).await;

        assert!(matches!(result, Err(IngestError::Contract(_))));
    }

    #[tokio::test]
    async fn test_async_processor_resolves_through_completion() {
        let step = CompoundProcessor::new(Arc::new(SlowAsyncProcessor::with_delay_ms(5)));

        let result = step.execute(document(json!({"x": 1}))).await;

        let output = kept(result);
        assert_eq!(output.get("x").unwrap(), &json!(1));
    }

    #[tokio::test]
    async fn test_untagged_failure_inherits_processor_tag() {
        let failing = FnProcessor::new("custom", |_document: IngestDocument| {
            Err(ProcessorError::new("custom", "oops").into())
        })
        .with_tag("step-7");
        let step = CompoundProcessor::new(Arc::new(failing));

        let failure = step_failure(step.execute(IngestDocument::new()).await);

        assert_eq!(failure.tag.as_deref(), Some("step-7"));
    }

    #[test]
    fn test_from_entry_builds_full_step() {
        let fixture = PipelineFixture::new();
        let entry = json!({
            "set": {
                "field": "x",
                "value": 1,
                "tag": "set-x",
                "if": "true",
                "ignore_failure": true,
                "on_failure": [
                    {"set": {"field": "error", "value": true}}
                ]
            }
        });

        let step =
            CompoundProcessor::from_entry(&entry, fixture.registry(), fixture.services()).unwrap();

        assert!(step.handles_failures());
        assert_eq!(step.processor().processor_type(), "set");
        assert_eq!(step.processor().tag(), Some("set-x"));
    }

    #[tokio::test]
    async fn test_from_entry_condition_gates_execution() {
        let fixture = PipelineFixture::new();
        let entry = json!({"set": {"field": "x", "value": 2, "if": "eq:x:1"}});
        let step =
            CompoundProcessor::from_entry(&entry, fixture.registry(), fixture.services()).unwrap();

        let updated = kept(step.execute(document(json!({"x": 1}))).await);
        assert_eq!(updated.get("x").unwrap(), &json!(2));

        let skipped = kept(step.execute(document(json!({"x": 5}))).await);
        assert_eq!(skipped.get("x").unwrap(), &json!(5));
    }

    #[tokio::test]
    async fn test_from_entry_nested_on_failure_recovers() {
        let fixture = PipelineFixture::new();
        let entry = json!({
            "fail": {
                "message": "boom",
                "on_failure": [
                    {"set": {"field": "rescued", "value": true}}
                ]
            }
        });
        let step =
            CompoundProcessor::from_entry(&entry, fixture.registry(), fixture.services()).unwrap();

        let output = kept(step.execute(IngestDocument::new()).await);

        assert_eq!(output.get("rescued").unwrap(), &json!(true));
    }

    #[test]
    fn test_from_entry_rejects_unconsumed_fields() {
        let fixture = PipelineFixture::new();
        let entry = json!({"set": {"field": "x", "value": 1, "bogus": 2}});

        let result = CompoundProcessor::from_entry(&entry, fixture.registry(), fixture.services());

        assert!(matches!(result, Err(ConfigError::UnconsumedFields { .. })));
    }

    #[test]
    fn test_from_entry_rejects_unknown_type() {
        let fixture = PipelineFixture::new();
        let entry = json!({"nope": {}});

        let result = CompoundProcessor::from_entry(&entry, fixture.registry(), fixture.services());

        assert!(matches!(
            result,
            Err(ConfigError::UnknownProcessorType { .. })
        ));
    }

    #[test]
    fn test_from_entry_requires_script_evaluator_for_if() {
        let fixture = PipelineFixture::new();
        let services = bare_services();
        let entry = json!({"set": {"field": "x", "value": 1, "if": "true"}});

        let result = CompoundProcessor::from_entry(&entry, fixture.registry(), &services);

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_entry_rejects_empty_on_failure() {
        let fixture = PipelineFixture::new();
        let entry = json!({"set": {"field": "x", "value": 1, "on_failure": []}});

        let result = CompoundProcessor::from_entry(&entry, fixture.registry(), fixture.services());

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_entry_rejects_multi_key_entry() {
        let fixture = PipelineFixture::new();
        let entry = json!({
            "set": {"field": "x", "value": 1},
            "remove": {"field": "y"}
        });

        let result = CompoundProcessor::from_entry(&entry, fixture.registry(), fixture.services());

        assert!(matches!(result, Err(ConfigError::MalformedEntry { .. })));
    }

    #[test]
    fn test_from_entry_rejects_non_object_entry() {
        let fixture = PipelineFixture::new();
        let entry = json!("set");

        let result = CompoundProcessor::from_entry(&entry, fixture.registry(), fixture.services());

        assert!(matches!(result, Err(ConfigError::MalformedEntry { .. })));
    }

    #[test]
    fn test_from_entry_rejects_non_object_config() {
        let fixture = PipelineFixture::new();
        let entry = json!({"set": 3});

        let result = CompoundProcessor::from_entry(&entry, fixture.registry(), fixture.services());

        assert!(matches!(result, Err(ConfigError::MalformedEntry { .. })));
    }
}
