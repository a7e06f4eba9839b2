//! Enriches the document from an external lookup table.

use super::{Completion, Processor};
use crate::config::ProcessorConfig;
use crate::document::IngestDocument;
use crate::errors::{ConfigError, DocumentError, ProcessorError};
use crate::services::{LookupClient, RuntimeServices, Scheduler, TaskExecutor, TokioScheduler, TokioTaskExecutor};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Looks up the value of `field` in a named table and writes the match to
/// `target_field`.
///
/// The lookup runs off the execution path. With a timeout configured, the
/// lookup and a scheduled timer race for the completion; whichever finishes
/// first resolves it and the loser finds the latch already empty. A lookup
/// that matches nothing leaves the document unchanged.
pub struct EnrichProcessor {
    field: String,
    target_field: String,
    table: String,
    timeout: Option<Duration>,
    ignore_missing: bool,
    client: Arc<dyn LookupClient>,
    scheduler: Arc<dyn Scheduler>,
    task_executor: Arc<dyn TaskExecutor>,
    tag: Option<String>,
    description: Option<String>,
}

impl EnrichProcessor {
    /// The registry type name.
    pub const TYPE: &'static str = "enrich";

    /// Creates a processor looking `field` up in `table` through `client`.
    pub fn new(
        field: impl Into<String>,
        target_field: impl Into<String>,
        table: impl Into<String>,
        client: Arc<dyn LookupClient>,
    ) -> Self {
        Self {
            field: field.into(),
            target_field: target_field.into(),
            table: table.into(),
            timeout: None,
            ignore_missing: false,
            client,
            scheduler: Arc::new(TokioScheduler::new()),
            task_executor: Arc::new(TokioTaskExecutor::new()),
            tag: None,
            description: None,
        }
    }

    /// Fails lookups that take longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Controls whether an absent key field is tolerated.
    #[must_use]
    pub const fn with_ignore_missing(mut self, ignore_missing: bool) -> Self {
        self.ignore_missing = ignore_missing;
        self
    }

    /// Sets the instance tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Builds the processor from configuration, consuming `field`,
    /// `target_field`, `table`, and the optional `timeout_millis` and
    /// `ignore_missing` settings. Requires a lookup client in the services.
    pub fn from_config(
        config: &mut ProcessorConfig,
        services: &RuntimeServices,
    ) -> Result<Arc<dyn Processor>, ConfigError> {
        let client = match services.lookup_client() {
            Some(client) => Arc::clone(client),
            None => {
                return Err(ConfigError::invalid_value(
                    Self::TYPE,
                    "table",
                    "no lookup client configured",
                ))
            }
        };
        let field = config.take_string("field")?;
        let target_field = config.take_string("target_field")?;
        let table = config.take_string("table")?;
        let timeout = match config.take_value_opt("timeout_millis") {
            None => None,
            Some(value) => match value.as_u64() {
                Some(millis) => Some(Duration::from_millis(millis)),
                None => {
                    return Err(ConfigError::invalid_value(
                        Self::TYPE,
                        "timeout_millis",
                        format!("expected a non-negative integer, got {value}"),
                    ))
                }
            },
        };
        let ignore_missing = config.take_bool_or("ignore_missing", false)?;

        let mut processor =
            Self::new(field, target_field, table, client).with_ignore_missing(ignore_missing);
        processor.timeout = timeout;
        processor.scheduler = Arc::clone(services.scheduler());
        processor.task_executor = Arc::clone(services.task_executor());
        processor.tag = config.tag().map(ToOwned::to_owned);
        processor.description = config.description().map(ToOwned::to_owned);
        Ok(Arc::new(processor))
    }
}

impl fmt::Debug for EnrichProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrichProcessor")
            .field("field", &self.field)
            .field("target_field", &self.target_field)
            .field("table", &self.table)
            .field("timeout", &self.timeout)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Processor for EnrichProcessor {
    fn processor_type(&self) -> &str {
        Self::TYPE
    }

    fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn is_async(&self) -> bool {
        true
    }

    async fn execute_async(&self, document: IngestDocument, completion: Completion) {
        let key = match document.get_str(&self.field) {
            Ok(key) => key.to_owned(),
            Err(DocumentError::FieldNotFound { .. }) if self.ignore_missing => {
                completion.document(document);
                return;
            }
            Err(error) => {
                completion.failure(error);
                return;
            }
        };

        match self.timeout {
            None => {
                let result = self.client.lookup(&self.table, &key).await;
                finish(
                    completion,
                    document,
                    &self.target_field,
                    &self.table,
                    &key,
                    self.tag.as_deref(),
                    result,
                );
            }
            Some(timeout) => {
                let latch = Arc::new(Mutex::new(Some(completion)));

                let timeout_latch = Arc::clone(&latch);
                let mut timeout_failure = ProcessorError::new(
                    Self::TYPE,
                    format!(
                        "lookup against table [{}] timed out after {}ms",
                        self.table,
                        timeout.as_millis()
                    ),
                );
                if let Some(tag) = &self.tag {
                    timeout_failure = timeout_failure.with_tag(tag.as_str());
                }
                let handle = self.scheduler.schedule(
                    timeout,
                    Box::new(move || {
                        if let Some(completion) = timeout_latch.lock().take() {
                            completion.failure(timeout_failure);
                        }
                    }),
                );

                let client = Arc::clone(&self.client);
                let table = self.table.clone();
                let target_field = self.target_field.clone();
                let tag = self.tag.clone();
                self.task_executor.spawn(Box::pin(async move {
                    let result = client.lookup(&table, &key).await;
                    let completion = match latch.lock().take() {
                        Some(completion) => completion,
                        None => return,
                    };
                    handle.cancel();
                    finish(
                        completion,
                        document,
                        &target_field,
                        &table,
                        &key,
                        tag.as_deref(),
                        result,
                    );
                }));
            }
        }
    }
}

fn finish(
    completion: Completion,
    mut document: IngestDocument,
    target_field: &str,
    table: &str,
    key: &str,
    tag: Option<&str>,
    result: anyhow::Result<Option<Value>>,
) {
    match result {
        Ok(Some(value)) => match document.set(target_field, value) {
            Ok(()) => completion.document(document),
            Err(error) => completion.failure(error),
        },
        Ok(None) => {
            debug!(table, key, "no enrich match, leaving document unchanged");
            completion.document(document);
        }
        Err(error) => {
            let mut failure = ProcessorError::new(
                EnrichProcessor::TYPE,
                format!("lookup against table [{table}] failed"),
            )
            .with_source(error);
            if let Some(tag) = tag {
                failure = failure.with_tag(tag);
            }
            completion.failure(failure);
        }
    }
}
