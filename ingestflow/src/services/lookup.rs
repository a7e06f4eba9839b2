//! Key lookup capability for enrichment.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Trait for looking up enrichment data by key.
///
/// Backed by whatever the host considers a lookup source: another index, a
/// cache, an external service. The engine only sees keys and values.
#[async_trait]
pub trait LookupClient: Send + Sync {
    /// Looks up `key` in the named table, returning the stored value if any.
    async fn lookup(&self, table: &str, key: &str) -> anyhow::Result<Option<Value>>;
}

/// A [`LookupClient`] over fixed in-memory tables.
#[derive(Debug, Clone, Default)]
pub struct StaticLookupClient {
    tables: HashMap<String, HashMap<String, Value>>,
}

impl StaticLookupClient {
    /// Creates an empty lookup client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry to a table.
    #[must_use]
    pub fn with_entry(
        mut self,
        table: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.tables
            .entry(table.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }
}

#[async_trait]
impl LookupClient for StaticLookupClient {
    async fn lookup(&self, table: &str, key: &str) -> anyhow::Result<Option<Value>> {
        Ok(self
            .tables
            .get(table)
            .and_then(|entries| entries.get(key))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_static_lookup() {
        let client = StaticLookupClient::new()
            .with_entry("users", "u1", json!({"name": "kim"}))
            .with_entry("users", "u2", json!({"name": "lee"}));

        assert_eq!(
            client.lookup("users", "u1").await.unwrap(),
            Some(json!({"name": "kim"}))
        );
        assert_eq!(client.lookup("users", "u3").await.unwrap(), None);
        assert_eq!(client.lookup("orders", "u1").await.unwrap(), None);
    }
}
