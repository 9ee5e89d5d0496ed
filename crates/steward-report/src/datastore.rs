//! Data store seam.
//!
//! The report engine reads business records through this trait. Only
//! equality predicates cross the boundary; anything richer must be baked
//! into the template's filters by its author.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use steward_core::{Record, Result, StewardError};

/// Read access to the business system's records.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Fetch records of `entity` matching every `(field, value)` pair
    /// exactly, projected to `fields` (all fields when empty).
    async fn query(
        &self,
        entity: &str,
        filters: &BTreeMap<String, Value>,
        fields: &[String],
    ) -> Result<Vec<Record>>;
}

/// In-memory data store keyed by entity name.
pub struct MemoryDataStore {
    rows: Mutex<HashMap<String, Vec<Record>>>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
        }
    }

    /// Add a record under an entity.
    pub fn insert(&self, entity: &str, record: Record) {
        if let Ok(mut rows) = self.rows.lock() {
            rows.entry(entity.to_string()).or_default().push(record);
        }
    }
}

impl Default for MemoryDataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DataStore for MemoryDataStore {
    async fn query(
        &self,
        entity: &str,
        filters: &BTreeMap<String, Value>,
        fields: &[String],
    ) -> Result<Vec<Record>> {
        let rows = self
            .rows
            .lock()
            .map_err(|e| StewardError::Storage(format!("row lock poisoned: {}", e)))?;

        let matched = rows
            .get(entity)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| {
                        filters
                            .iter()
                            .all(|(field, value)| r.get(field) == Some(value))
                    })
                    .map(|r| project(r, fields))
                    .collect()
            })
            .unwrap_or_default();

        Ok(matched)
    }
}

fn project(record: &Record, fields: &[String]) -> Record {
    if fields.is_empty() {
        return record.clone();
    }
    fields
        .iter()
        .filter_map(|f| record.get(f).map(|v| (f.clone(), v.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_query_equality_filter() {
        let store = MemoryDataStore::new();
        store.insert(
            "order",
            record(&[
                ("state", serde_json::json!("done")),
                ("amount", serde_json::json!(100)),
            ]),
        );
        store.insert(
            "order",
            record(&[
                ("state", serde_json::json!("draft")),
                ("amount", serde_json::json!(50)),
            ]),
        );

        let filters: BTreeMap<String, Value> =
            [("state".to_string(), serde_json::json!("done"))].into();
        let results = store.query("order", &filters, &[]).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["amount"], serde_json::json!(100));
    }

    #[tokio::test]
    async fn test_query_no_filters_returns_all() {
        let store = MemoryDataStore::new();
        store.insert("order", record(&[("amount", serde_json::json!(1))]));
        store.insert("order", record(&[("amount", serde_json::json!(2))]));

        let results = store.query("order", &BTreeMap::new(), &[]).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_query_unknown_entity_is_empty() {
        let store = MemoryDataStore::new();
        let results = store.query("ghost", &BTreeMap::new(), &[]).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_query_projects_fields() {
        let store = MemoryDataStore::new();
        store.insert(
            "order",
            record(&[
                ("amount", serde_json::json!(100)),
                ("state", serde_json::json!("done")),
                ("partner", serde_json::json!("acme")),
            ]),
        );

        let results = store
            .query("order", &BTreeMap::new(), &["amount".to_string()])
            .await
            .unwrap();
        assert_eq!(results[0].len(), 1);
        assert!(results[0].contains_key("amount"));
    }

    #[tokio::test]
    async fn test_query_projection_skips_absent_fields() {
        let store = MemoryDataStore::new();
        store.insert("order", record(&[("amount", serde_json::json!(100))]));

        let results = store
            .query(
                "order",
                &BTreeMap::new(),
                &["amount".to_string(), "missing".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(results[0].len(), 1);
    }
}
