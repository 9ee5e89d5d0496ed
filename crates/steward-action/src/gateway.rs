//! Business-system seams used by action handlers.
//!
//! `EntityGateway` is the write path into the hosting system's records;
//! `Mailer` delivers outbound mail. Both are narrow contracts the engine
//! calls and never implements against a real backend itself.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use steward_core::{Record, Result, StewardError};

/// Record-level access to the business system.
#[async_trait]
pub trait EntityGateway: Send + Sync {
    /// Create one record; returns its id as an opaque JSON value.
    async fn create(&self, entity: &str, values: &Record) -> Result<Value>;

    /// Fetch the records matching every `(field, value)` pair exactly.
    async fn select(&self, entity: &str, filters: &BTreeMap<String, Value>) -> Result<Vec<Record>>;

    /// Set `values` on every matching record; returns the count touched.
    async fn update(
        &self,
        entity: &str,
        filters: &BTreeMap<String, Value>,
        values: &Record,
    ) -> Result<u64>;
}

/// Outbound mail delivery.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// In-memory entity gateway with sequential ids.
pub struct MemoryGateway {
    rows: Mutex<HashMap<String, Vec<Record>>>,
    next_id: AtomicU64,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Seed a record directly, bypassing id assignment.
    pub fn seed(&self, entity: &str, record: Record) {
        if let Ok(mut rows) = self.rows.lock() {
            rows.entry(entity.to_string()).or_default().push(record);
        }
    }

    /// All records currently stored for an entity.
    pub fn rows(&self, entity: &str) -> Vec<Record> {
        self.rows
            .lock()
            .ok()
            .and_then(|rows| rows.get(entity).cloned())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<Record>>>> {
        self.rows
            .lock()
            .map_err(|e| StewardError::Storage(format!("row lock poisoned: {}", e)))
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn matches(record: &Record, filters: &BTreeMap<String, Value>) -> bool {
    filters
        .iter()
        .all(|(field, value)| record.get(field) == Some(value))
}

#[async_trait]
impl EntityGateway for MemoryGateway {
    async fn create(&self, entity: &str, values: &Record) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut record = values.clone();
        record.insert("id".to_string(), Value::from(id));

        let mut rows = self.lock()?;
        rows.entry(entity.to_string()).or_default().push(record);
        Ok(Value::from(id))
    }

    async fn select(&self, entity: &str, filters: &BTreeMap<String, Value>) -> Result<Vec<Record>> {
        let rows = self.lock()?;
        Ok(rows
            .get(entity)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| matches(r, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update(
        &self,
        entity: &str,
        filters: &BTreeMap<String, Value>,
        values: &Record,
    ) -> Result<u64> {
        let mut rows = self.lock()?;
        let mut touched = 0;
        if let Some(records) = rows.get_mut(entity) {
            for record in records.iter_mut().filter(|r| matches(r, filters)) {
                for (field, value) in values {
                    record.insert(field.clone(), value.clone());
                }
                touched += 1;
            }
        }
        Ok(touched)
    }
}

/// In-memory mailer recording every message it was asked to send.
pub struct MemoryMailer {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Messages sent so far as `(to, subject, body)`.
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Default for MemoryMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|e| StewardError::Storage(format!("mailer lock poisoned: {}", e)))?;
        sent.push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}
