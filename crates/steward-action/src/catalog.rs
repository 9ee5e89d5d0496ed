//! Action catalog seam.
//!
//! The engine reads action definitions and records completed runs through
//! this trait; the hosting application owns the actual storage.
//! Execution statistics live behind `record_execution` so concurrent
//! completions cannot lose updates on a shared config object.

use std::sync::Mutex;

use async_trait::async_trait;
use steward_core::{Result, StewardError, Timestamp};
use uuid::Uuid;

use crate::types::Action;

/// Read access to configured actions plus execution bookkeeping.
#[async_trait]
pub trait ActionCatalog: Send + Sync {
    /// All actions currently marked active.
    async fn list_active(&self) -> Result<Vec<Action>>;

    /// Fetch an action by id, active or not.
    async fn get(&self, id: Uuid) -> Result<Option<Action>>;

    /// Record one completed execution: bumps the counter and stamps
    /// `last_executed`.
    async fn record_execution(&self, id: Uuid, at: Timestamp) -> Result<()>;
}

/// In-memory action catalog.
pub struct MemoryCatalog {
    actions: Mutex<Vec<Action>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
        }
    }

    /// Add an action to the catalog.
    pub fn insert(&self, action: Action) {
        if let Ok(mut actions) = self.actions.lock() {
            actions.push(action);
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Action>>> {
        self.actions
            .lock()
            .map_err(|e| StewardError::Storage(format!("action lock poisoned: {}", e)))
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionCatalog for MemoryCatalog {
    async fn list_active(&self) -> Result<Vec<Action>> {
        let actions = self.lock()?;
        Ok(actions.iter().filter(|a| a.is_active).cloned().collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Action>> {
        let actions = self.lock()?;
        Ok(actions.iter().find(|a| a.id == id).cloned())
    }

    async fn record_execution(&self, id: Uuid, at: Timestamp) -> Result<()> {
        let mut actions = self.lock()?;
        let action = actions
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| StewardError::Storage(format!("unknown action: {}", id)))?;
        action.execution_count += 1;
        action.last_executed = Some(at);
        Ok(())
    }
}
