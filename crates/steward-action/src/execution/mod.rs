//! Execution lifecycle management.
//!
//! The ledger seam owns execution rows; the engine drives them through
//! the state machine and never deletes them. `begin_execution` is the one
//! operation that must be atomic: it evaluates the daily quota and claims
//! a slot in a single step so two concurrent executions for the same
//! action and user cannot both slip past the limit.

pub mod state_machine;

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use steward_core::{StewardError, Timestamp};
use uuid::Uuid;

use crate::error::ActionError;
use crate::execution::state_machine::validate_transition;
use crate::types::{Execution, ExecutionStatus};

/// Persistence seam for execution rows.
#[async_trait]
pub trait ExecutionLedger: Send + Sync {
    /// Store a freshly created execution.
    async fn create(&self, execution: Execution) -> Result<(), ActionError>;

    /// Fetch an execution by id.
    async fn get(&self, id: Uuid) -> Result<Execution, ActionError>;

    /// Apply a validated status transition.
    async fn transition(&self, id: Uuid, to: ExecutionStatus) -> Result<Execution, ActionError>;

    /// Record a human approval: pending -> approved with approver stamp.
    async fn record_approval(
        &self,
        id: Uuid,
        approver: Uuid,
        notes: Option<String>,
    ) -> Result<Execution, ActionError>;

    /// Record the terminal outcome of a run: executing -> completed/failed
    /// together with the result payload, as one write.
    async fn record_result(
        &self,
        id: Uuid,
        to: ExecutionStatus,
        result: Value,
        records_affected: u64,
    ) -> Result<Execution, ActionError>;

    /// Atomically claim a daily quota slot and move the execution from
    /// approved to executing.
    ///
    /// In one ledger operation: count this execution's `(action, user)`
    /// siblings created at or after `since` whose status is executing or
    /// completed; transition the execution to executing; return whether
    /// the count was below `limit`. In-flight rows count so that no
    /// interleaving of concurrent runs can complete more than `limit`
    /// times. A refused execution is left in `executing` for the caller
    /// to fail.
    async fn begin_execution(
        &self,
        id: Uuid,
        since: Timestamp,
        limit: u32,
    ) -> Result<bool, ActionError>;

    /// Completed executions for `(action, user)` created at or after `since`.
    async fn count_completed(
        &self,
        action_id: Uuid,
        user_id: Uuid,
        since: Timestamp,
    ) -> Result<u64, ActionError>;
}

/// In-memory execution ledger.
///
/// All operations take the single mutex once, which makes
/// `begin_execution` trivially atomic.
pub struct MemoryLedger {
    executions: Mutex<Vec<Execution>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            executions: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Execution>>, ActionError> {
        self.executions
            .lock()
            .map_err(|e| StewardError::Storage(format!("execution lock poisoned: {}", e)).into())
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionLedger for MemoryLedger {
    async fn create(&self, execution: Execution) -> Result<(), ActionError> {
        let mut executions = self.lock()?;
        executions.push(execution);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Execution, ActionError> {
        let executions = self.lock()?;
        executions
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(ActionError::NotFound(id))
    }

    async fn transition(&self, id: Uuid, to: ExecutionStatus) -> Result<Execution, ActionError> {
        let mut executions = self.lock()?;
        let execution = executions
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(ActionError::NotFound(id))?;

        validate_transition(execution.status, to)?;
        execution.status = to;
        Ok(execution.clone())
    }

    async fn record_approval(
        &self,
        id: Uuid,
        approver: Uuid,
        notes: Option<String>,
    ) -> Result<Execution, ActionError> {
        let mut executions = self.lock()?;
        let execution = executions
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(ActionError::NotFound(id))?;

        validate_transition(execution.status, ExecutionStatus::Approved)?;
        execution.status = ExecutionStatus::Approved;
        execution.approved_by = Some(approver);
        execution.approved_at = Some(Timestamp::now());
        execution.approval_notes = notes;
        Ok(execution.clone())
    }

    async fn record_result(
        &self,
        id: Uuid,
        to: ExecutionStatus,
        result: Value,
        records_affected: u64,
    ) -> Result<Execution, ActionError> {
        let mut executions = self.lock()?;
        let execution = executions
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(ActionError::NotFound(id))?;

        validate_transition(execution.status, to)?;
        execution.status = to;
        execution.result = Some(result);
        execution.records_affected = records_affected;
        Ok(execution.clone())
    }

    async fn begin_execution(
        &self,
        id: Uuid,
        since: Timestamp,
        limit: u32,
    ) -> Result<bool, ActionError> {
        let mut executions = self.lock()?;

        let (action_id, user_id, status) = {
            let execution = executions
                .iter()
                .find(|e| e.id == id)
                .ok_or(ActionError::NotFound(id))?;
            (execution.action_id, execution.user_id, execution.status)
        };
        validate_transition(status, ExecutionStatus::Executing)?;

        let used = executions
            .iter()
            .filter(|e| {
                e.id != id
                    && e.action_id == action_id
                    && e.user_id == user_id
                    && e.created_at >= since
                    && matches!(
                        e.status,
                        ExecutionStatus::Executing | ExecutionStatus::Completed
                    )
            })
            .count() as u64;

        let execution = executions
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(ActionError::NotFound(id))?;
        execution.status = ExecutionStatus::Executing;

        Ok(used < limit as u64)
    }

    async fn count_completed(
        &self,
        action_id: Uuid,
        user_id: Uuid,
        since: Timestamp,
    ) -> Result<u64, ActionError> {
        let executions = self.lock()?;
        Ok(executions
            .iter()
            .filter(|e| {
                e.action_id == action_id
                    && e.user_id == user_id
                    && e.created_at >= since
                    && e.status == ExecutionStatus::Completed
            })
            .count() as u64)
    }
}

/// Build a map of parameters for tests.
#[cfg(test)]
pub(crate) fn params(pairs: &[(&str, &str)]) -> std::collections::BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
