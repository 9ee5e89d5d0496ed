//! Safety gate: per-action, per-user daily execution quotas.

use chrono::Utc;
use steward_core::Timestamp;
use uuid::Uuid;

use crate::error::ActionError;
use crate::execution::ExecutionLedger;
use crate::types::Action;

/// Enforces the daily execution quota in front of the dispatcher.
pub struct SafetyGate;

impl SafetyGate {
    /// Midnight UTC of the current day — the window quotas count over.
    pub fn today() -> Timestamp {
        let midnight = Utc::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();
        Timestamp(midnight)
    }

    /// Non-mutating quota check: completed executions today < limit.
    ///
    /// A failed check does not create or touch an execution; the caller
    /// decides whether to surface it. Use [`SafetyGate::admit`] for the
    /// race-free claim when actually starting a run.
    pub async fn check(
        action: &Action,
        user_id: Uuid,
        today: Timestamp,
        ledger: &dyn ExecutionLedger,
    ) -> Result<bool, ActionError> {
        let completed = ledger.count_completed(action.id, user_id, today).await?;
        Ok(completed < action.max_executions_per_day as u64)
    }

    /// Atomically claim a quota slot for the execution and move it to
    /// `executing`. Returns false when the quota is spent; the execution
    /// is then left in `executing` for the dispatcher to fail.
    pub async fn admit(
        action: &Action,
        execution_id: Uuid,
        ledger: &dyn ExecutionLedger,
    ) -> Result<bool, ActionError> {
        ledger
            .begin_execution(execution_id, Self::today(), action.max_executions_per_day)
            .await
    }
}
