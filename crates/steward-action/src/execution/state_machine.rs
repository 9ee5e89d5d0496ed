//! Execution state machine with validated transitions.
//!
//! Enforces the allowed transitions for the execution lifecycle:
//! Pending -> Approved -> Executing -> Completed/Failed
//! Pending/Approved -> Cancelled

use crate::error::ActionError;
use crate::types::ExecutionStatus;

/// Validate that a status transition is allowed.
///
/// Valid transitions:
/// - Pending -> Approved (human approval)
/// - Pending -> Cancelled
/// - Approved -> Executing
/// - Approved -> Cancelled
/// - Executing -> Completed
/// - Executing -> Failed
pub fn validate_transition(
    from: ExecutionStatus,
    to: ExecutionStatus,
) -> Result<(), ActionError> {
    let valid = matches!(
        (from, to),
        (ExecutionStatus::Pending, ExecutionStatus::Approved)
            | (ExecutionStatus::Pending, ExecutionStatus::Cancelled)
            | (ExecutionStatus::Approved, ExecutionStatus::Executing)
            | (ExecutionStatus::Approved, ExecutionStatus::Cancelled)
            | (ExecutionStatus::Executing, ExecutionStatus::Completed)
            | (ExecutionStatus::Executing, ExecutionStatus::Failed)
    );

    if valid {
        Ok(())
    } else {
        Err(ActionError::InvalidTransition(from, to))
    }
}
