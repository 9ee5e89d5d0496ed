//! Error types for the action engine.

use steward_core::StewardError;
use steward_report::ReportError;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{ActionKind, ExecutionStatus};

/// Errors from the action pipeline.
///
/// Everything here is captured at the dispatcher boundary and folded into
/// a failed execution plus a structured outcome; nothing propagates as a
/// fault to the transport layer.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Action processing is disabled")]
    Disabled,
    #[error("Prompt exceeds {0} characters")]
    PromptTooLong(usize),
    #[error("Parameter pattern '{name}' is invalid: {message}")]
    InvalidPattern { name: String, message: String },
    #[error("Action configuration invalid: {0}")]
    InvalidConfig(String),
    #[error("Missing parameter: {0}")]
    MissingParameter(String),
    #[error("Action type not supported: {0}")]
    Unsupported(ActionKind),
    #[error("Invalid state transition: {0} -> {1}")]
    InvalidTransition(ExecutionStatus, ExecutionStatus),
    #[error("Execution not found: {0}")]
    NotFound(Uuid),
    #[error("Action not found: {0}")]
    ActionNotFound(Uuid),
    #[error("User {0} is not an approver for this action")]
    NotApprover(Uuid),
    #[error("Daily execution limit of {limit} reached")]
    LimitExceeded { limit: u32 },
    #[error("Update would affect {matched} records, limit is {limit}")]
    TooManyRecords { matched: u64, limit: u64 },
    #[error("Report generation failed: {0}")]
    Report(#[from] ReportError),
    #[error("Storage error: {0}")]
    Storage(#[from] StewardError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_display() {
        let err = ActionError::InvalidPattern {
            name: "customer".to_string(),
            message: "unclosed group".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Parameter pattern 'customer' is invalid: unclosed group"
        );
    }

    #[test]
    fn test_unsupported_display() {
        let err = ActionError::Unsupported(ActionKind::CustomCode);
        assert_eq!(err.to_string(), "Action type not supported: custom_code");
        let err = ActionError::Unsupported(ActionKind::Delete);
        assert_eq!(err.to_string(), "Action type not supported: delete");
    }

    #[test]
    fn test_invalid_transition_display() {
        let err =
            ActionError::InvalidTransition(ExecutionStatus::Completed, ExecutionStatus::Executing);
        assert_eq!(
            err.to_string(),
            "Invalid state transition: completed -> executing"
        );
    }

    #[test]
    fn test_limit_exceeded_display() {
        let err = ActionError::LimitExceeded { limit: 5 };
        assert_eq!(err.to_string(), "Daily execution limit of 5 reached");
    }

    #[test]
    fn test_too_many_records_display() {
        let err = ActionError::TooManyRecords {
            matched: 250,
            limit: 100,
        };
        assert_eq!(
            err.to_string(),
            "Update would affect 250 records, limit is 100"
        );
    }

    #[test]
    fn test_not_found_preserves_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let err = ActionError::NotFound(id);
        assert_eq!(
            err.to_string(),
            "Execution not found: 550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn test_from_steward_error() {
        let err: ActionError = StewardError::Storage("ledger offline".to_string()).into();
        assert!(matches!(err, ActionError::Storage(_)));
        assert!(err.to_string().contains("ledger offline"));
    }

    #[test]
    fn test_from_report_error() {
        let id = Uuid::new_v4();
        let err: ActionError = ReportError::TemplateNotFound(id).into();
        assert!(matches!(err, ActionError::Report(_)));
        assert!(err.to_string().contains("Template not found"));
    }

    #[test]
    fn test_errors_implement_debug() {
        let err = ActionError::Disabled;
        assert!(format!("{:?}", err).contains("Disabled"));
        let err = ActionError::MissingParameter("recipient".to_string());
        assert!(format!("{:?}", err).contains("MissingParameter"));
    }
}
