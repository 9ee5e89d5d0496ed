//! Core types and value objects for the action engine.
//!
//! Defines actions, executions, and their supporting enumerations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use steward_core::{Record, Timestamp};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Action types mapping to handler implementations.
///
/// `Delete` and `CustomCode` are accepted in configuration but have no
/// handler; dispatching them fails the execution as unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
    SendEmail,
    GenerateReport,
    CustomCode,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Create => write!(f, "create"),
            ActionKind::Update => write!(f, "update"),
            ActionKind::Delete => write!(f, "delete"),
            ActionKind::SendEmail => write!(f, "send_email"),
            ActionKind::GenerateReport => write!(f, "generate_report"),
            ActionKind::CustomCode => write!(f, "custom_code"),
        }
    }
}

impl std::str::FromStr for ActionKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(ActionKind::Create),
            "update" => Ok(ActionKind::Update),
            "delete" => Ok(ActionKind::Delete),
            "send_email" => Ok(ActionKind::SendEmail),
            "generate_report" => Ok(ActionKind::GenerateReport),
            "custom_code" => Ok(ActionKind::CustomCode),
            _ => Err(format!("Unknown action kind: {}", s)),
        }
    }
}

/// Execution lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Approved,
    Executing,
    Completed,
    Failed,
    Cancelled,
}

impl ExecutionStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Completed | ExecutionStatus::Failed | ExecutionStatus::Cancelled
        )
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionStatus::Pending => write!(f, "pending"),
            ExecutionStatus::Approved => write!(f, "approved"),
            ExecutionStatus::Executing => write!(f, "executing"),
            ExecutionStatus::Completed => write!(f, "completed"),
            ExecutionStatus::Failed => write!(f, "failed"),
            ExecutionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for ExecutionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ExecutionStatus::Pending),
            "approved" => Ok(ExecutionStatus::Approved),
            "executing" => Ok(ExecutionStatus::Executing),
            "completed" => Ok(ExecutionStatus::Completed),
            "failed" => Ok(ExecutionStatus::Failed),
            "cancelled" => Ok(ExecutionStatus::Cancelled),
            _ => Err(format!("Unknown execution status: {}", s)),
        }
    }
}

// =============================================================================
// Action configuration
// =============================================================================

/// Email directives for `send_email` actions.
///
/// `{param}` placeholders in subject and body are substituted with
/// extracted parameter values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSpec {
    /// Name of the extracted parameter holding the recipient address.
    pub to_field: String,
    pub subject: String,
    pub body: String,
}

/// Typed action configuration, parsed once at load time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionSpec {
    /// Named regex patterns applied to the prompt; capture group 1 becomes
    /// the parameter value.
    pub parameter_patterns: BTreeMap<String, String>,
    /// Field values written by create/update handlers before parameters
    /// are overlaid.
    pub defaults: Record,
    /// Equality filters selecting the records an update targets. String
    /// values may carry `{param}` placeholders.
    pub filters: BTreeMap<String, Value>,
    pub email: Option<EmailSpec>,
    /// Report template driven by `generate_report` actions.
    pub template_id: Option<Uuid>,
}

fn default_true() -> bool {
    true
}

fn default_daily_limit() -> u32 {
    10
}

fn default_max_records() -> u64 {
    100
}

/// A configured, triggerable automated operation.
///
/// Owned by the hosting application's config store; the engine reads it
/// and never mutates it in place. `execution_count` and `last_executed`
/// are catalog-maintained aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: Uuid,
    pub name: String,
    /// Substring that triggers this action. Empty or absent never matches.
    #[serde(default)]
    pub trigger_phrase: Option<String>,
    pub kind: ActionKind,
    #[serde(default)]
    pub target_entity: Option<String>,
    #[serde(default)]
    pub spec: ActionSpec,
    #[serde(default = "default_true")]
    pub requires_approval: bool,
    /// Users allowed to approve. Empty means any user may approve.
    #[serde(default)]
    pub approvers: Vec<Uuid>,
    #[serde(default = "default_daily_limit")]
    pub max_executions_per_day: u32,
    #[serde(default = "default_max_records")]
    pub max_records_affected: u64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub execution_count: u64,
    #[serde(default)]
    pub last_executed: Option<Timestamp>,
}

// =============================================================================
// Execution
// =============================================================================

/// One concrete attempt to run an action for a user and prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: Uuid,
    pub action_id: Uuid,
    pub user_id: Uuid,
    pub original_prompt: String,
    pub parameters: BTreeMap<String, String>,
    pub status: ExecutionStatus,
    pub result: Option<Value>,
    pub records_affected: u64,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<Timestamp>,
    pub approval_notes: Option<String>,
    pub created_at: Timestamp,
}

impl Execution {
    /// Create an execution for a matched action.
    ///
    /// Starts `approved` when the action needs no approval, else `pending`.
    pub fn new(
        action: &Action,
        user_id: Uuid,
        prompt: &str,
        parameters: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action_id: action.id,
            user_id,
            original_prompt: prompt.to_string(),
            parameters,
            status: if action.requires_approval {
                ExecutionStatus::Pending
            } else {
                ExecutionStatus::Approved
            },
            result: None,
            records_affected: 0,
            approved_by: None,
            approved_at: None,
            approval_notes: None,
            created_at: Timestamp::now(),
        }
    }
}

// =============================================================================
// Results
// =============================================================================

/// Result returned by action handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerOutcome {
    pub records_affected: u64,
    pub detail: Value,
}

/// Structured outcome of processing a prompt.
///
/// Every branch of the pipeline collapses into one of these; the engine
/// never surfaces a fault to the transport layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessOutcome {
    NoMatch {
        message: String,
    },
    PendingApproval {
        execution_id: Uuid,
        action_name: String,
        parameters: BTreeMap<String, String>,
        message: String,
    },
    Completed {
        execution_id: Uuid,
        result: Value,
        records_affected: u64,
    },
    Error {
        message: String,
    },
}
