//! Action dispatcher.
//!
//! Coordinates the full pipeline from prompt to executed side effect:
//! trigger matching, parameter extraction, execution creation, the
//! approval branch, the safety gate, and handler dispatch. Every failure
//! is folded into a failed execution plus a structured outcome; nothing
//! here faults the hosting process.

use std::sync::Arc;

use serde_json::json;
use steward_core::config::ActionSettings;
use steward_core::Timestamp;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::ActionCatalog;
use crate::error::ActionError;
use crate::execution::ExecutionLedger;
use crate::extractor::extract_parameters;
use crate::gate::SafetyGate;
use crate::handler::HandlerRegistry;
use crate::matcher::match_actions;
use crate::types::{Execution, ExecutionStatus, ProcessOutcome};

/// Drives prompt processing and execution lifecycles.
pub struct Dispatcher {
    catalog: Arc<dyn ActionCatalog>,
    ledger: Arc<dyn ExecutionLedger>,
    registry: HandlerRegistry,
    settings: ActionSettings,
}

impl Dispatcher {
    pub fn new(
        catalog: Arc<dyn ActionCatalog>,
        ledger: Arc<dyn ExecutionLedger>,
        registry: HandlerRegistry,
        settings: ActionSettings,
    ) -> Self {
        Self {
            catalog,
            ledger,
            registry,
            settings,
        }
    }

    /// Process a free-text prompt for a user.
    ///
    /// Returns `NoMatch` when no trigger phrase is contained in the
    /// prompt, `PendingApproval` when the best match needs a human,
    /// `Completed` after a successful immediate run, and `Error` for
    /// every captured failure.
    pub async fn process_prompt(&self, prompt: &str, user_id: Uuid) -> ProcessOutcome {
        if !self.settings.enabled {
            return error_outcome(ActionError::Disabled);
        }
        if prompt.len() > self.settings.max_prompt_length {
            return error_outcome(ActionError::PromptTooLong(self.settings.max_prompt_length));
        }

        let actions = match self.catalog.list_active().await {
            Ok(actions) => actions,
            Err(e) => return error_outcome(e.into()),
        };

        let matches = match_actions(prompt, &actions);
        let Some(action) = matches.first().copied() else {
            return ProcessOutcome::NoMatch {
                message: "No matching actions found for this request.".to_string(),
            };
        };

        let parameters = match extract_parameters(prompt, action) {
            Ok(parameters) => parameters,
            Err(e) => return error_outcome(e),
        };

        let execution = Execution::new(action, user_id, prompt, parameters.clone());
        let execution_id = execution.id;
        let needs_approval = execution.status == ExecutionStatus::Pending;
        if let Err(e) = self.ledger.create(execution).await {
            return error_outcome(e);
        }
        info!(action = %action.name, execution = %execution_id, user = %user_id,
            "Prompt matched");

        if needs_approval {
            return ProcessOutcome::PendingApproval {
                execution_id,
                action_name: action.name.clone(),
                parameters,
                message: format!("Action \"{}\" requires approval.", action.name),
            };
        }

        self.run_execution(execution_id).await
    }

    /// Run an approved execution through the gate and its handler.
    pub async fn run_execution(&self, execution_id: Uuid) -> ProcessOutcome {
        match self.try_run(execution_id).await {
            Ok(outcome) => outcome,
            Err(e) => error_outcome(e),
        }
    }

    async fn try_run(&self, execution_id: Uuid) -> Result<ProcessOutcome, ActionError> {
        let execution = self.ledger.get(execution_id).await?;
        let action = self
            .catalog
            .get(execution.action_id)
            .await?
            .ok_or(ActionError::ActionNotFound(execution.action_id))?;

        if !SafetyGate::admit(&action, execution_id, self.ledger.as_ref()).await? {
            let err = ActionError::LimitExceeded {
                limit: action.max_executions_per_day,
            };
            self.ledger
                .record_result(execution_id, ExecutionStatus::Failed, json!(err.to_string()), 0)
                .await?;
            warn!(action = %action.name, execution = %execution_id,
                "Safety gate rejected execution");
            return Ok(error_outcome(err));
        }

        let Some(handler) = self.registry.get(action.kind) else {
            let err = ActionError::Unsupported(action.kind);
            self.ledger
                .record_result(execution_id, ExecutionStatus::Failed, json!(err.to_string()), 0)
                .await?;
            warn!(action = %action.name, kind = %action.kind, "No handler for action kind");
            return Ok(error_outcome(err));
        };

        match handler.execute(&action, &execution.parameters).await {
            Ok(outcome) => {
                self.ledger
                    .record_result(
                        execution_id,
                        ExecutionStatus::Completed,
                        outcome.detail.clone(),
                        outcome.records_affected,
                    )
                    .await?;
                if let Err(e) = self.catalog.record_execution(action.id, Timestamp::now()).await {
                    warn!(action = %action.name, error = %e,
                        "Failed to record execution statistics");
                }
                info!(action = %action.name, execution = %execution_id,
                    records = outcome.records_affected, "Action completed");
                Ok(ProcessOutcome::Completed {
                    execution_id,
                    result: outcome.detail,
                    records_affected: outcome.records_affected,
                })
            }
            Err(e) => {
                self.ledger
                    .record_result(execution_id, ExecutionStatus::Failed, json!(e.to_string()), 0)
                    .await?;
                warn!(action = %action.name, execution = %execution_id, error = %e,
                    "Action handler failed");
                Ok(error_outcome(e))
            }
        }
    }

    /// Approve a pending execution on behalf of `approver`.
    ///
    /// When the action names approvers, only they may approve. Approval
    /// does not run the execution; the caller decides when to invoke
    /// [`Dispatcher::run_execution`].
    pub async fn approve(
        &self,
        execution_id: Uuid,
        approver: Uuid,
        notes: Option<String>,
    ) -> Result<Execution, ActionError> {
        let execution = self.ledger.get(execution_id).await?;
        let action = self
            .catalog
            .get(execution.action_id)
            .await?
            .ok_or(ActionError::ActionNotFound(execution.action_id))?;
        if !action.approvers.is_empty() && !action.approvers.contains(&approver) {
            return Err(ActionError::NotApprover(approver));
        }

        let approved = self.ledger.record_approval(execution_id, approver, notes).await?;
        info!(execution = %execution_id, approver = %approver, "Execution approved");
        Ok(approved)
    }

    /// Cancel an execution before it starts running.
    pub async fn cancel(&self, execution_id: Uuid) -> Result<Execution, ActionError> {
        let cancelled = self
            .ledger
            .transition(execution_id, ExecutionStatus::Cancelled)
            .await?;
        info!(execution = %execution_id, "Execution cancelled");
        Ok(cancelled)
    }
}

fn error_outcome(err: ActionError) -> ProcessOutcome {
    ProcessOutcome::Error {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::execution::MemoryLedger;
    use crate::gateway::{MemoryGateway, MemoryMailer};
    use crate::types::{Action, ActionKind, ActionSpec, EmailSpec};
    use std::collections::BTreeMap;
    use steward_core::config::{NarrationSettings, ReportSettings};
    use steward_report::{MemoryDataStore, MemoryTemplates, ReportGenerator};

    struct Fixture {
        dispatcher: Dispatcher,
        catalog: Arc<MemoryCatalog>,
        ledger: Arc<MemoryLedger>,
        gateway: Arc<MemoryGateway>,
        mailer: Arc<MemoryMailer>,
    }

    fn fixture() -> Fixture {
        fixture_with_settings(ActionSettings::default())
    }

    fn fixture_with_settings(settings: ActionSettings) -> Fixture {
        let catalog = Arc::new(MemoryCatalog::new());
        let ledger = Arc::new(MemoryLedger::new());
        let gateway = Arc::new(MemoryGateway::new());
        let mailer = Arc::new(MemoryMailer::new());
        let reports = Arc::new(ReportGenerator::new(
            Arc::new(MemoryTemplates::new()),
            Arc::new(MemoryDataStore::new()),
            ReportSettings::default(),
            NarrationSettings::default(),
        ));
        let registry = HandlerRegistry::standard(
            Arc::clone(&gateway) as _,
            Arc::clone(&mailer) as _,
            reports,
        );
        let dispatcher = Dispatcher::new(
            Arc::clone(&catalog) as _,
            Arc::clone(&ledger) as _,
            registry,
            settings,
        );
        Fixture {
            dispatcher,
            catalog,
            ledger,
            gateway,
            mailer,
        }
    }

    fn invoice_action(requires_approval: bool) -> Action {
        Action {
            id: Uuid::new_v4(),
            name: "Recent invoices".to_string(),
            trigger_phrase: Some("recent invoices".to_string()),
            kind: ActionKind::Create,
            target_entity: Some("invoice".to_string()),
            spec: ActionSpec {
                defaults: [("state".to_string(), serde_json::json!("draft"))]
                    .into_iter()
                    .collect(),
                ..ActionSpec::default()
            },
            requires_approval,
            approvers: vec![],
            max_executions_per_day: 10,
            max_records_affected: 100,
            is_active: true,
            execution_count: 0,
            last_executed: None,
        }
    }

    // ---- process_prompt ----

    #[tokio::test]
    async fn test_prompt_completes_auto_approved_action() {
        let f = fixture();
        f.catalog.insert(invoice_action(false));

        let outcome = f
            .dispatcher
            .process_prompt("show me recent invoices", Uuid::new_v4())
            .await;

        match outcome {
            ProcessOutcome::Completed {
                records_affected,
                execution_id,
                ..
            } => {
                assert_eq!(records_affected, 1);
                let execution = f.ledger.get(execution_id).await.unwrap();
                assert_eq!(execution.status, ExecutionStatus::Completed);
                assert_eq!(execution.records_affected, 1);
            }
            other => panic!("expected Completed, got {:?}", other),
        }
        assert_eq!(f.gateway.rows("invoice").len(), 1);
    }

    #[tokio::test]
    async fn test_prompt_no_match() {
        let f = fixture();
        f.catalog.insert(invoice_action(false));

        let outcome = f
            .dispatcher
            .process_prompt("what is the weather", Uuid::new_v4())
            .await;
        assert!(matches!(outcome, ProcessOutcome::NoMatch { .. }));
        // No execution was created.
        assert_eq!(
            f.ledger
                .count_completed(Uuid::new_v4(), Uuid::new_v4(), Timestamp(0))
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_prompt_most_specific_trigger_wins() {
        let f = fixture();
        let mut generic = invoice_action(false);
        generic.name = "Generic".to_string();
        generic.trigger_phrase = Some("invoice".to_string());
        let mut specific = invoice_action(false);
        specific.name = "Specific".to_string();
        specific.trigger_phrase = Some("show invoice".to_string());
        specific.target_entity = Some("report".to_string());
        f.catalog.insert(generic);
        f.catalog.insert(specific);

        let outcome = f
            .dispatcher
            .process_prompt("show invoice please", Uuid::new_v4())
            .await;
        assert!(matches!(outcome, ProcessOutcome::Completed { .. }));
        // The longer trigger's action ran.
        assert_eq!(f.gateway.rows("report").len(), 1);
        assert!(f.gateway.rows("invoice").is_empty());
    }

    #[tokio::test]
    async fn test_prompt_requiring_approval_parks_pending() {
        let f = fixture();
        let mut action = invoice_action(true);
        action.spec.parameter_patterns.insert(
            "customer".to_string(),
            r"for\s+(\w+)".to_string(),
        );
        f.catalog.insert(action);

        let outcome = f
            .dispatcher
            .process_prompt("recent invoices for acme", Uuid::new_v4())
            .await;

        match outcome {
            ProcessOutcome::PendingApproval {
                execution_id,
                action_name,
                parameters,
                message,
            } => {
                assert_eq!(action_name, "Recent invoices");
                assert_eq!(parameters["customer"], "acme");
                assert!(message.contains("requires approval"));
                let execution = f.ledger.get(execution_id).await.unwrap();
                assert_eq!(execution.status, ExecutionStatus::Pending);
            }
            other => panic!("expected PendingApproval, got {:?}", other),
        }
        // Nothing ran yet.
        assert!(f.gateway.rows("invoice").is_empty());
    }

    #[tokio::test]
    async fn test_approve_then_run() {
        let f = fixture();
        f.catalog.insert(invoice_action(true));

        let outcome = f
            .dispatcher
            .process_prompt("recent invoices", Uuid::new_v4())
            .await;
        let execution_id = match outcome {
            ProcessOutcome::PendingApproval { execution_id, .. } => execution_id,
            other => panic!("expected PendingApproval, got {:?}", other),
        };

        let approver = Uuid::new_v4();
        let approved = f
            .dispatcher
            .approve(execution_id, approver, Some("fine".to_string()))
            .await
            .unwrap();
        assert_eq!(approved.status, ExecutionStatus::Approved);
        assert_eq!(approved.approved_by, Some(approver));

        let outcome = f.dispatcher.run_execution(execution_id).await;
        assert!(matches!(outcome, ProcessOutcome::Completed { .. }));
        assert_eq!(f.gateway.rows("invoice").len(), 1);
    }

    #[tokio::test]
    async fn test_approve_restricted_to_named_approvers() {
        let f = fixture();
        let approver = Uuid::new_v4();
        let mut action = invoice_action(true);
        action.approvers = vec![approver];
        f.catalog.insert(action);

        let outcome = f
            .dispatcher
            .process_prompt("recent invoices", Uuid::new_v4())
            .await;
        let execution_id = match outcome {
            ProcessOutcome::PendingApproval { execution_id, .. } => execution_id,
            other => panic!("expected PendingApproval, got {:?}", other),
        };

        let stranger = Uuid::new_v4();
        let err = f
            .dispatcher
            .approve(execution_id, stranger, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::NotApprover(id) if id == stranger));

        // The named approver succeeds.
        assert!(f.dispatcher.approve(execution_id, approver, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_pending_execution() {
        let f = fixture();
        f.catalog.insert(invoice_action(true));

        let outcome = f
            .dispatcher
            .process_prompt("recent invoices", Uuid::new_v4())
            .await;
        let execution_id = match outcome {
            ProcessOutcome::PendingApproval { execution_id, .. } => execution_id,
            other => panic!("expected PendingApproval, got {:?}", other),
        };

        let cancelled = f.dispatcher.cancel(execution_id).await.unwrap();
        assert_eq!(cancelled.status, ExecutionStatus::Cancelled);

        // A cancelled execution cannot run.
        let outcome = f.dispatcher.run_execution(execution_id).await;
        match outcome {
            ProcessOutcome::Error { message } => {
                assert!(message.contains("Invalid state transition"))
            }
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_daily_limit_fails_excess_execution() {
        let f = fixture();
        let mut action = invoice_action(false);
        action.max_executions_per_day = 1;
        let action_id = action.id;
        f.catalog.insert(action);
        let user = Uuid::new_v4();

        let first = f.dispatcher.process_prompt("recent invoices", user).await;
        assert!(matches!(first, ProcessOutcome::Completed { .. }));

        let second = f.dispatcher.process_prompt("recent invoices", user).await;
        match second {
            ProcessOutcome::Error { message } => {
                assert!(message.contains("Daily execution limit"))
            }
            other => panic!("expected Error, got {:?}", other),
        }

        // The counter never advanced past the limit.
        let completed = f
            .ledger
            .count_completed(action_id, user, Timestamp(0))
            .await
            .unwrap();
        assert_eq!(completed, 1);
        assert_eq!(f.gateway.rows("invoice").len(), 1);
    }

    #[tokio::test]
    async fn test_unsupported_kind_fails_execution() {
        let f = fixture();
        let mut action = invoice_action(false);
        action.kind = ActionKind::Delete;
        f.catalog.insert(action);

        let outcome = f
            .dispatcher
            .process_prompt("recent invoices", Uuid::new_v4())
            .await;
        match outcome {
            ProcessOutcome::Error { message } => {
                assert!(message.contains("not supported"));
                assert!(message.contains("delete"));
            }
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_pattern_reports_error_without_execution() {
        let f = fixture();
        let mut action = invoice_action(false);
        action
            .spec
            .parameter_patterns
            .insert("broken".to_string(), r"for\s+(\w+".to_string());
        f.catalog.insert(action);

        let outcome = f
            .dispatcher
            .process_prompt("recent invoices", Uuid::new_v4())
            .await;
        match outcome {
            ProcessOutcome::Error { message } => assert!(message.contains("broken")),
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_handler_failure_marks_execution_failed() {
        let f = fixture();
        let mut action = invoice_action(false);
        action.target_entity = None; // create handler requires one
        f.catalog.insert(action);

        let outcome = f
            .dispatcher
            .process_prompt("recent invoices", Uuid::new_v4())
            .await;
        match outcome {
            ProcessOutcome::Error { message } => {
                assert!(message.contains("no target entity"))
            }
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_completed_execution_updates_action_stats() {
        let f = fixture();
        let action = invoice_action(false);
        let action_id = action.id;
        f.catalog.insert(action);

        f.dispatcher
            .process_prompt("recent invoices", Uuid::new_v4())
            .await;

        let stored = f.catalog.get(action_id).await.unwrap().unwrap();
        assert_eq!(stored.execution_count, 1);
        assert!(stored.last_executed.is_some());
    }

    #[tokio::test]
    async fn test_disabled_engine_rejects_prompts() {
        let settings = ActionSettings {
            enabled: false,
            ..ActionSettings::default()
        };
        let f = fixture_with_settings(settings);
        f.catalog.insert(invoice_action(false));

        let outcome = f
            .dispatcher
            .process_prompt("recent invoices", Uuid::new_v4())
            .await;
        match outcome {
            ProcessOutcome::Error { message } => assert!(message.contains("disabled")),
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_oversized_prompt_rejected_before_matching() {
        let settings = ActionSettings {
            max_prompt_length: 10,
            ..ActionSettings::default()
        };
        let f = fixture_with_settings(settings);
        f.catalog.insert(invoice_action(false));

        let outcome = f
            .dispatcher
            .process_prompt("recent invoices recent invoices", Uuid::new_v4())
            .await;
        match outcome {
            ProcessOutcome::Error { message } => assert!(message.contains("exceeds")),
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_email_action_through_dispatcher() {
        let f = fixture();
        let mut action = invoice_action(false);
        action.kind = ActionKind::SendEmail;
        action.spec.email = Some(EmailSpec {
            to_field: "recipient".to_string(),
            subject: "Invoices".to_string(),
            body: "See attached.".to_string(),
        });
        action.spec.parameter_patterns.insert(
            "recipient".to_string(),
            r"to\s+(\S+@\S+)".to_string(),
        );
        f.catalog.insert(action);

        let outcome = f
            .dispatcher
            .process_prompt("send recent invoices to ops@example.com", Uuid::new_v4())
            .await;
        assert!(matches!(outcome, ProcessOutcome::Completed { .. }));
        assert_eq!(f.mailer.sent().len(), 1);
        assert_eq!(f.mailer.sent()[0].0, "ops@example.com");
    }

    #[tokio::test]
    async fn test_run_execution_unknown_id() {
        let f = fixture();
        let outcome = f.dispatcher.run_execution(Uuid::new_v4()).await;
        match outcome {
            ProcessOutcome::Error { message } => {
                assert!(message.contains("Execution not found"))
            }
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_pending_execution_is_invalid() {
        let f = fixture();
        f.catalog.insert(invoice_action(true));

        let outcome = f
            .dispatcher
            .process_prompt("recent invoices", Uuid::new_v4())
            .await;
        let execution_id = match outcome {
            ProcessOutcome::PendingApproval { execution_id, .. } => execution_id,
            other => panic!("expected PendingApproval, got {:?}", other),
        };

        // Running without approval is an invalid transition, not a run.
        let outcome = f.dispatcher.run_execution(execution_id).await;
        match outcome {
            ProcessOutcome::Error { message } => {
                assert!(message.contains("Invalid state transition"))
            }
            other => panic!("expected Error, got {:?}", other),
        }
        let execution = f.ledger.get(execution_id).await.unwrap();
        assert_eq!(execution.status, ExecutionStatus::Pending);
    }

    #[tokio::test]
    async fn test_empty_map_parameters_reach_handler() {
        let f = fixture();
        f.catalog.insert(invoice_action(false));

        let outcome = f
            .dispatcher
            .process_prompt("recent invoices", Uuid::new_v4())
            .await;
        match outcome {
            ProcessOutcome::Completed { execution_id, .. } => {
                let execution = f.ledger.get(execution_id).await.unwrap();
                assert!(execution.parameters.is_empty());
                assert_eq!(execution.original_prompt, "recent invoices");
            }
            other => panic!("expected Completed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrent_prompts_respect_daily_limit() {
        let f = fixture();
        let mut action = invoice_action(false);
        action.max_executions_per_day = 3;
        let action_id = action.id;
        f.catalog.insert(action);
        let user = Uuid::new_v4();

        let mut completed = 0;
        for _ in 0..6 {
            if matches!(
                f.dispatcher.process_prompt("recent invoices", user).await,
                ProcessOutcome::Completed { .. }
            ) {
                completed += 1;
            }
        }
        assert_eq!(completed, 3);
        assert_eq!(
            f.ledger
                .count_completed(action_id, user, Timestamp(0))
                .await
                .unwrap(),
            3
        );
    }
}
