//! Create-record action handler.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ActionError;
use crate::gateway::EntityGateway;
use crate::handler::ActionHandler;
use crate::types::{Action, ActionKind, HandlerOutcome};

/// Creates one record on the target entity from the action's default
/// values overlaid with extracted parameters (parameters win).
pub struct CreateHandler {
    entities: Arc<dyn EntityGateway>,
}

impl CreateHandler {
    pub fn new(entities: Arc<dyn EntityGateway>) -> Self {
        Self { entities }
    }
}

#[async_trait]
impl ActionHandler for CreateHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Create
    }

    async fn execute(
        &self,
        action: &Action,
        parameters: &BTreeMap<String, String>,
    ) -> Result<HandlerOutcome, ActionError> {
        let entity = action
            .target_entity
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                ActionError::InvalidConfig("create action has no target entity".to_string())
            })?;

        let mut values = action.spec.defaults.clone();
        for (name, value) in parameters {
            values.insert(name.clone(), Value::String(value.clone()));
        }

        let record_id = self.entities.create(entity, &values).await?;
        tracing::info!(entity = %entity, action = %action.name, "Record created");

        Ok(HandlerOutcome {
            records_affected: 1,
            detail: serde_json::json!({
                "entity": entity,
                "record_id": record_id,
            }),
        })
    }

    fn describe(&self, action: &Action, _parameters: &BTreeMap<String, String>) -> String {
        format!(
            "Create one {} record",
            action.target_entity.as_deref().unwrap_or("<unset>")
        )
    }
}
