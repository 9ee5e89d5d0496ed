//! Update-records action handler.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ActionError;
use crate::gateway::EntityGateway;
use crate::handler::{substitute, ActionHandler};
use crate::types::{Action, ActionKind, HandlerOutcome};

/// Updates the records selected by the action's filters.
///
/// Filters are the action's configured equality pairs with `{param}`
/// placeholders resolved from the extracted parameters. Field values
/// come from the action's defaults overlaid with the parameters that are
/// not consumed by filter placeholders. The configured
/// `max_records_affected` is enforced before any write happens.
pub struct UpdateHandler {
    entities: Arc<dyn EntityGateway>,
}

impl UpdateHandler {
    pub fn new(entities: Arc<dyn EntityGateway>) -> Self {
        Self { entities }
    }
}

fn placeholder(name: &str) -> String {
    format!("{{{}}}", name)
}

#[async_trait]
impl ActionHandler for UpdateHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Update
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
                ActionError::InvalidConfig("update action has no target entity".to_string())
            })?;

        if action.spec.filters.is_empty() {
            return Err(ActionError::InvalidConfig(
                "update action has no filters".to_string(),
            ));
        }

        let filters: BTreeMap<String, Value> = action
            .spec
            .filters
            .iter()
            .map(|(field, value)| {
                let resolved = match value {
                    Value::String(s) => Value::String(substitute(s, parameters)),
                    other => other.clone(),
                };
                (field.clone(), resolved)
            })
            .collect();

        let matched = self.entities.select(entity, &filters).await?;
        let matched_count = matched.len() as u64;
        if matched_count > action.max_records_affected {
            return Err(ActionError::TooManyRecords {
                matched: matched_count,
                limit: action.max_records_affected,
            });
        }

        // Parameters referenced by a filter placeholder select records;
        // the rest become field values.
        let mut values = action.spec.defaults.clone();
        for (name, value) in parameters {
            let used_in_filter = action.spec.filters.values().any(
                |v| matches!(v, Value::String(s) if s.contains(&placeholder(name))),
            );
            if !used_in_filter {
                values.insert(name.clone(), Value::String(value.clone()));
            }
        }
        if values.is_empty() {
            return Err(ActionError::InvalidConfig(
                "update action has no field values".to_string(),
            ));
        }

        let affected = self.entities.update(entity, &filters, &values).await?;
        tracing::info!(entity = %entity, action = %action.name, affected, "Records updated");

        Ok(HandlerOutcome {
            records_affected: affected,
            detail: serde_json::json!({
                "entity": entity,
                "updated": affected,
            }),
        })
    }

    fn describe(&self, action: &Action, _parameters: &BTreeMap<String, String>) -> String {
        format!(
            "Update {} records",
            action.target_entity.as_deref().unwrap_or("<unset>")
        )
    }
}
