//! Generate-report action handler.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use steward_core::StewardError;
use steward_report::ReportGenerator;

use crate::error::ActionError;
use crate::handler::ActionHandler;
use crate::types::{Action, ActionKind, HandlerOutcome};

/// Drives the report engine for the action's configured template.
pub struct GenerateReportHandler {
    reports: Arc<ReportGenerator>,
}

impl GenerateReportHandler {
    pub fn new(reports: Arc<ReportGenerator>) -> Self {
        Self { reports }
    }
}

#[async_trait]
impl ActionHandler for GenerateReportHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::GenerateReport
    }

    async fn execute(
        &self,
        action: &Action,
        _parameters: &BTreeMap<String, String>,
    ) -> Result<HandlerOutcome, ActionError> {
        let template_id = action.spec.template_id.ok_or_else(|| {
            ActionError::InvalidConfig("generate_report action has no template id".to_string())
        })?;

        let report = self
            .reports
            .generate(template_id, &BTreeMap::new(), true)
            .await?;
        let sources = report.raw_data.len() as u64;
        tracing::info!(template = %report.template_name, sources, action = %action.name,
            "Report generated from action");

        let detail = serde_json::to_value(&report).map_err(StewardError::from)?;
        Ok(HandlerOutcome {
            records_affected: sources,
            detail,
        })
    }

    fn describe(&self, action: &Action, _parameters: &BTreeMap<String, String>) -> String {
        format!("Generate the report configured for \"{}\"", action.name)
    }
}
