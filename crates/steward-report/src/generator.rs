//! Report generator: the pipeline from template id to generated report.
//!
//! Plans queries, fetches each source, applies grouping and calculations,
//! and optionally narrates the result. Source fetch failures and
//! narration failures degrade per-source / to no narration; only a
//! missing or invalid template fails the whole request.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use steward_core::config::{NarrationSettings, ReportSettings};
use steward_core::Timestamp;
use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregate::summarize;
use crate::catalog::TemplateCatalog;
use crate::datastore::DataStore;
use crate::error::ReportError;
use crate::narration::{render_prompt, NarrationHook};
use crate::planner::plan;
use crate::types::{GeneratedReport, ReportTemplate, SourceData};

/// Drives report generation against the template catalog and data store.
pub struct ReportGenerator {
    templates: Arc<dyn TemplateCatalog>,
    data: Arc<dyn DataStore>,
    narrator: Option<Arc<dyn NarrationHook>>,
    report_settings: ReportSettings,
    narration_settings: NarrationSettings,
}

impl ReportGenerator {
    /// Create a generator without a narration hook.
    pub fn new(
        templates: Arc<dyn TemplateCatalog>,
        data: Arc<dyn DataStore>,
        report_settings: ReportSettings,
        narration_settings: NarrationSettings,
    ) -> Self {
        Self {
            templates,
            data,
            narrator: None,
            report_settings,
            narration_settings,
        }
    }

    /// Attach a narration hook.
    pub fn with_narrator(mut self, hook: Arc<dyn NarrationHook>) -> Self {
        self.narrator = Some(hook);
        self
    }

    /// Generate a report from a template, applying caller filter overrides.
    ///
    /// `narrate` requests narration; it is honored only when narration is
    /// enabled in config and the template carries a prompt template.
    pub async fn generate(
        &self,
        template_id: Uuid,
        overrides: &BTreeMap<String, BTreeMap<String, Value>>,
        narrate: bool,
    ) -> Result<GeneratedReport, ReportError> {
        let template = self
            .templates
            .get(template_id)
            .await?
            .ok_or(ReportError::TemplateNotFound(template_id))?;

        if template.data_sources.len() > self.report_settings.max_sources {
            return Err(ReportError::TooManySources {
                declared: template.data_sources.len(),
                limit: self.report_settings.max_sources,
            });
        }

        let mut raw_data = BTreeMap::new();
        for query in plan(&template, overrides) {
            let data = match self
                .data
                .query(&query.entity, &query.filters, &query.fields)
                .await
            {
                Ok(records) => summarize(
                    records,
                    template.grouping.get(&query.source),
                    template.calculations.get(&query.source),
                ),
                Err(e) => {
                    warn!(source = %query.source, entity = %query.entity, error = %e,
                        "Data source fetch failed");
                    SourceData::Failed {
                        error: e.to_string(),
                    }
                }
            };
            raw_data.insert(query.source, data);
        }

        let narration = if narrate {
            self.narrate(&template, &raw_data).await
        } else {
            None
        };

        if let Err(e) = self.templates.record_usage(template_id).await {
            warn!(template = %template.name, error = %e, "Failed to record template usage");
        }

        info!(template = %template.name, sources = raw_data.len(),
            narrated = narration.is_some(), "Report generated");

        Ok(GeneratedReport {
            template_name: template.name,
            generated_at: Timestamp::now(),
            raw_data,
            narration,
        })
    }

    /// Run the narration hook, degrading to `None` on any failure.
    async fn narrate(
        &self,
        template: &ReportTemplate,
        raw_data: &BTreeMap<String, SourceData>,
    ) -> Option<String> {
        if !self.narration_settings.enabled {
            return None;
        }
        let hook = self.narrator.as_ref()?;
        let prompt_template = template.narration_prompt.as_deref()?;

        let prompt = render_prompt(prompt_template, raw_data);
        let timeout = Duration::from_secs(self.narration_settings.timeout_seconds);
        match tokio::time::timeout(timeout, hook.generate(&prompt)).await {
            Ok(Ok(text)) => Some(text),
            Ok(Err(e)) => {
                warn!(template = %template.name, error = %e,
                    "Narration failed, returning report without narration");
                None
            }
            Err(_) => {
                warn!(template = %template.name, timeout_seconds = self.narration_settings.timeout_seconds,
                    "Narration timed out, returning report without narration");
                None
            }
        }
    }
}
