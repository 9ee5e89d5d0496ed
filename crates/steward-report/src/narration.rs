//! Narration hook adapter.
//!
//! The engine's only narration responsibility is substituting report data
//! into the template's prompt and forwarding it to the external
//! text-generation service. Narration is optional: failure or timeout
//! never blocks returning the aggregated data.

use std::collections::BTreeMap;

use async_trait::async_trait;
use steward_core::Result;

use crate::types::SourceData;

/// Placeholder replaced with the report data as pretty-printed JSON.
pub const REPORT_DATA_PLACEHOLDER: &str = "{report_data}";

/// External text-generation service.
#[async_trait]
pub trait NarrationHook: Send + Sync {
    /// Generate prose for the given prompt. Fallible and rate/time-limited
    /// by the remote side.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Substitute the aggregated report data into a narration prompt template.
pub fn render_prompt(template: &str, raw_data: &BTreeMap<String, SourceData>) -> String {
    let json = serde_json::to_string_pretty(raw_data).unwrap_or_else(|_| "{}".to_string());
    template.replace(REPORT_DATA_PLACEHOLDER, &json)
}
