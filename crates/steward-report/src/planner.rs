//! Query planning: resolve a template's declared sources and filters
//! into per-source equality queries.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::aggregate::is_truthy;
use crate::types::ReportTemplate;

/// One planned query against the data store.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceQuery {
    pub source: String,
    pub entity: String,
    pub fields: Vec<String>,
    pub filters: BTreeMap<String, Value>,
}

/// Resolve a template into query requests, one per usable data source.
///
/// Caller-supplied overrides are merged shallowly over the template's
/// default filters for the same source; overrides win on key collision.
/// Filter entries with falsy values (null, false, zero, empty) are
/// dropped, and a source without an entity is skipped rather than
/// treated as an error.
pub fn plan(
    template: &ReportTemplate,
    overrides: &BTreeMap<String, BTreeMap<String, Value>>,
) -> Vec<SourceQuery> {
    let mut queries = Vec::new();

    for (source, spec) in &template.data_sources {
        let entity = match spec.entity.as_deref() {
            Some(e) if !e.is_empty() => e.to_string(),
            _ => {
                debug!(source = %source, "Skipping data source without entity");
                continue;
            }
        };

        let mut merged = template.filters.get(source).cloned().unwrap_or_default();
        if let Some(extra) = overrides.get(source) {
            for (field, value) in extra {
                merged.insert(field.clone(), value.clone());
            }
        }
        merged.retain(|_, value| is_truthy(value));

        queries.push(SourceQuery {
            source: source.clone(),
            entity,
            fields: spec.fields.clone(),
            filters: merged,
        });
    }

    queries
}
