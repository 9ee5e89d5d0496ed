//! Grouping and metric calculation over fetched records.

use std::collections::BTreeMap;

use serde_json::Value;
use steward_core::Record;

use crate::types::{Aggregate, CalcSpec, GroupingSpec, SourceData};

/// Bucket key for records whose grouping field is absent or null.
pub const UNKNOWN_GROUP: &str = "Unknown";

/// Python-style truthiness over JSON values. Zero, empty, false, and
/// null all count as falsy; filter and metric handling both skip them.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn group_key(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => UNKNOWN_GROUP.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Partition records by the value of `field`, preserving input order
/// within each bucket. Every input record lands in exactly one bucket.
pub fn group_records(records: Vec<Record>, field: &str) -> BTreeMap<String, Vec<Record>> {
    let mut grouped: BTreeMap<String, Vec<Record>> = BTreeMap::new();
    for record in records {
        let key = group_key(record.get(field));
        grouped.entry(key).or_default().push(record);
    }
    grouped
}

/// Compute every configured metric over the records.
///
/// Values are collected per metric from records where the field is
/// present, truthy, and numeric. An empty value set yields 0 for every
/// operation — including avg, max, and min — so empty reports stay
/// well-formed rather than erroring.
pub fn calculate(records: Vec<Record>, calcs: &BTreeMap<String, CalcSpec>) -> Aggregate {
    let mut metrics = BTreeMap::new();
    for (name, spec) in calcs {
        let values: Vec<f64> = records
            .iter()
            .filter_map(|r| r.get(&spec.field))
            .filter(|v| is_truthy(v))
            .filter_map(|v| v.as_f64())
            .collect();

        let value = match spec.operation {
            crate::types::CalcOp::Sum => values.iter().sum(),
            crate::types::CalcOp::Avg => {
                if values.is_empty() {
                    0.0
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                }
            }
            crate::types::CalcOp::Count => values.len() as f64,
            crate::types::CalcOp::Max => values.iter().copied().reduce(f64::max).unwrap_or(0.0),
            crate::types::CalcOp::Min => values.iter().copied().reduce(f64::min).unwrap_or(0.0),
        };
        metrics.insert(name.clone(), value);
    }
    Aggregate { records, metrics }
}

/// Shape one source's records according to its grouping and calculation
/// configuration.
pub fn summarize(
    records: Vec<Record>,
    grouping: Option<&GroupingSpec>,
    calcs: Option<&BTreeMap<String, CalcSpec>>,
) -> SourceData {
    match (grouping, calcs) {
        (None, None) => SourceData::Records(records),
        (Some(g), None) => SourceData::Groups(group_records(records, &g.field)),
        (None, Some(c)) => SourceData::Aggregated(calculate(records, c)),
        (Some(g), Some(c)) => {
            let grouped = group_records(records, &g.field)
                .into_iter()
                .map(|(key, group)| (key, calculate(group, c)))
                .collect();
            SourceData::GroupedAggregates(grouped)
        }
    }
}
