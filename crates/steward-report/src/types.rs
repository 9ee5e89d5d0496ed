//! Core types for the report engine.
//!
//! Templates are declarative configuration parsed once at load time;
//! generated reports are transient values returned to the caller.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use steward_core::{Record, Timestamp};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Business area a template belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    Sales,
    Finance,
    Inventory,
    Hr,
    #[default]
    Custom,
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportCategory::Sales => write!(f, "sales"),
            ReportCategory::Finance => write!(f, "finance"),
            ReportCategory::Inventory => write!(f, "inventory"),
            ReportCategory::Hr => write!(f, "hr"),
            ReportCategory::Custom => write!(f, "custom"),
        }
    }
}

impl std::str::FromStr for ReportCategory {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sales" => Ok(ReportCategory::Sales),
            "finance" => Ok(ReportCategory::Finance),
            "inventory" => Ok(ReportCategory::Inventory),
            "hr" => Ok(ReportCategory::Hr),
            "custom" => Ok(ReportCategory::Custom),
            _ => Err(format!("Unknown report category: {}", s)),
        }
    }
}

/// Requested presentation of a generated report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Table,
    Chart,
    Mixed,
}

/// Aggregation operation over a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalcOp {
    Sum,
    Avg,
    Count,
    Max,
    Min,
}

impl fmt::Display for CalcOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcOp::Sum => write!(f, "sum"),
            CalcOp::Avg => write!(f, "avg"),
            CalcOp::Count => write!(f, "count"),
            CalcOp::Max => write!(f, "max"),
            CalcOp::Min => write!(f, "min"),
        }
    }
}

impl std::str::FromStr for CalcOp {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum" => Ok(CalcOp::Sum),
            "avg" => Ok(CalcOp::Avg),
            "count" => Ok(CalcOp::Count),
            "max" => Ok(CalcOp::Max),
            "min" => Ok(CalcOp::Min),
            _ => Err(format!("Unknown calculation operation: {}", s)),
        }
    }
}

// =============================================================================
// Template configuration
// =============================================================================

/// One declared data source: the entity to query and the fields to read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSourceSpec {
    /// Entity to query. A source without an entity is skipped by the planner.
    #[serde(default)]
    pub entity: Option<String>,
    /// Fields to read. Empty means every field the store returns.
    #[serde(default)]
    pub fields: Vec<String>,
}

/// Grouping directive for one data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingSpec {
    pub field: String,
}

/// One named calculation: a field and the operation applied to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalcSpec {
    pub field: String,
    pub operation: CalcOp,
}

/// A declarative report template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportTemplate {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub category: ReportCategory,
    #[serde(default)]
    pub data_sources: BTreeMap<String, DataSourceSpec>,
    /// Default equality filters, keyed by source name then field.
    #[serde(default)]
    pub filters: BTreeMap<String, BTreeMap<String, Value>>,
    #[serde(default)]
    pub grouping: BTreeMap<String, GroupingSpec>,
    /// Calculations, keyed by source name then calculation name.
    #[serde(default)]
    pub calculations: BTreeMap<String, BTreeMap<String, CalcSpec>>,
    /// Prompt template for narration; `{report_data}` is substituted with
    /// the aggregated data as JSON.
    #[serde(default)]
    pub narration_prompt: Option<String>,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default)]
    pub usage_count: u64,
}

// =============================================================================
// Generated output
// =============================================================================

/// Records plus the metrics computed over them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub records: Vec<Record>,
    pub metrics: BTreeMap<String, f64>,
}

/// Per-source result inside a generated report.
///
/// The variant depends on which of grouping/calculations the template
/// configured for the source. A failed fetch is carried per-source so the
/// rest of the report still generates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceData {
    Failed { error: String },
    Aggregated(Aggregate),
    GroupedAggregates(BTreeMap<String, Aggregate>),
    Groups(BTreeMap<String, Vec<Record>>),
    Records(Vec<Record>),
}

/// A generated report. Transient: owned by the caller, never persisted
/// by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedReport {
    pub template_name: String,
    pub generated_at: Timestamp,
    pub raw_data: BTreeMap<String, SourceData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
}
