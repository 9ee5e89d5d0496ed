//! Template catalog seam.
//!
//! The engine reads templates and records usage through this trait; the
//! hosting application decides where templates actually live.

use std::sync::Mutex;

use async_trait::async_trait;
use steward_core::{Result, StewardError};
use uuid::Uuid;

use crate::types::{ReportCategory, ReportTemplate};

/// Read access to report templates plus usage bookkeeping.
#[async_trait]
pub trait TemplateCatalog: Send + Sync {
    /// Fetch a template by id. `None` when no such template exists.
    async fn get(&self, id: Uuid) -> Result<Option<ReportTemplate>>;

    /// List templates, optionally restricted to a category.
    async fn list(&self, category: Option<ReportCategory>) -> Result<Vec<ReportTemplate>>;

    /// Record one successful generation against the template.
    ///
    /// The catalog owns the counter; the engine never mutates a template
    /// it has read.
    async fn record_usage(&self, id: Uuid) -> Result<()>;
}

/// In-memory template catalog.
pub struct MemoryTemplates {
    templates: Mutex<Vec<ReportTemplate>>,
}

impl MemoryTemplates {
    pub fn new() -> Self {
        Self {
            templates: Mutex::new(Vec::new()),
        }
    }

    /// Add a template to the catalog.
    pub fn insert(&self, template: ReportTemplate) {
        if let Ok(mut templates) = self.templates.lock() {
            templates.push(template);
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<ReportTemplate>>> {
        self.templates
            .lock()
            .map_err(|e| StewardError::Storage(format!("template lock poisoned: {}", e)))
    }
}

impl Default for MemoryTemplates {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemplateCatalog for MemoryTemplates {
    async fn get(&self, id: Uuid) -> Result<Option<ReportTemplate>> {
        let templates = self.lock()?;
        Ok(templates.iter().find(|t| t.id == id).cloned())
    }

    async fn list(&self, category: Option<ReportCategory>) -> Result<Vec<ReportTemplate>> {
        let templates = self.lock()?;
        let mut result: Vec<ReportTemplate> = templates
            .iter()
            .filter(|t| category.map_or(true, |c| t.category == c))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    async fn record_usage(&self, id: Uuid) -> Result<()> {
        let mut templates = self.lock()?;
        let template = templates
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StewardError::Storage(format!("unknown template: {}", id)))?;
        template.usage_count += 1;
        Ok(())
    }
}
