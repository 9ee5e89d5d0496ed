//! Action handler registry and trait definition.
//!
//! Each supported action kind maps to one handler. Handlers validate
//! their own required configuration and report records affected; the
//! dispatcher owns the lifecycle around them.

pub mod create;
pub mod generate_report;
pub mod send_email;
pub mod update;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use steward_report::ReportGenerator;

use crate::error::ActionError;
use crate::gateway::{EntityGateway, Mailer};
use crate::types::{Action, ActionKind, HandlerOutcome};

pub use create::CreateHandler;
pub use generate_report::GenerateReportHandler;
pub use send_email::SendEmailHandler;
pub use update::UpdateHandler;

/// A type-specific action executor.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// The action kind this handler serves.
    fn kind(&self) -> ActionKind;

    /// Run the action with the extracted parameters.
    async fn execute(
        &self,
        action: &Action,
        parameters: &BTreeMap<String, String>,
    ) -> Result<HandlerOutcome, ActionError>;

    /// Human-readable description for approval surfaces.
    fn describe(&self, action: &Action, parameters: &BTreeMap<String, String>) -> String;
}

/// Registry dispatching action kinds to their handlers.
pub struct HandlerRegistry {
    handlers: HashMap<ActionKind, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under its own kind, replacing any previous one.
    pub fn register(&mut self, handler: Arc<dyn ActionHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    /// Look up the handler for a kind. `delete` and `custom_code` have
    /// none and dispatch as unsupported.
    pub fn get(&self, kind: ActionKind) -> Option<&Arc<dyn ActionHandler>> {
        self.handlers.get(&kind)
    }

    /// Registry with the four standard handlers wired to their seams.
    pub fn standard(
        entities: Arc<dyn EntityGateway>,
        mailer: Arc<dyn Mailer>,
        reports: Arc<ReportGenerator>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CreateHandler::new(Arc::clone(&entities))));
        registry.register(Arc::new(UpdateHandler::new(entities)));
        registry.register(Arc::new(SendEmailHandler::new(mailer)));
        registry.register(Arc::new(GenerateReportHandler::new(reports)));
        registry
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace `{name}` placeholders with extracted parameter values.
pub fn substitute(template: &str, parameters: &BTreeMap<String, String>) -> String {
    let mut out = template.to_string();
    for (name, value) in parameters {
        out = out.replace(&format!("{{{}}}", name), value);
    }
    out
}
