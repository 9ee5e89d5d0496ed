//! Action engine for Steward.
//!
//! Turns a free-text prompt into a safely executed side effect: matches
//! trigger phrases against configured actions, extracts parameters,
//! enforces per-user daily quotas, and drives each execution through its
//! approval and dispatch lifecycle.

pub mod catalog;
pub mod dispatcher;
pub mod error;
pub mod execution;
pub mod extractor;
pub mod gate;
pub mod gateway;
pub mod handler;
pub mod matcher;
pub mod types;

pub use catalog::{ActionCatalog, MemoryCatalog};
pub use dispatcher::Dispatcher;
pub use error::ActionError;
pub use execution::{ExecutionLedger, MemoryLedger};
pub use extractor::extract_parameters;
pub use gate::SafetyGate;
pub use matcher::match_actions;
pub use gateway::{EntityGateway, Mailer, MemoryGateway, MemoryMailer};
pub use handler::{ActionHandler, HandlerRegistry};
pub use types::{
    Action, ActionKind, ActionSpec, EmailSpec, Execution, ExecutionStatus, HandlerOutcome,
    ProcessOutcome,
};
