//! Shared foundation for the Steward action and report engine.
//!
//! Holds the value types, configuration loading, and error currency used
//! by the feature crates.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod types;

pub use config::StewardConfig;
pub use error::{Result, StewardError};
pub use types::*;
