use thiserror::Error;

/// Top-level error type for the Steward system.
///
/// Collaborator traits (catalogs, ledgers, data stores, gateways) speak
/// this type; feature crates define their own error enums and wrap it via
/// `#[from]` so the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StewardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StewardError>;

impl From<toml::de::Error> for StewardError {
    fn from(err: toml::de::Error) -> Self {
        StewardError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for StewardError {
    fn from(err: toml::ser::Error) -> Self {
        StewardError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for StewardError {
    fn from(err: serde_json::Error) -> Self {
        StewardError::Serialization(err.to_string())
    }
}
