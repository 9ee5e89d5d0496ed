use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, StewardError};

/// Top-level configuration for the Steward engine.
///
/// Loaded from a TOML file. Each section covers one engine concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StewardConfig {
    #[serde(default)]
    pub action: ActionSettings,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub narration: NarrationSettings,
}

impl StewardConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: StewardConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| StewardError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Action pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionSettings {
    /// Master switch for prompt-driven action processing.
    pub enabled: bool,
    /// Daily per-user execution quota applied when an action omits its own.
    pub default_daily_limit: u32,
    /// Prompts longer than this are rejected before matching.
    pub max_prompt_length: usize,
}

impl Default for ActionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            default_daily_limit: 10,
            max_prompt_length: 2000,
        }
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Upper bound on data sources a single template may declare.
    pub max_sources: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self { max_sources: 10 }
    }
}

/// Narration hook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationSettings {
    /// Whether narration is attempted at all.
    pub enabled: bool,
    /// Seconds to wait for the text-generation service before degrading.
    pub timeout_seconds: u64,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_seconds: 20,
        }
    }
}
