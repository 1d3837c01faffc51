use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CasebookError, Result};

/// Top-level configuration for the Casebook application.
///
/// Loaded from `~/.casebook/config.toml` by default. Each section corresponds
/// to a bounded concern. The reasoning-service credential is deliberately
/// absent: it is read from the process environment at each invocation so
/// rotation takes effect immediately.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CasebookConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

impl CasebookConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CasebookConfig = toml::from_str(&content)?;
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
            toml::to_string_pretty(self).map_err(|e| CasebookError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory holding the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.casebook".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Reasoning-collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Model requested for text-only turns.
    pub reasoning_model: String,
    /// Model requested when any attachment is a PDF or image.
    pub multimodal_model: String,
    /// Base URL of the generateContent endpoint family.
    pub endpoint: String,
    /// Environment variable holding the API key, read at each call.
    pub api_key_env: String,
    /// Transport timeout for a single generate call, in seconds.
    pub request_timeout_secs: u64,
    /// Sampling temperature.
    pub temperature: f64,
    /// Thinking budget, in tokens.
    pub thinking_budget: u32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            reasoning_model: "gemini-3-pro-preview".to_string(),
            multimodal_model: "gemini-3-flash-preview".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            request_timeout_secs: 120,
            temperature: 0.15,
            thinking_budget: 16384,
        }
    }
}
