// Run settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::cost::ModelPricing;
use crate::prompts::{PromptStyle, PromptVersion};
use crate::providers::BackendKind;

/// Environment variable consulted when no `api_key` is configured
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("No API key configured. Set `api_key` in the config file or export {}", API_KEY_ENV)]
    MissingApiKey,

    #[error("Backend '{backend}' cannot send {style:?} prompts")]
    IncompatiblePromptStyle { backend: String, style: PromptStyle },
}

fn default_prompt_version() -> i64 {
    1
}

fn default_temperature() -> f32 {
    crate::providers::openai::DEFAULT_TEMPERATURE
}

fn default_timeout() -> u64 {
    crate::providers::openai::REQUEST_TIMEOUT_SECS
}

/// Everything one generation run needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Model identifier sent to the backend and used for pricing
    pub model: String,

    /// Template version; see `PromptVersion::from_number`
    #[serde(default = "default_prompt_version")]
    pub prompt_version: i64,

    /// Render chat prompts with this template version whatever `prompt_version` says
    #[serde(default)]
    pub pinned_prompt_version: Option<i64>,

    /// Root directory for output artifacts
    pub storage_folder_path: PathBuf,

    /// CSV dataset with `ID`, `text` and `Domain` columns
    pub emotion_data_path: PathBuf,

    #[serde(default)]
    pub backend: BackendKind,

    #[serde(default)]
    pub prompt_style: PromptStyle,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Endpoint override for either backend
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Extra or overriding per-token prices, keyed by model identifier
    #[serde(default)]
    pub pricing: HashMap<String, ModelPricing>,

    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Settings {
    /// Settings with defaults for everything but the required options
    pub fn new(
        model: impl Into<String>,
        storage_folder_path: impl Into<PathBuf>,
        emotion_data_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            model: model.into(),
            prompt_version: default_prompt_version(),
            pinned_prompt_version: None,
            storage_folder_path: storage_folder_path.into(),
            emotion_data_path: emotion_data_path.into(),
            backend: BackendKind::default(),
            prompt_style: PromptStyle::default(),
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            request_timeout_secs: default_timeout(),
            pricing: HashMap::new(),
            log_dir: None,
        }
    }

    pub fn prompt_version(&self) -> PromptVersion {
        PromptVersion::from_number(self.prompt_version)
    }

    pub fn pinned_prompt_version(&self) -> Option<PromptVersion> {
        self.pinned_prompt_version.map(PromptVersion::from_number)
    }

    /// Configured key, else the `OPENAI_API_KEY` environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|key| !key.trim().is_empty()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(invalid("model", "must not be empty"));
        }
        if self.storage_folder_path.as_os_str().is_empty() {
            return Err(invalid("storage_folder_path", "must not be empty"));
        }
        if self.emotion_data_path.as_os_str().is_empty() {
            return Err(invalid("emotion_data_path", "must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(invalid("temperature", "must be between 0.0 and 2.0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "must be positive"));
        }
        if self.backend == BackendKind::Openai && self.prompt_style != PromptStyle::Chat {
            return Err(ConfigError::IncompatiblePromptStyle {
                backend: self.backend.as_str().to_string(),
                style: self.prompt_style,
            });
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
