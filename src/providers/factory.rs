// Backend factory
//
// Creates the model backend selected by the run settings

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::openai::OpenAIBackend;
use super::textgen::{TextGenBackend, DEFAULT_TEXTGEN_URL};
use super::ModelBackend;
use crate::config::{ConfigError, Settings};

/// Which provider serves the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted OpenAI chat completions
    #[default]
    Openai,
    /// Self-hosted text-generation-webui
    Textgen,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Openai => "openai",
            Self::Textgen => "textgen",
        }
    }
}

/// Create the backend described by `settings`.
///
/// Settings are expected to have passed `Settings::validate`; the API key is
/// still checked here since it may come from the environment.
pub fn create_backend(settings: &Settings) -> Result<Box<dyn ModelBackend>> {
    let timeout = Duration::from_secs(settings.request_timeout_secs);

    match settings.backend {
        BackendKind::Openai => {
            let api_key = settings.resolve_api_key().ok_or(ConfigError::MissingApiKey)?;
            let mut backend = OpenAIBackend::new_openai(api_key, settings.model.clone())?
                .with_temperature(settings.temperature)
                .with_timeout(timeout)?;
            if let Some(url) = &settings.base_url {
                backend = backend.with_base_url(url.clone());
            }
            Ok(Box::new(backend))
        }

        BackendKind::Textgen => {
            let url = settings.base_url.as_deref().unwrap_or(DEFAULT_TEXTGEN_URL);
            let backend = TextGenBackend::with_timeout(url, timeout)
                .with_context(|| format!("Failed to create text-generation backend for {}", url))?;
            Ok(Box::new(backend))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::PromptStyle;

    fn settings(backend: BackendKind) -> Settings {
        let mut settings = Settings::new("gpt-4o", "out", "data.csv");
        settings.backend = backend;
        settings
    }

    #[test]
    fn test_openai_backend_with_configured_key() {
        let mut settings = settings(BackendKind::Openai);
        settings.api_key = Some("sk-test".to_string());

        let backend = create_backend(&settings).unwrap();
        assert_eq!(backend.name(), "openai");
        assert!(backend.reports_usage());
    }

    #[test]
    fn test_textgen_backend_accepts_both_styles() {
        let backend = create_backend(&settings(BackendKind::Textgen)).unwrap();
        assert_eq!(backend.name(), "textgen");
        assert!(!backend.reports_usage());
        assert!(backend.accepts(PromptStyle::Chat));
        assert!(backend.accepts(PromptStyle::Instruction));
    }
}
