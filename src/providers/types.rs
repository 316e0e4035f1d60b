// Backend response types and errors
//
// Shared by every model backend so the orchestrator sees one response shape
// regardless of which provider produced it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prompts::PromptStyle;

/// Token counts reported by a provider for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

/// Result of one model invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Raw generated text, persisted as-is
    pub content: String,

    /// Present only for backends that report usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl ModelResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Failures raised by backends.
///
/// Backends never substitute an empty response for a failure: an empty string
/// would look like a model that produced no emotion word.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to send request to {provider} API: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API request failed\n\nStatus: {status}\nBody: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("Malformed {provider} response: {reason}")]
    Malformed { provider: String, reason: String },

    #[error("{provider} backend does not accept {style:?} prompts")]
    UnsupportedPrompt { provider: String, style: PromptStyle },
}

impl BackendError {
    pub(crate) fn malformed(provider: &str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_total() {
        let usage = TokenUsage::new(100, 50);
        assert_eq!(usage.total_tokens, 150);
    }

    #[test]
    fn test_response_without_usage() {
        let response = ModelResponse::new("আনন্দ");
        assert_eq!(response.usage, None);

        let response = response.with_usage(TokenUsage::new(10, 2));
        assert_eq!(response.usage.map(|u| u.input_tokens), Some(10));
        assert_eq!(response.usage.map(|u| u.output_tokens), Some(2));
    }
}
