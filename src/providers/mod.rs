// Model backends
//
// This module provides an abstraction layer over the model providers the
// pipeline can call: a hosted OpenAI-compatible chat endpoint that reports
// token usage, and a self-hosted text-generation-webui style endpoint that
// does not.

use anyhow::Result;
use async_trait::async_trait;

pub mod types;

// Backend implementations
pub mod openai;
pub mod textgen;

// Backend factory
pub mod factory;

pub use factory::{create_backend, BackendKind};
pub use openai::OpenAIBackend;
pub use textgen::TextGenBackend;
pub use types::{BackendError, ModelResponse, TokenUsage};

use crate::prompts::{GeneratedMessage, PromptStyle};

/// Trait for model backends
///
/// Implementations return an error for every failed call (network,
/// authentication, malformed payload). Callers decide whether a failure is
/// fatal.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Send one prompt and wait for the complete response
    async fn create_response(&self, message: &GeneratedMessage) -> Result<ModelResponse>;

    /// Backend name used in logs (e.g., "openai", "textgen")
    fn name(&self) -> &str;

    /// Whether responses carry token usage
    fn reports_usage(&self) -> bool {
        false
    }

    /// Whether this backend can send prompts of `style`
    fn accepts(&self, style: PromptStyle) -> bool {
        style == PromptStyle::Chat
    }
}
