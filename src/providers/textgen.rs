// Self-hosted text-generation-webui backend
//
// Speaks the OpenAI-compatible extension of text-generation-webui. Chat
// prompts go to `/v1/chat/completions` in instruct mode, instruction strings
// to `/v1/completions`. The server reports no usage we rely on, so cost
// tracking is a no-op for this backend.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::openai::REQUEST_TIMEOUT_SECS;
use super::types::{BackendError, ModelResponse};
use super::ModelBackend;
use crate::prompts::{ChatTurn, GeneratedMessage, PromptStyle};

pub const DEFAULT_TEXTGEN_URL: &str = "http://127.0.0.1:5000";

#[derive(Clone)]
pub struct TextGenBackend {
    client: Client,
    base_url: String,
    provider_name: String,
}

impl TextGenBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            provider_name: "textgen".to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Sending request to {}", url);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|source| BackendError::Transport {
                provider: self.provider_name.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                provider: self.provider_name.clone(),
                status: status.as_u16(),
                body,
            }
            .into());
        }
        Ok(response)
    }

    async fn chat(&self, turns: &[ChatTurn]) -> Result<String> {
        let request = ChatRequest {
            mode: "instruct",
            messages: turns,
        };
        let response: ChatResponse = self
            .post("/v1/chat/completions", &request)
            .await?
            .json()
            .await
            .context("Failed to parse text-generation chat response")?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| BackendError::malformed(&self.provider_name, "no message content").into())
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = CompletionRequest { prompt };
        let response: CompletionResponse = self
            .post("/v1/completions", &request)
            .await?
            .json()
            .await
            .context("Failed to parse text-generation completion response")?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.text)
            .ok_or_else(|| BackendError::malformed(&self.provider_name, "no completion text").into())
    }
}

#[async_trait]
impl ModelBackend for TextGenBackend {
    async fn create_response(&self, message: &GeneratedMessage) -> Result<ModelResponse> {
        let content = match message {
            GeneratedMessage::Chat(turns) => self.chat(turns).await?,
            GeneratedMessage::Instruction(prompt) => self.complete(prompt).await?,
        };
        Ok(ModelResponse::new(content))
    }

    fn name(&self) -> &str {
        &self.provider_name
    }

    fn accepts(&self, _style: PromptStyle) -> bool {
        true
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    mode: &'a str,
    messages: &'a [ChatTurn],
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    text: Option<String>,
}
