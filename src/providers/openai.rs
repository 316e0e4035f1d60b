// OpenAI chat-completion backend
//
// Hosted provider: authenticated with a bearer key, reports exact token usage.
// Works for any OpenAI-compatible endpoint via `with_base_url`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::{BackendError, ModelResponse, TokenUsage};
use super::ModelBackend;
use crate::prompts::{ChatTurn, GeneratedMessage, PromptStyle};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

/// OpenAI API backend
#[derive(Clone)]
pub struct OpenAIBackend {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    provider_name: String,
}

impl OpenAIBackend {
    /// Create a backend for `model` on the public OpenAI API
    pub fn new_openai(api_key: String, model: impl Into<String>) -> Result<Self> {
        Self::new(
            api_key,
            DEFAULT_BASE_URL.to_string(),
            model.into(),
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }

    fn new(api_key: String, base_url: String, model: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url,
            model,
            temperature: DEFAULT_TEMPERATURE,
            provider_name: "openai".to_string(),
        })
    }

    /// Point at another OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(self)
    }

    fn to_openai_request<'a>(&'a self, turns: &'a [ChatTurn]) -> OpenAIRequest<'a> {
        OpenAIRequest {
            model: &self.model,
            messages: turns,
            temperature: self.temperature,
        }
    }

    fn from_openai_response(&self, response: OpenAIResponse) -> Result<ModelResponse> {
        let choice = response.choices.into_iter().next().ok_or_else(|| {
            BackendError::malformed(&self.provider_name, "OpenAI returned no choices in response")
        })?;

        let content = choice.message.content.ok_or_else(|| {
            BackendError::malformed(&self.provider_name, "choice message has no content")
        })?;

        let mut model_response = ModelResponse::new(content);
        match response.usage {
            Some(usage) => {
                model_response = model_response.with_usage(TokenUsage {
                    input_tokens: usage.prompt_tokens,
                    output_tokens: usage.completion_tokens,
                    total_tokens: usage.total_tokens,
                });
            }
            None => tracing::warn!("OpenAI response carried no usage block"),
        }

        Ok(model_response)
    }
}

#[async_trait]
impl ModelBackend for OpenAIBackend {
    async fn create_response(&self, message: &GeneratedMessage) -> Result<ModelResponse> {
        let turns = message.as_chat().ok_or_else(|| BackendError::UnsupportedPrompt {
            provider: self.provider_name.clone(),
            style: message.style(),
        })?;

        let openai_request = self.to_openai_request(turns);
        let url = format!("{}/v1/chat/completions", self.base_url);

        tracing::debug!("Sending request to OpenAI API: {:?}", openai_request);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&openai_request)
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

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI API response")?;

        tracing::debug!("Received response: {:?}", openai_response);

        self.from_openai_response(openai_response)
    }

    fn name(&self) -> &str {
        &self.provider_name
    }

    fn reports_usage(&self) -> bool {
        true
    }

    fn accepts(&self, style: PromptStyle) -> bool {
        style == PromptStyle::Chat
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Persona;
    use crate::prompts::{ChatPromptBuilder, PromptBuilder, PromptVersion};

    fn chat_message() -> GeneratedMessage {
        ChatPromptBuilder::new()
            .build("x", Some(Persona::Man), "d", PromptVersion::ClosedVocabulary)
            .unwrap()
    }

    fn backend(url: &str) -> OpenAIBackend {
        OpenAIBackend::new_openai("test-key".to_string(), "gpt-4o")
            .unwrap()
            .with_base_url(url)
    }

    #[test]
    fn test_openai_backend_identity() {
        let backend = OpenAIBackend::new_openai("test-key".to_string(), "gpt-4o").unwrap();
        assert_eq!(backend.name(), "openai");
        assert!(backend.reports_usage());
        assert!(!backend.accepts(PromptStyle::Instruction));
    }

    #[tokio::test]
    async fn test_create_response_with_usage() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::PartialJson(serde_json::json!({"model": "gpt-4o"})),
                mockito::Matcher::Regex(r#""role":"system""#.to_string()),
                mockito::Matcher::Regex(r#""role":"user""#.to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id":"c1","model":"gpt-4o","choices":[{"index":0,"message":{"role":"assistant","content":"আনন্দ"},"finish_reason":"stop"}],
                   "usage":{"prompt_tokens":120,"completion_tokens":3,"total_tokens":123}}"#,
            )
            .create_async()
            .await;

        let response = backend(&server.url())
            .create_response(&chat_message())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "আনন্দ");
        assert_eq!(
            response.usage,
            Some(TokenUsage {
                input_tokens: 120,
                output_tokens: 3,
                total_tokens: 123,
            })
        );
    }

    #[tokio::test]
    async fn test_auth_failure_is_raised() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":"invalid api key"}"#)
            .create_async()
            .await;

        let err = backend(&server.url())
            .create_response(&chat_message())
            .await
            .unwrap_err();

        match err.downcast_ref::<BackendError>() {
            Some(BackendError::Status { status, body, .. }) => {
                assert_eq!(*status, 401);
                assert!(body.contains("invalid api key"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_null_content_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#)
            .create_async()
            .await;

        let err = backend(&server.url())
            .create_response(&chat_message())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BackendError>(),
            Some(BackendError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn test_instruction_prompt_rejected() {
        let err = backend("http://127.0.0.1:9")
            .create_response(&GeneratedMessage::Instruction("### Instruction:\n".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BackendError>(),
            Some(BackendError::UnsupportedPrompt { .. })
        ));
    }
}
