//! OpenAI-compatible chat-completions client.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM and other endpoints that
//! speak the `/chat/completions` protocol.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::traits::{
    CompletionRequest, CompletionResponse, FinishReason, LlmError, LlmProvider, LlmResult,
    Message, Role, TokenUsage,
};
use crate::config::LlmSettings;

/// Default base URL for OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default base URL for OpenRouter API.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a Message> for ChatMessage<'a> {
    fn from(msg: &'a Message) -> Self {
        Self {
            role: match msg.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: &msg.content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Provider for OpenAI-compatible APIs.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    name: String,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatibleProvider {
    /// Creates a new provider for OpenAI's API.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::custom(OPENAI_BASE_URL, Some(api_key.into()), model).with_name("openai")
    }

    /// Creates a new provider for OpenRouter.
    pub fn openrouter(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::custom(OPENROUTER_BASE_URL, Some(api_key.into()), model).with_name("openrouter")
    }

    /// Creates a new provider for a custom endpoint.
    pub fn custom(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            name: "openai-compatible".to_string(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }

    /// Creates a provider from settings, reading the API key from the
    /// environment variable the settings name.
    pub fn from_settings(settings: &LlmSettings) -> LlmResult<Self> {
        let api_key = std::env::var(&settings.api_key_env).ok();
        if api_key.is_none() && settings.base_url.starts_with("https://") {
            return Err(LlmError::AuthenticationError(format!(
                "environment variable {} is not set",
                settings.api_key_env
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self::custom(&settings.base_url, api_key, &settings.model).with_client(client))
    }

    /// Overrides the name reported by [`LlmProvider::name`].
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Overrides the HTTP client (useful for custom timeouts or proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(ref api_key) = self.api_key {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", api_key)) {
                headers.insert(AUTHORIZATION, value);
            }
        }

        headers
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: request.messages.iter().map(ChatMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    fn parse_finish_reason(reason: Option<&str>) -> FinishReason {
        match reason {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Other,
        }
    }

    fn parse_response(body: ChatResponse) -> LlmResult<CompletionResponse> {
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        let tokens_used = body
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            text: choice.message.content.unwrap_or_default(),
            tokens_used,
            finish_reason: Self::parse_finish_reason(choice.finish_reason.as_deref()),
        })
    }

    async fn handle_error_response(&self, response: reqwest::Response) -> LlmError {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());

            return LlmError::RateLimited {
                retry_after_secs: retry_after,
            };
        }

        match response.json::<ErrorBody>().await {
            Ok(body) => {
                let invalid_key = body
                    .error
                    .code
                    .as_ref()
                    .and_then(|c| c.as_str())
                    .is_some_and(|c| c == "invalid_api_key");
                if status == 401 || invalid_key {
                    LlmError::AuthenticationError(body.error.message)
                } else {
                    LlmError::ApiError {
                        status,
                        message: body.error.message,
                    }
                }
            }
            Err(_) if status == 401 => LlmError::AuthenticationError(format!("HTTP {}", status)),
            Err(_) => LlmError::ApiError {
                status,
                message: format!("HTTP {}", status),
            },
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> LlmResult<CompletionResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(provider = %self.name, model = %self.model, "Sending completion request");
        let response = self
            .client
            .post(&url)
            .headers(self.build_headers())
            .json(&self.build_request(request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.handle_error_response(response).await);
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Self::parse_response(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialization() {
        let request = CompletionRequest::from_prompt("Terjemahkan")
            .with_temperature(Some(0.0))
            .with_max_tokens(Some(100));

        let provider = OpenAiCompatibleProvider::openrouter("test-key", "google/gemma-3-27b-it");
        let json = serde_json::to_value(provider.build_request(&request)).unwrap();

        assert_eq!(json["model"], "google/gemma-3-27b-it");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Terjemahkan");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["max_tokens"], 100);
    }

    #[test]
    fn request_omits_unset_options() {
        let request = CompletionRequest::from_prompt("hi");
        let provider = OpenAiCompatibleProvider::openai("key", "gpt-4o-mini");
        let json = serde_json::to_string(&provider.build_request(&request)).unwrap();

        assert!(!json.contains("temperature"));
        assert!(!json.contains("max_tokens"));
    }

    #[test]
    fn response_parsing() {
        let json = r#"{
            "choices": [{
                "message": {"content": "ambo suko makan"},
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 10,
                "completion_tokens": 5,
                "total_tokens": 15
            }
        }"#;

        let body: ChatResponse = serde_json::from_str(json).unwrap();
        let response = OpenAiCompatibleProvider::parse_response(body).unwrap();

        assert_eq!(response.text, "ambo suko makan");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.tokens_used.total_tokens, 15);
    }

    #[test]
    fn response_without_choices_is_invalid() {
        let body: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            OpenAiCompatibleProvider::parse_response(body),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn null_content_becomes_empty_text() {
        let body: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        let response = OpenAiCompatibleProvider::parse_response(body).unwrap();

        assert_eq!(response.text, "");
        assert_eq!(response.finish_reason, FinishReason::Other);
        assert_eq!(response.tokens_used, TokenUsage::default());
    }

    #[test]
    fn parse_finish_reason() {
        assert_eq!(
            OpenAiCompatibleProvider::parse_finish_reason(Some("length")),
            FinishReason::Length
        );
        assert_eq!(
            OpenAiCompatibleProvider::parse_finish_reason(Some("content_filter")),
            FinishReason::ContentFilter
        );
        assert_eq!(
            OpenAiCompatibleProvider::parse_finish_reason(None),
            FinishReason::Other
        );
    }

    #[test]
    fn named_constructors() {
        let openrouter = OpenAiCompatibleProvider::openrouter("k", "m");
        assert_eq!(openrouter.name(), "openrouter");
        assert_eq!(openrouter.base_url, OPENROUTER_BASE_URL);
        assert_eq!(openrouter.api_key.as_deref(), Some("k"));

        let openai = OpenAiCompatibleProvider::openai("k", "gpt-4o");
        assert_eq!(openai.name(), "openai");
        assert_eq!(openai.model(), "gpt-4o");
    }

    #[test]
    fn trailing_slash_removal() {
        let provider =
            OpenAiCompatibleProvider::custom("http://localhost:11434/v1/", None, "llama3");
        assert_eq!(provider.base_url, "http://localhost:11434/v1");
        assert_eq!(provider.name(), "openai-compatible");
    }

    #[test]
    fn from_settings_without_key_for_local_endpoint() {
        let settings = LlmSettings {
            base_url: "http://localhost:11434/v1".to_string(),
            api_key_env: "PADANAN_TEST_UNSET_KEY".to_string(),
            model: "llama3.2".to_string(),
            ..Default::default()
        };

        let provider = OpenAiCompatibleProvider::from_settings(&settings).unwrap();
        assert!(provider.api_key.is_none());
        assert_eq!(provider.model(), "llama3.2");
    }

    #[test]
    fn from_settings_requires_key_for_remote_endpoint() {
        let settings = LlmSettings {
            api_key_env: "PADANAN_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            OpenAiCompatibleProvider::from_settings(&settings),
            Err(LlmError::AuthenticationError(_))
        ));
    }
}
