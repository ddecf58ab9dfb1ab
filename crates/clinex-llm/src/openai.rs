//! OpenAI backend implementation
//!
//! Calls the chat-completions API with a JSON-schema response format so
//! the model returns a single parseable object. The engine drives this
//! backend synchronously; the async HTTP work runs on a private runtime
//! inside the blocking trait wrapper.

use crate::LlmError;
use clinex_domain::{LlmBackend, StructuredCompletion, TokenUsage};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Default OpenAI API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default timeout for completion requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// OpenAI structured-completion backend
pub struct OpenAiBackend {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: ApiUsage,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize, Default)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl OpenAiBackend {
    /// Create a new backend against the default endpoint
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT, api_key, model)
    }

    /// Create a new backend against a custom endpoint
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("reqwest client with static configuration");

        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }

    /// Create a backend from the `OPENAI_API_KEY` environment variable.
    /// A missing key yields an unavailable backend, not an error.
    pub fn from_env(model: impl Into<String>) -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        Self::new(api_key, model)
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema: &Value,
    ) -> Result<StructuredCompletion, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let request_body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": schema,
            },
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Communication(format!("HTTP {}: {}", status, error_text)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        debug!("OpenAI completion length: {} chars", content.len());

        let body: Value = serde_json::from_str(content)
            .map_err(|e| LlmError::InvalidResponse(format!("Completion is not JSON: {}", e)))?;

        Ok(StructuredCompletion {
            body,
            usage: TokenUsage {
                prompt_tokens: parsed.usage.prompt_tokens,
                completion_tokens: parsed.usage.completion_tokens,
            },
        })
    }
}

impl LlmBackend for OpenAiBackend {
    type Error = LlmError;

    fn provider(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn complete_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema: &Value,
    ) -> Result<StructuredCompletion, Self::Error> {
        // Blocking wrapper for the async call
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| LlmError::Other(format!("Runtime error: {}", e)))?;
        runtime.block_on(self.complete(system_prompt, user_prompt, schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_unavailable_without_key() {
        let backend = OpenAiBackend::new("", "gpt-4.1-mini");
        assert!(!backend.is_available());
    }

    #[test]
    fn test_backend_available_with_key() {
        let backend = OpenAiBackend::new("sk-test", "gpt-4.1-mini");
        assert!(backend.is_available());
        assert_eq!(backend.provider(), "openai");
        assert_eq!(backend.model(), "gpt-4.1-mini");
    }

    #[tokio::test]
    async fn test_communication_error_on_bad_endpoint() {
        let backend = OpenAiBackend::with_endpoint(
            "http://127.0.0.1:1",
            "sk-test",
            "gpt-4.1-mini",
        );
        let result = backend.complete("s", "u", &json!({})).await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
    }
}
