//! Anthropic backend implementation
//!
//! Calls the messages API with the system prompt split out per the wire
//! format, then parses the concatenated text blocks as JSON. The schema
//! hint is appended to the user prompt because the API has no native
//! response-format parameter.

use crate::LlmError;
use clinex_domain::{LlmBackend, StructuredCompletion, TokenUsage};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Default Anthropic API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com";

/// API version header required by the messages API
pub const API_VERSION: &str = "2023-06-01";

/// Default timeout for completion requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Maximum completion tokens requested per call
const MAX_TOKENS: u32 = 800;

/// Anthropic structured-completion backend
pub struct AnthropicBackend {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: ApiUsage,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Default)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl AnthropicBackend {
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

    /// Create a backend from the `ANTHROPIC_API_KEY` environment
    /// variable. A missing key yields an unavailable backend.
    pub fn from_env(model: impl Into<String>) -> Self {
        let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_default();
        Self::new(api_key, model)
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema: &Value,
    ) -> Result<StructuredCompletion, LlmError> {
        let url = format!("{}/v1/messages", self.endpoint);
        let user_content = format!(
            "{}\n\nRespond with a single JSON object matching this schema:\n{}",
            user_prompt, schema
        );
        let request_body = json!({
            "model": self.model,
            "system": system_prompt,
            "max_tokens": MAX_TOKENS,
            "temperature": 0,
            "messages": [{"role": "user", "content": user_content}],
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
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

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content: String = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect();

        debug!("Anthropic completion length: {} chars", content.len());

        let body: Value = serde_json::from_str(&content)
            .map_err(|e| LlmError::InvalidResponse(format!("Completion is not JSON: {}", e)))?;

        Ok(StructuredCompletion {
            body,
            usage: TokenUsage {
                prompt_tokens: parsed.usage.input_tokens,
                completion_tokens: parsed.usage.output_tokens,
            },
        })
    }
}

impl LlmBackend for AnthropicBackend {
    type Error = LlmError;

    fn provider(&self) -> &str {
        "anthropic"
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
