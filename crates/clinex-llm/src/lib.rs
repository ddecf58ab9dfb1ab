//! Clinex LLM Backend Layer
//!
//! Pluggable implementations of the `LlmBackend` trait from
//! `clinex-domain`, plus the shared cost-tracking ledger.
//!
//! # Backends
//!
//! - `MockBackend`: deterministic mock for testing
//! - `OpenAiBackend`: OpenAI chat-completions API
//! - `AnthropicBackend`: Anthropic messages API
//!
//! # Examples
//!
//! ```
//! use clinex_llm::MockBackend;
//! use clinex_domain::LlmBackend;
//!
//! let backend = MockBackend::new(r#"{"confidence": 0.9, "evidence_quotes": []}"#);
//! let completion = backend
//!     .complete_structured("system", "user", &serde_json::json!({}))
//!     .unwrap();
//! assert_eq!(completion.body["confidence"], 0.9);
//! ```

#![warn(missing_docs)]

pub mod anthropic;
pub mod cost;
pub mod openai;

use clinex_domain::{LlmBackend, StructuredCompletion, TokenUsage};
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use anthropic::AnthropicBackend;
pub use cost::{CostEntry, CostTracker, ModelTotals, PricingConfig};
pub use openai::OpenAiBackend;

/// Errors that can occur during backend operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Response that could not be parsed as the expected JSON shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not available at the provider
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Mock backend for deterministic testing
///
/// Returns a pre-configured JSON body without network calls, counts
/// invocations, and can be scripted to fail or report itself
/// unavailable.
///
/// # Examples
///
/// ```
/// use clinex_llm::MockBackend;
/// use clinex_domain::LlmBackend;
///
/// let backend = MockBackend::new(r#"{"confidence": 0.5, "evidence_quotes": []}"#);
/// assert!(backend.is_available());
/// backend.complete_structured("s", "u", &serde_json::json!({})).unwrap();
/// assert_eq!(backend.call_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    provider: String,
    model: String,
    body: String,
    available: bool,
    fail: bool,
    usage: TokenUsage,
    call_count: Arc<Mutex<usize>>,
}

impl MockBackend {
    /// Create a mock that returns the given JSON body for every call
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            provider: "mock".to_string(),
            model: "mock-model".to_string(),
            body: body.into(),
            available: true,
            fail: false,
            usage: TokenUsage { prompt_tokens: 100, completion_tokens: 50 },
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Override the provider and model names
    pub fn with_identity(mut self, provider: impl Into<String>, model: impl Into<String>) -> Self {
        self.provider = provider.into();
        self.model = model.into();
        self
    }

    /// Mark the backend unavailable
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Make every call fail with a communication error
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Override the reported token usage
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Number of times `complete_structured` was invoked
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl LlmBackend for MockBackend {
    type Error = LlmError;

    fn provider(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn complete_structured(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _schema: &serde_json::Value,
    ) -> Result<StructuredCompletion, Self::Error> {
        *self.call_count.lock().unwrap() += 1;

        if self.fail {
            return Err(LlmError::Communication("mock failure".to_string()));
        }

        let body = serde_json::from_str(&self.body)
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        Ok(StructuredCompletion { body, usage: self.usage })
    }
}
