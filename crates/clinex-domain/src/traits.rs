//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the engine and its
//! infrastructure. Concrete backends and the cost ledger live in
//! `clinex-llm`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token accounting for one backend invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u64,
    /// Tokens produced in the completion
    pub completion_tokens: u64,
}

/// Parsed response plus usage accounting from one backend invocation
#[derive(Debug, Clone)]
pub struct StructuredCompletion {
    /// Parsed JSON body of the completion
    pub body: Value,
    /// Token usage reported by the provider
    pub usage: TokenUsage,
}

/// Trait for structured-JSON LLM completion backends
///
/// A backend exposes exactly one operation: complete structured JSON
/// given a system prompt, a user prompt, and a response-shape hint.
/// Provider specifics (endpoints, auth, wire shapes) stay behind this
/// seam.
pub trait LlmBackend {
    /// Error type for backend operations
    type Error: std::fmt::Display;

    /// Provider name, e.g. "openai"
    fn provider(&self) -> &str;

    /// Model name, e.g. "gpt-4.1-mini"
    fn model(&self) -> &str;

    /// Whether the backend is configured and usable. An unavailable
    /// backend is skipped, not an error.
    fn is_available(&self) -> bool;

    /// Complete a structured JSON response
    fn complete_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema: &Value,
    ) -> Result<StructuredCompletion, Self::Error>;
}

/// Trait for recording token usage of successful backend invocations
///
/// Recording is a side effect for later cost reporting and never
/// affects extraction outcome.
pub trait CostSink {
    /// Record usage for one invocation
    fn record(&self, document_id: &str, provider: &str, model: &str, usage: &TokenUsage);
}
