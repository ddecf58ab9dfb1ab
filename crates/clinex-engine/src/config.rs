//! Configuration for the engine

use serde::{Deserialize, Serialize};

/// Numeric options for snippet windowing and the escalation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Window length in characters for snippet scanning
    pub window_chars: usize,

    /// Step between consecutive windows in characters
    pub window_step: usize,

    /// Windows kept per field group, highest score first
    pub max_snippets_per_field: usize,

    /// Below this confidence the filler escalates to the fallback backend
    pub escalate_confidence: f64,

    /// Reserved: confidence at which a result is accepted without review
    pub accept_confidence: f64,

    /// Confidence assigned to an LLM result with no evidence quotes,
    /// regardless of what the model reported
    pub no_evidence_confidence: f64,
}

impl EngineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.window_chars == 0 {
            return Err("window_chars must be greater than 0".to_string());
        }
        if self.window_step == 0 {
            return Err("window_step must be greater than 0".to_string());
        }
        if self.window_step > self.window_chars {
            return Err("window_step cannot exceed window_chars".to_string());
        }
        if self.max_snippets_per_field == 0 {
            return Err("max_snippets_per_field must be greater than 0".to_string());
        }
        for (name, value) in [
            ("escalate_confidence", self.escalate_confidence),
            ("accept_confidence", self.accept_confidence),
            ("no_evidence_confidence", self.no_evidence_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be in [0.0, 1.0]", name));
            }
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_chars: 1200,
            window_step: 400,
            max_snippets_per_field: 3,
            escalate_confidence: 0.60,
            accept_confidence: 0.70,
            no_evidence_confidence: 0.30,
        }
    }
}
