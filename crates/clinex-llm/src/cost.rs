//! Shared cost-tracking ledger
//!
//! Worker threads processing different documents share one tracker; the
//! entry list is guarded by its own lock. Recording never affects
//! extraction outcome.

use clinex_domain::{CostSink, TokenUsage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;

/// Per-million-token prices for the two configured models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Primary provider name
    pub primary_provider: String,
    /// Primary model name
    pub primary_model: String,
    /// Fallback provider name
    pub fallback_provider: String,
    /// Fallback model name
    pub fallback_model: String,
    /// USD per million prompt tokens, primary model
    pub price_in_per_mtok_primary: f64,
    /// USD per million completion tokens, primary model
    pub price_out_per_mtok_primary: f64,
    /// USD per million prompt tokens, fallback model
    pub price_in_per_mtok_fallback: f64,
    /// USD per million completion tokens, fallback model
    pub price_out_per_mtok_fallback: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            primary_provider: "openai".to_string(),
            primary_model: "gpt-4.1-mini".to_string(),
            fallback_provider: "anthropic".to_string(),
            fallback_model: "claude-3.5-sonnet".to_string(),
            price_in_per_mtok_primary: 0.5,
            price_out_per_mtok_primary: 0.5,
            price_in_per_mtok_fallback: 3.0,
            price_out_per_mtok_fallback: 15.0,
        }
    }
}

/// One recorded backend invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEntry {
    /// Document the invocation was made for
    pub document_id: String,
    /// Provider name
    pub provider: String,
    /// Model name
    pub model: String,
    /// Prompt tokens consumed
    pub prompt_tokens: u64,
    /// Completion tokens produced
    pub completion_tokens: u64,
}

/// Aggregated usage for one provider:model pair
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelTotals {
    /// Total prompt tokens
    pub prompt_tokens: u64,
    /// Total completion tokens
    pub completion_tokens: u64,
    /// Estimated cost in USD
    pub cost: f64,
}

/// Append-only usage ledger shared across document workers
#[derive(Debug)]
pub struct CostTracker {
    pricing: PricingConfig,
    entries: Mutex<Vec<CostEntry>>,
}

impl CostTracker {
    /// Create a tracker with the given pricing table
    pub fn new(pricing: PricingConfig) -> Self {
        Self { pricing, entries: Mutex::new(Vec::new()) }
    }

    /// Snapshot of all recorded entries
    pub fn entries(&self) -> Vec<CostEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Aggregate totals keyed by "provider:model"
    pub fn totals(&self) -> BTreeMap<String, ModelTotals> {
        let entries = self.entries.lock().unwrap();
        let mut totals: BTreeMap<String, ModelTotals> = BTreeMap::new();
        for entry in entries.iter() {
            let key = format!("{}:{}", entry.provider, entry.model);
            let slot = totals.entry(key).or_default();
            slot.prompt_tokens += entry.prompt_tokens;
            slot.completion_tokens += entry.completion_tokens;
            slot.cost += self.cost_of(entry);
        }
        totals
    }

    /// Write `cost_report.json` (entries plus totals) under `out_dir`
    pub fn write_report(&self, out_dir: &Path) -> io::Result<()> {
        fs::create_dir_all(out_dir)?;
        let report = serde_json::json!({
            "entries": self.entries(),
            "totals": self.totals(),
        });
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(out_dir.join("cost_report.json"), rendered)
    }

    fn cost_of(&self, entry: &CostEntry) -> f64 {
        let p = &self.pricing;
        let (price_in, price_out) =
            if entry.provider == p.primary_provider && entry.model == p.primary_model {
                (p.price_in_per_mtok_primary, p.price_out_per_mtok_primary)
            } else if entry.provider == p.fallback_provider && entry.model == p.fallback_model {
                (p.price_in_per_mtok_fallback, p.price_out_per_mtok_fallback)
            } else {
                return 0.0;
            };
        price_in * entry.prompt_tokens as f64 / 1_000_000.0
            + price_out * entry.completion_tokens as f64 / 1_000_000.0
    }
}

impl CostSink for CostTracker {
    fn record(&self, document_id: &str, provider: &str, model: &str, usage: &TokenUsage) {
        self.entries.lock().unwrap().push(CostEntry {
            document_id: document_id.to_string(),
            provider: provider.to_string(),
            model: model.to_string(),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usage(prompt: u64, completion: u64) -> TokenUsage {
        TokenUsage { prompt_tokens: prompt, completion_tokens: completion }
    }

    #[test]
    fn test_record_and_totals() {
        let tracker = CostTracker::new(PricingConfig::default());
        tracker.record("DOC1", "openai", "gpt-4.1-mini", &usage(1_000_000, 1_000_000));
        tracker.record("DOC2", "openai", "gpt-4.1-mini", &usage(1_000_000, 0));

        let totals = tracker.totals();
        let slot = &totals["openai:gpt-4.1-mini"];
        assert_eq!(slot.prompt_tokens, 2_000_000);
        assert_eq!(slot.completion_tokens, 1_000_000);
        assert!((slot.cost - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_model_costs_nothing() {
        let tracker = CostTracker::new(PricingConfig::default());
        tracker.record("DOC1", "other", "model-x", &usage(5_000_000, 5_000_000));
        let totals = tracker.totals();
        assert_eq!(totals["other:model-x"].cost, 0.0);
    }

    #[test]
    fn test_fallback_pricing() {
        let tracker = CostTracker::new(PricingConfig::default());
        tracker.record("DOC1", "anthropic", "claude-3.5-sonnet", &usage(1_000_000, 1_000_000));
        let totals = tracker.totals();
        assert!((totals["anthropic:claude-3.5-sonnet"].cost - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_write_report() {
        let tracker = CostTracker::new(PricingConfig::default());
        tracker.record("DOC1", "openai", "gpt-4.1-mini", &usage(100, 50));

        let dir = tempfile::tempdir().unwrap();
        tracker.write_report(dir.path()).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("cost_report.json")).unwrap();
        let report: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(report["entries"].as_array().unwrap().len(), 1);
        assert!(report["totals"]["openai:gpt-4.1-mini"].is_object());
    }
}
