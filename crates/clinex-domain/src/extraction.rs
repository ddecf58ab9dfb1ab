//! Post-processed output of one LLM extraction call

use crate::field::Field;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The post-processed result of a single structured LLM completion.
///
/// Values are kept as raw JSON (string, number, or array) because the
/// arbitrator owns final rendering. Confidence has already been coerced
/// to [0.0, 1.0] and floored when no evidence quotes were returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Non-null values the model proposed, keyed by field
    pub fields: BTreeMap<Field, Value>,
    /// Literal evidence strings the model quoted, cleaned
    pub evidence_quotes: Vec<String>,
    /// Overall self-reported confidence after policy post-processing
    pub confidence: f64,
}

impl ExtractionResult {
    /// Value the model proposed for a field, if any
    pub fn value(&self, field: Field) -> Option<&Value> {
        self.fields.get(&field)
    }
}
