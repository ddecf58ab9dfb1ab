//! Provenance-tagged candidate values for single fields

use crate::field::Field;
use serde::{Deserialize, Serialize};

/// Which pipeline stage produced a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitSource {
    /// Deterministic pattern match within one snippet
    Rule,
    /// LLM fallback extraction
    Llm,
    /// Cross-snippet aggregation (complication lists)
    Aggregate,
}

impl HitSource {
    /// Stable machine name for audit artifacts
    pub fn as_str(&self) -> &'static str {
        match self {
            HitSource::Rule => "rule",
            HitSource::Llm => "llm",
            HitSource::Aggregate => "aggregate",
        }
    }
}

/// A single candidate value for one field, with its evidence trail.
///
/// At most one hit exists per field per document before arbitration;
/// the first writer wins and later matches are discarded. Rule hits
/// carry confidence 1.0 by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldHit {
    /// Field this hit proposes a value for
    pub field: Field,
    /// Whether the document provides the underlying datum at all
    pub provided: bool,
    /// Proposed value; `None` for pure presence hits
    pub value: Option<String>,
    /// Literal matched source text, cleaned
    pub evidence: String,
    /// Certainty in [0.0, 1.0]; fixed at 1.0 for rule hits
    pub confidence: f64,
    /// Stage that produced the hit
    pub source: HitSource,
    /// Opaque position reference into the source snippet
    pub locator: String,
}
