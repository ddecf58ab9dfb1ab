//! Arbitration: merging rule hits and LLM output into the final table

use crate::normalize::unique_preserve_order;
use clinex_domain::{ExtractionResult, Field, FieldHit, FieldKind, HitSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Consolidated export column labels
pub(crate) const EVIDENCE_COLUMN: &str = "Evidence (clinical)";
pub(crate) const SOURCE_COLUMN: &str = "Source (clinical)";
pub(crate) const CONFIDENCE_COLUMN: &str = "Confidence (clinical)";

/// Raw per-field provenance kept alongside the rendered row; persisted
/// verbatim as an audit artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Raw value before rendering (string, number, or array)
    pub value: Value,
    /// Literal evidence text backing the value
    pub evidence: String,
    /// Stage that produced the value
    pub source: HitSource,
    /// Opaque position reference
    pub locator: String,
    /// Certainty in [0.0, 1.0]
    pub confidence: f64,
}

/// Output of one merge: the rendered export row plus the raw per-field
/// info map.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Final values keyed by export column label, including the
    /// consolidated evidence/source/confidence columns
    pub row: BTreeMap<String, String>,
    /// Per-field provenance for the audit artifact
    pub fields: BTreeMap<Field, FieldInfo>,
}

/// Merge rule hits with the LLM result into the final field table.
///
/// Rule hits seed the table verbatim and strictly dominate: an LLM
/// value only fills a field no rule claimed. Yes/No fields always
/// render to exactly "Yes" or "No"; list fields render as a sorted,
/// deduplicated comma join. A missing critical field appends a
/// diagnostic to `problems`. Deterministic and idempotent over its
/// inputs.
pub fn merge(
    rule_hits: &[FieldHit],
    llm_result: Option<&ExtractionResult>,
    problems: &mut Vec<String>,
) -> MergeOutcome {
    let mut fields: BTreeMap<Field, FieldInfo> = BTreeMap::new();

    for hit in rule_hits {
        fields.entry(hit.field).or_insert_with(|| FieldInfo {
            value: match (&hit.value, hit.provided) {
                (Some(v), _) => Value::from(v.clone()),
                (None, true) => Value::from("yes"),
                (None, false) => Value::Null,
            },
            evidence: hit.evidence.clone(),
            source: hit.source,
            locator: hit.locator.clone(),
            confidence: hit.confidence,
        });
    }

    let llm_evidence: Vec<String> =
        llm_result.map(|r| r.evidence_quotes.clone()).unwrap_or_default();
    if let Some(result) = llm_result {
        for field in Field::ALL {
            if fields.contains_key(&field) {
                continue;
            }
            let Some(value) = result.value(field) else { continue };
            if value.is_null() || value.as_str() == Some("null") {
                continue;
            }
            fields.insert(
                field,
                FieldInfo {
                    value: value.clone(),
                    evidence: if llm_evidence.is_empty() {
                        "LLM inference".to_string()
                    } else {
                        llm_evidence.join("; ")
                    },
                    source: HitSource::Llm,
                    locator: "llm".to_string(),
                    confidence: result.confidence,
                },
            );
        }
    }

    let mut row = BTreeMap::new();
    for field in Field::ALL {
        let info = fields.get(&field);
        let rendered = match field.kind() {
            FieldKind::YesNo => render_yes_no(info.map(|i| &i.value)),
            FieldKind::List => render_list(info.map(|i| &i.value)),
            FieldKind::Scalar => render_scalar(info.map(|i| &i.value)),
        };
        if rendered.is_empty() && field.is_critical() {
            problems.push(format!("Missing {}", field.label()));
        }
        row.insert(field.label().to_string(), rendered);
    }

    // Consolidated evidence, source, and confidence columns
    let mut evidences: Vec<String> = Vec::new();
    let mut sources: Vec<&str> = Vec::new();
    let mut max_confidence: Option<f64> = None;
    for info in fields.values() {
        if !info.evidence.is_empty() {
            evidences.push(info.evidence.clone());
        }
        sources.push(info.source.as_str());
        max_confidence = Some(max_confidence.map_or(info.confidence, |m| m.max(info.confidence)));
    }
    evidences.extend(llm_evidence);

    row.insert(EVIDENCE_COLUMN.to_string(), unique_preserve_order(evidences).join("; "));
    row.insert(SOURCE_COLUMN.to_string(), unique_preserve_order(sources).join("; "));
    row.insert(
        CONFIDENCE_COLUMN.to_string(),
        max_confidence.map(|c| c.to_string()).unwrap_or_default(),
    );

    MergeOutcome { row, fields }
}

/// Any truthy "yes" renders to "Yes"; everything else, including an
/// absent field, renders to "No".
fn render_yes_no(value: Option<&Value>) -> String {
    let is_yes = value
        .and_then(Value::as_str)
        .map(|s| s.trim().eq_ignore_ascii_case("yes"))
        .unwrap_or(false);
    if is_yes { "Yes" } else { "No" }.to_string()
}

/// Collections render as a sorted, deduplicated comma join; anything
/// else passes through as a scalar.
fn render_list(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(items)) => {
            let names: std::collections::BTreeSet<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            names.into_iter().collect::<Vec<_>>().join(", ")
        }
        other => render_scalar(other),
    }
}

fn render_scalar(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
