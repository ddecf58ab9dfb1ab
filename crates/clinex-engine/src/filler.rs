//! LLM fallback filler with two-tier escalation
//!
//! Fields the rule battery left unresolved are put to a primary
//! backend; only when the post-processed confidence falls below the
//! escalation threshold is the fallback backend consulted, keeping
//! whichever result reports higher confidence. Any single backend
//! failure is demoted to "that backend yielded nothing" and never
//! propagates.

use crate::config::EngineConfig;
use crate::normalize::normalize_quotes;
use crate::prompt::{response_schema, PromptBuilder, SYSTEM_PROMPT};
use clinex_domain::{CostSink, ExtractionResult, Field, LlmBackend, Snippet};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Escalation control flow, one transition per completed attempt
enum FillState {
    Primary,
    Escalate { primary: Option<ExtractionResult> },
    Done(Option<ExtractionResult>),
}

/// Fill unresolved fields from the candidate snippets via the LLM
/// backends.
///
/// Returns `None` when there is nothing to do (no missing fields, no
/// snippets, no available primary backend) or when every attempted
/// backend failed; both are normal terminal outcomes, not errors.
/// Successful invocations are recorded to the cost sink; recording
/// never affects the outcome. The fallback is consulted at most once.
pub fn fill_fields<P, F>(
    document_id: &str,
    config: &EngineConfig,
    snippets: &[Snippet],
    missing_fields: &[Field],
    primary: Option<&P>,
    fallback: Option<&F>,
    cost_sink: Option<&dyn CostSink>,
) -> Option<ExtractionResult>
where
    P: LlmBackend,
    F: LlmBackend,
{
    if missing_fields.is_empty() || snippets.is_empty() {
        return None;
    }
    let Some(primary) = primary.filter(|p| p.is_available()) else {
        info!("LLM disabled or unavailable; skipping LLM fill for {}", document_id);
        return None;
    };
    let fallback = fallback.filter(|f| f.is_available());

    let user_prompt = PromptBuilder::new(missing_fields, snippets).build();
    let schema = response_schema(missing_fields);

    let mut state = FillState::Primary;
    loop {
        state = match state {
            FillState::Primary => {
                let result = invoke(primary, document_id, &user_prompt, &schema, config, cost_sink);
                if escalation_required(result.as_ref(), config) && fallback.is_some() {
                    FillState::Escalate { primary: result }
                } else {
                    FillState::Done(result)
                }
            }
            FillState::Escalate { primary } => match fallback {
                Some(backend) => {
                    info!("Escalating {} to fallback model", document_id);
                    let escalated =
                        invoke(backend, document_id, &user_prompt, &schema, config, cost_sink);
                    FillState::Done(pick_winner(primary, escalated))
                }
                None => FillState::Done(primary),
            },
            FillState::Done(result) => return result,
        };
    }
}

/// Guard for the Primary → Escalate transition. A failed primary call
/// escalates unconditionally; a successful one escalates only below
/// the configured confidence threshold.
fn escalation_required(primary: Option<&ExtractionResult>, config: &EngineConfig) -> bool {
    match primary {
        Some(result) => result.confidence < config.escalate_confidence,
        None => true,
    }
}

/// Higher confidence wins; ties keep the primary result.
fn pick_winner(
    primary: Option<ExtractionResult>,
    escalated: Option<ExtractionResult>,
) -> Option<ExtractionResult> {
    match (primary, escalated) {
        (Some(p), Some(e)) => Some(if e.confidence > p.confidence { e } else { p }),
        (Some(p), None) => Some(p),
        (None, e) => e,
    }
}

/// One backend invocation. Failures are logged and absorbed.
fn invoke<B: LlmBackend>(
    backend: &B,
    document_id: &str,
    user_prompt: &str,
    schema: &Value,
    config: &EngineConfig,
    cost_sink: Option<&dyn CostSink>,
) -> Option<ExtractionResult> {
    match backend.complete_structured(SYSTEM_PROMPT, user_prompt, schema) {
        Ok(completion) => {
            if let Some(sink) = cost_sink {
                sink.record(document_id, backend.provider(), backend.model(), &completion.usage);
            }
            Some(post_process(completion.body, config))
        }
        Err(e) => {
            warn!("{} backend failed for {}: {}", backend.provider(), document_id, e);
            None
        }
    }
}

/// Normalize a raw completion body into an `ExtractionResult`.
///
/// Evidence quotes are trimmed and quote-normalized, non-string
/// entries dropped. Confidence is coerced to a float and clamped to
/// [0, 1]; with no evidence quotes it is forced to the configured
/// evidence-free value regardless of what the model reported. Every
/// `*_provided` field is reduced to exactly "yes"/"no" or dropped.
pub(crate) fn post_process(body: Value, config: &EngineConfig) -> ExtractionResult {
    let evidence_quotes: Vec<String> = body
        .get("evidence_quotes")
        .and_then(Value::as_array)
        .map(|quotes| {
            quotes
                .iter()
                .filter_map(Value::as_str)
                .map(|q| normalize_quotes(q.trim()))
                .filter(|q| !q.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let reported = body.get("confidence").and_then(coerce_f64).unwrap_or(0.0);
    let confidence = if evidence_quotes.is_empty() {
        config.no_evidence_confidence
    } else {
        reported.clamp(0.0, 1.0)
    };

    let mut fields = BTreeMap::new();
    for field in Field::ALL {
        if !field.llm_fillable() {
            continue;
        }
        let Some(raw) = body.get(field.key()) else { continue };
        if raw.is_null() {
            continue;
        }
        if field.key().ends_with("_provided") {
            if let Some(normalized) = normalize_yes_no(raw) {
                fields.insert(field, Value::from(normalized));
            }
            continue;
        }
        fields.insert(field, raw.clone());
    }

    ExtractionResult { fields, evidence_quotes, confidence }
}

/// "yes"/"no" (any casing) pass through lowercased; anything else is
/// treated as absent.
fn normalize_yes_no(value: &Value) -> Option<&'static str> {
    match value.as_str()?.trim().to_lowercase().as_str() {
        "yes" => Some("yes"),
        "no" => Some("no"),
        _ => None,
    }
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
