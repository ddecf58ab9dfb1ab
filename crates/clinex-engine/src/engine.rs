//! Top-level per-document extraction pipeline

use crate::arbiter::{merge, FieldInfo};
use crate::config::EngineConfig;
use crate::filler::fill_fields;
use crate::rules::apply_rules;
use crate::snippets::find_snippets;
use clinex_domain::{CostSink, Field, LlmBackend, Snippet, SourceKind, StructuredCompletion};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Placeholder backend for rule-only operation; never available and
/// never invoked.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBackend;

impl LlmBackend for NoBackend {
    type Error = String;

    fn provider(&self) -> &str {
        "none"
    }

    fn model(&self) -> &str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn complete_structured(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _schema: &Value,
    ) -> Result<StructuredCompletion, Self::Error> {
        Err("no backend configured".to_string())
    }
}

/// One document to extract from
#[derive(Debug, Clone)]
pub struct DocumentRequest {
    /// Opaque document identifier, carried through all outputs
    pub document_id: String,
    /// Free-text body; `None` or blank yields an all-empty extraction
    pub text: Option<String>,
    /// Format the body came from
    pub source_kind: SourceKind,
}

/// Complete extraction output for one document
#[derive(Debug, Clone)]
pub struct DocumentExtraction {
    /// Document identifier echoed from the request
    pub document_id: String,
    /// Final rendered values keyed by export column label
    pub row: BTreeMap<String, String>,
    /// Per-field provenance
    pub fields: BTreeMap<Field, FieldInfo>,
    /// Candidate evidence windows the pipeline worked from
    pub snippets: Vec<Snippet>,
    /// Human-readable diagnostics, e.g. missing critical fields
    pub problems: Vec<String>,
}

/// Extraction pipeline: snippets, rules, LLM fill, arbitration.
///
/// Generic over the primary and fallback backend types; use
/// [`Engine::rule_only`] when no backend is configured.
pub struct Engine<P, F> {
    config: EngineConfig,
    primary: Option<P>,
    fallback: Option<F>,
}

impl Engine<NoBackend, NoBackend> {
    /// Engine with no LLM backends; only the rule battery fills fields.
    pub fn rule_only(config: EngineConfig) -> Self {
        Engine { config, primary: None, fallback: None }
    }
}

impl<P, F> Engine<P, F>
where
    P: LlmBackend,
    F: LlmBackend,
{
    /// Engine with optional primary and fallback backends
    pub fn new(config: EngineConfig, primary: Option<P>, fallback: Option<F>) -> Self {
        Engine { config, primary, fallback }
    }

    /// Engine configuration in effect
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full pipeline over one document.
    ///
    /// Total over its input: a missing or blank body, a failing
    /// backend, or malformed LLM output all degrade to emptier results,
    /// never to an error. Yes/No columns are always populated.
    pub fn extract(
        &self,
        request: DocumentRequest,
        cost_sink: Option<&dyn CostSink>,
    ) -> DocumentExtraction {
        let mut problems = Vec::new();

        let text = request.text.unwrap_or_default();
        if text.trim().is_empty() {
            warn!("No text for {}; emitting empty extraction", request.document_id);
            problems.push("No document text".to_string());
        }

        let snippets =
            find_snippets(&request.document_id, &text, request.source_kind, &self.config);
        let rule_hits = apply_rules(&snippets);

        let claimed: Vec<Field> = rule_hits.iter().map(|h| h.field).collect();
        let missing: Vec<Field> = Field::ALL
            .into_iter()
            .filter(|f| f.llm_fillable() && !claimed.contains(f))
            .collect();

        let llm_result = fill_fields(
            &request.document_id,
            &self.config,
            &snippets,
            &missing,
            self.primary.as_ref(),
            self.fallback.as_ref(),
            cost_sink,
        );

        let outcome = merge(&rule_hits, llm_result.as_ref(), &mut problems);

        info!(
            "Extracted {}: {} snippets, {} rule hits, llm={}, {} problems",
            request.document_id,
            snippets.len(),
            rule_hits.len(),
            llm_result.is_some(),
            problems.len()
        );

        DocumentExtraction {
            document_id: request.document_id,
            row: outcome.row,
            fields: outcome.fields,
            snippets,
            problems,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str) -> DocumentRequest {
        DocumentRequest {
            document_id: "GSE0001".to_string(),
            text: Some(text.to_string()),
            source_kind: SourceKind::Html,
        }
    }

    #[test]
    fn test_rule_only_extraction() {
        let engine = Engine::<NoBackend, NoBackend>::rule_only(EngineConfig::default());
        let extraction = engine.extract(
            request("Samples were collected in the 1st trimester at delivery of 39 weeks."),
            None,
        );

        assert_eq!(extraction.row[Field::PregnancyTrimester.label()], "1st");
        assert!(!extraction.snippets.is_empty());
    }

    #[test]
    fn test_missing_text_is_total() {
        let engine = Engine::<NoBackend, NoBackend>::rule_only(EngineConfig::default());
        let extraction = engine.extract(
            DocumentRequest {
                document_id: "GSE0002".to_string(),
                text: None,
                source_kind: SourceKind::PdfText,
            },
            None,
        );

        assert!(extraction.snippets.is_empty());
        assert!(extraction.problems.contains(&"No document text".to_string()));
        // Yes/No columns still render.
        assert_eq!(extraction.row[Field::ParityProvided.label()], "No");
    }

    #[test]
    fn test_no_backend_is_never_available() {
        let backend = NoBackend;
        assert!(!backend.is_available());
        assert!(backend
            .complete_structured("s", "u", &serde_json::json!({}))
            .is_err());
    }
}
