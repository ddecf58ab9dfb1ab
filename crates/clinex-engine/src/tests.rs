//! End-to-end pipeline tests with mock backends

use crate::{
    apply_rules, find_snippets, merge, DocumentRequest, Engine, EngineConfig, NoBackend,
};
use clinex_domain::{Field, HitSource, SourceKind};
use clinex_llm::{CostTracker, MockBackend, PricingConfig};

fn request(text: &str) -> DocumentRequest {
    DocumentRequest {
        document_id: "GSE1234".to_string(),
        text: Some(text.to_string()),
        source_kind: SourceKind::Html,
    }
}

const TRIMESTER_TEXT: &str =
    "Methods\nMaternal blood was collected in the 1st trimester. Gestational age at \
     delivery of 39 weeks was recorded for all participants.";

#[test]
fn test_pipeline_is_deterministic() {
    let config = EngineConfig::default();
    let a = find_snippets("GSE1234", TRIMESTER_TEXT, SourceKind::Html, &config);
    let b = find_snippets("GSE1234", TRIMESTER_TEXT, SourceKind::Html, &config);
    assert_eq!(a, b);

    let hits_a = apply_rules(&a);
    let hits_b = apply_rules(&b);
    assert_eq!(hits_a, hits_b);
}

#[test]
fn test_trimester_and_delivery_weeks_from_rules() {
    let engine = Engine::<NoBackend, NoBackend>::rule_only(EngineConfig::default());
    let extraction = engine.extract(request(TRIMESTER_TEXT), None);

    assert_eq!(extraction.row[Field::PregnancyTrimester.label()], "1st");
    assert_eq!(extraction.row[Field::GaAtDeliveryWeeks.label()], "39");
    assert_eq!(
        extraction.fields[&Field::PregnancyTrimester].source,
        HitSource::Rule
    );
}

#[test]
fn test_complication_list_aggregation() {
    let engine = Engine::<NoBackend, NoBackend>::rule_only(EngineConfig::default());
    let extraction = engine.extract(
        request("Cases included pregnancies complicated by preeclampsia and IUGR."),
        None,
    );

    let list = &extraction.row[Field::PregnancyComplicationsList.label()];
    assert!(list.contains("preeclampsia"));
    assert_eq!(
        extraction.fields[&Field::PregnancyComplicationsList].source,
        HitSource::Aggregate
    );
}

#[test]
fn test_rules_dominate_llm_end_to_end() {
    // The mock contradicts the rule battery; the rule value must win.
    let primary = MockBackend::new(
        r#"{"confidence": 0.95, "evidence_quotes": ["3rd trimester"], "pregnancy_trimester": "3rd"}"#,
    );
    let engine = Engine::new(EngineConfig::default(), Some(primary), None::<NoBackend>);
    let extraction = engine.extract(request(TRIMESTER_TEXT), None);

    assert_eq!(extraction.row[Field::PregnancyTrimester.label()], "1st");
    assert_eq!(
        extraction.fields[&Field::PregnancyTrimester].source,
        HitSource::Rule
    );
}

#[test]
fn test_llm_fills_unclaimed_fields() {
    let primary = MockBackend::new(
        r#"{"confidence": 0.85, "evidence_quotes": ["recruited at Mercy Hospital"],
            "hospital_center": "Mercy Hospital"}"#,
    );
    let engine = Engine::new(EngineConfig::default(), Some(primary), None::<NoBackend>);
    let extraction = engine.extract(
        request("Participants were recruited at the hospital in the 1st trimester."),
        None,
    );

    assert_eq!(extraction.row[Field::HospitalCenter.label()], "Mercy Hospital");
    assert_eq!(extraction.fields[&Field::HospitalCenter].source, HitSource::Llm);
    assert_eq!(extraction.fields[&Field::HospitalCenter].confidence, 0.85);
}

#[test]
fn test_confident_primary_suppresses_fallback() {
    let primary = MockBackend::new(
        r#"{"confidence": 0.8, "evidence_quotes": ["q"], "hospital_center": "Primary General"}"#,
    );
    let fallback = MockBackend::new(
        r#"{"confidence": 0.99, "evidence_quotes": ["q"], "hospital_center": "Fallback Clinic"}"#,
    );
    let engine =
        Engine::new(EngineConfig::default(), Some(primary.clone()), Some(fallback.clone()));
    let extraction = engine.extract(
        request("Participants were recruited at the hospital during pregnancy."),
        None,
    );

    assert_eq!(primary.call_count(), 1);
    assert_eq!(fallback.call_count(), 0);
    assert_eq!(extraction.row[Field::HospitalCenter.label()], "Primary General");
}

#[test]
fn test_low_confidence_primary_escalates() {
    let primary = MockBackend::new(
        r#"{"confidence": 0.4, "evidence_quotes": ["q"], "hospital_center": "Primary General"}"#,
    );
    let fallback = MockBackend::new(
        r#"{"confidence": 0.8, "evidence_quotes": ["q"], "hospital_center": "Fallback Clinic"}"#,
    );
    let engine =
        Engine::new(EngineConfig::default(), Some(primary.clone()), Some(fallback.clone()));
    let extraction = engine.extract(
        request("Participants were recruited at the hospital during pregnancy."),
        None,
    );

    assert_eq!(primary.call_count(), 1);
    assert_eq!(fallback.call_count(), 1);
    assert_eq!(extraction.row[Field::HospitalCenter.label()], "Fallback Clinic");
}

#[test]
fn test_failing_primary_escalates_to_fallback() {
    let primary = MockBackend::new("{}").failing();
    let fallback = MockBackend::new(
        r#"{"confidence": 0.8, "evidence_quotes": ["q"], "hospital_center": "Fallback Clinic"}"#,
    );
    let engine =
        Engine::new(EngineConfig::default(), Some(primary.clone()), Some(fallback.clone()));
    let extraction = engine.extract(
        request("Participants were recruited at the hospital during pregnancy."),
        None,
    );

    assert_eq!(fallback.call_count(), 1);
    assert_eq!(extraction.row[Field::HospitalCenter.label()], "Fallback Clinic");
}

#[test]
fn test_both_backends_failing_degrades_cleanly() {
    let primary = MockBackend::new("{}").failing();
    let fallback = MockBackend::new("{}").failing();
    let engine = Engine::new(EngineConfig::default(), Some(primary), Some(fallback));
    let extraction = engine.extract(
        request("Participants were recruited at the hospital during pregnancy."),
        None,
    );

    assert_eq!(extraction.row[Field::HospitalCenter.label()], "");
    assert!(extraction
        .problems
        .contains(&format!("Missing {}", Field::HospitalCenter.label())));
}

#[test]
fn test_evidence_free_confidence_floor() {
    // A model claiming 0.95 with no quotes is floored, which also
    // triggers escalation.
    let primary =
        MockBackend::new(r#"{"confidence": 0.95, "evidence_quotes": [], "hospital_center": "A"}"#);
    let fallback = MockBackend::new(
        r#"{"confidence": 0.9, "evidence_quotes": ["quoted"], "hospital_center": "B"}"#,
    );
    let engine =
        Engine::new(EngineConfig::default(), Some(primary), Some(fallback.clone()));
    let extraction = engine.extract(
        request("Participants were recruited at the hospital during pregnancy."),
        None,
    );

    assert_eq!(fallback.call_count(), 1);
    assert_eq!(extraction.fields[&Field::HospitalCenter].confidence, 0.9);
    assert_eq!(extraction.row[Field::HospitalCenter.label()], "B");
}

#[test]
fn test_unavailable_primary_skips_llm_entirely() {
    let primary = MockBackend::new(r#"{"confidence": 0.9, "evidence_quotes": ["q"]}"#).unavailable();
    let fallback = MockBackend::new(r#"{"confidence": 0.9, "evidence_quotes": ["q"]}"#);
    let engine =
        Engine::new(EngineConfig::default(), Some(primary.clone()), Some(fallback.clone()));
    engine.extract(
        request("Participants were recruited at the hospital during pregnancy."),
        None,
    );

    assert_eq!(primary.call_count(), 0);
    assert_eq!(fallback.call_count(), 0);
}

#[test]
fn test_cost_tracking_through_pipeline() {
    let primary = MockBackend::new(
        r#"{"confidence": 0.9, "evidence_quotes": ["q"], "hospital_center": "A"}"#,
    )
    .with_identity("openai", "gpt-4.1-mini");
    let tracker = CostTracker::new(PricingConfig::default());
    let engine = Engine::new(EngineConfig::default(), Some(primary), None::<NoBackend>);
    engine.extract(
        request("Participants were recruited at the hospital during pregnancy."),
        Some(&tracker),
    );

    let entries = tracker.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].document_id, "GSE1234");
    assert_eq!(entries[0].model, "gpt-4.1-mini");
    assert!(tracker.totals().contains_key("openai:gpt-4.1-mini"));
}

#[test]
fn test_merged_rows_are_byte_identical_across_runs() {
    let engine = Engine::<NoBackend, NoBackend>::rule_only(EngineConfig::default());
    let a = engine.extract(request(TRIMESTER_TEXT), None);
    let b = engine.extract(request(TRIMESTER_TEXT), None);

    let rendered_a = serde_json::to_string(&a.row).unwrap();
    let rendered_b = serde_json::to_string(&b.row).unwrap();
    assert_eq!(rendered_a, rendered_b);
}

#[test]
fn test_yes_no_columns_are_total_over_garbage_llm_output() {
    let primary = MockBackend::new(
        r#"{"confidence": "very", "evidence_quotes": [1, 2], "parity_provided": "perhaps"}"#,
    );
    let engine = Engine::new(EngineConfig::default(), Some(primary), None::<NoBackend>);
    let extraction = engine.extract(
        request("Parity and gravidity were assessed at the first study visit."),
        None,
    );

    for field in Field::ALL {
        if field.kind() == clinex_domain::FieldKind::YesNo {
            let value = &extraction.row[field.label()];
            assert!(value == "Yes" || value == "No", "{} rendered as {:?}", field.key(), value);
        }
    }
}

#[test]
fn test_artifact_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::<NoBackend, NoBackend>::rule_only(EngineConfig::default());
    let extraction = engine.extract(request(TRIMESTER_TEXT), None);

    crate::write_artifacts(dir.path(), &extraction.document_id, &extraction.snippets, &extraction.fields)
        .unwrap();

    let doc_dir = dir.path().join("artifacts").join("GSE1234");
    assert!(doc_dir.join("snippets.jsonl").exists());
    assert!(doc_dir.join("extracted_fields.json").exists());
}

#[test]
fn test_merge_without_pipeline_matches_pipeline_row() {
    let config = EngineConfig::default();
    let snippets = find_snippets("GSE1234", TRIMESTER_TEXT, SourceKind::Html, &config);
    let hits = apply_rules(&snippets);

    let mut problems = Vec::new();
    let outcome = merge(&hits, None, &mut problems);

    let engine = Engine::<NoBackend, NoBackend>::rule_only(config);
    let extraction = engine.extract(request(TRIMESTER_TEXT), None);
    assert_eq!(outcome.row, extraction.row);
}
