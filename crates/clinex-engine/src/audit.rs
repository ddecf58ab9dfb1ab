//! Audit artifacts: per-document snippet and field dumps

use crate::arbiter::FieldInfo;
use crate::error::EngineError;
use clinex_domain::{Field, Snippet};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Write the audit artifacts for one document under
/// `<out_dir>/artifacts/<document_id>/`.
///
/// `snippets.jsonl` holds one JSON object per extracted snippet in
/// extraction order; `extracted_fields.json` holds the full provenance
/// map keyed by field. Existing artifacts for the same document are
/// overwritten.
pub fn write_artifacts(
    out_dir: &Path,
    document_id: &str,
    snippets: &[Snippet],
    fields: &BTreeMap<Field, FieldInfo>,
) -> Result<(), EngineError> {
    let doc_dir = out_dir.join("artifacts").join(document_id);
    fs::create_dir_all(&doc_dir)?;

    let mut jsonl = fs::File::create(doc_dir.join("snippets.jsonl"))?;
    for snippet in snippets {
        serde_json::to_writer(&mut jsonl, snippet)?;
        jsonl.write_all(b"\n")?;
    }

    let rendered = serde_json::to_string_pretty(fields)?;
    fs::write(doc_dir.join("extracted_fields.json"), rendered)?;

    info!("Wrote audit artifacts for {} to {}", document_id, doc_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinex_domain::{FieldGroup, HitSource, SourceKind};
    use serde_json::json;

    #[test]
    fn test_write_artifacts_layout() {
        let dir = tempfile::tempdir().unwrap();
        let snippets = vec![Snippet {
            document_id: "GSE1".to_string(),
            field_group: FieldGroup::GaTrimester,
            source_kind: SourceKind::Html,
            section_title: "Methods".to_string(),
            text: "39 weeks".to_string(),
            locator: "offset:0".to_string(),
        }];
        let mut fields = BTreeMap::new();
        fields.insert(
            Field::PregnancyTrimester,
            FieldInfo {
                value: json!("3rd"),
                evidence: "39 weeks".to_string(),
                source: HitSource::Rule,
                locator: "offset:0".to_string(),
                confidence: 1.0,
            },
        );

        write_artifacts(dir.path(), "GSE1", &snippets, &fields).unwrap();

        let doc_dir = dir.path().join("artifacts").join("GSE1");
        let jsonl = fs::read_to_string(doc_dir.join("snippets.jsonl")).unwrap();
        assert_eq!(jsonl.lines().count(), 1);
        let line: serde_json::Value = serde_json::from_str(jsonl.lines().next().unwrap()).unwrap();
        assert_eq!(line["field_group"], "ga_trimester");

        let extracted = fs::read_to_string(doc_dir.join("extracted_fields.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&extracted).unwrap();
        assert_eq!(parsed["pregnancy_trimester"]["value"], "3rd");
        assert_eq!(parsed["pregnancy_trimester"]["source"], "rule");
    }

    #[test]
    fn test_empty_document_still_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), "EMPTY", &[], &BTreeMap::new()).unwrap();

        let doc_dir = dir.path().join("artifacts").join("EMPTY");
        assert_eq!(fs::read_to_string(doc_dir.join("snippets.jsonl")).unwrap(), "");
        assert_eq!(
            fs::read_to_string(doc_dir.join("extracted_fields.json")).unwrap(),
            "{}"
        );
    }
}
