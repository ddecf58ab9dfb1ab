//! Candidate evidence windows located in a document

use serde::{Deserialize, Serialize};

/// Thematic cluster of extraction targets sharing one keyword vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum FieldGroup {
    GaTrimester,
    Birthweight,
    Parity,
    Offspring,
    Sex,
    Race,
    Ancestry,
    Maternal,
    Paternal,
    ModeDelivery,
    PregnancyComplications,
    FetalComplications,
    Site,
}

impl FieldGroup {
    /// Every field group, in scoring-priority order
    pub const ALL: [FieldGroup; 13] = [
        FieldGroup::GaTrimester,
        FieldGroup::Birthweight,
        FieldGroup::Parity,
        FieldGroup::Offspring,
        FieldGroup::Sex,
        FieldGroup::Race,
        FieldGroup::Ancestry,
        FieldGroup::Maternal,
        FieldGroup::Paternal,
        FieldGroup::ModeDelivery,
        FieldGroup::PregnancyComplications,
        FieldGroup::FetalComplications,
        FieldGroup::Site,
    ];

    /// Stable machine name for audit artifacts
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldGroup::GaTrimester => "ga_trimester",
            FieldGroup::Birthweight => "birthweight",
            FieldGroup::Parity => "parity",
            FieldGroup::Offspring => "offspring",
            FieldGroup::Sex => "sex",
            FieldGroup::Race => "race",
            FieldGroup::Ancestry => "ancestry",
            FieldGroup::Maternal => "maternal",
            FieldGroup::Paternal => "paternal",
            FieldGroup::ModeDelivery => "mode_delivery",
            FieldGroup::PregnancyComplications => "pregnancy_complications",
            FieldGroup::FetalComplications => "fetal_complications",
            FieldGroup::Site => "site",
        }
    }
}

/// Format the document body was extracted from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum SourceKind {
    Html,
    Xml,
    PdfText,
}

impl SourceKind {
    /// Stable machine name for audit artifacts
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Html => "html",
            SourceKind::Xml => "xml",
            SourceKind::PdfText => "pdf_text",
        }
    }
}

/// A bounded window of normalized document text retrieved as a candidate
/// evidence span for one field group.
///
/// Snippets are immutable once created: the snippet extractor produces
/// them, the rule engine and the LLM filler consume them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    /// Opaque document identifier
    pub document_id: String,
    /// Field group whose keyword vocabulary selected this window
    pub field_group: FieldGroup,
    /// Format the document body came from
    pub source_kind: SourceKind,
    /// Nearest structural heading preceding the window, empty if none
    pub section_title: String,
    /// Normalized window text, bounded in length
    pub text: String,
    /// Opaque position reference, e.g. "offset:1234"
    pub locator: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_group_names_are_unique() {
        for (i, a) in FieldGroup::ALL.iter().enumerate() {
            for b in &FieldGroup::ALL[i + 1..] {
                assert_ne!(a.as_str(), b.as_str());
            }
        }
    }

    #[test]
    fn test_source_kind_serde() {
        let json = serde_json::to_string(&SourceKind::PdfText).unwrap();
        assert_eq!(json, "\"pdf_text\"");
    }

    #[test]
    fn test_snippet_round_trip() {
        let snippet = Snippet {
            document_id: "DOC1".to_string(),
            field_group: FieldGroup::Birthweight,
            source_kind: SourceKind::Xml,
            section_title: "Methods".to_string(),
            text: "birth weight 3500 g".to_string(),
            locator: "offset:0".to_string(),
        };
        let json = serde_json::to_string(&snippet).unwrap();
        let back: Snippet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snippet);
    }
}
