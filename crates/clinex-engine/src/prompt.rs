//! Prompt and response-shape construction for the LLM filler

use clinex_domain::{Field, FieldKind, Snippet};
use serde_json::{json, Map, Value};

/// Fixed system prompt for both backends
pub(crate) const SYSTEM_PROMPT: &str =
    "You are a careful information extractor. Use ONLY the provided snippets.";

/// Builds the user prompt from the missing fields and candidate snippets
pub(crate) struct PromptBuilder<'a> {
    fields: &'a [Field],
    snippets: &'a [Snippet],
}

impl<'a> PromptBuilder<'a> {
    pub(crate) fn new(fields: &'a [Field], snippets: &'a [Snippet]) -> Self {
        Self { fields, snippets }
    }

    /// Build the complete user prompt: schema summary (field names
    /// only, values elided) followed by every snippet rendered with its
    /// locator and section title.
    pub(crate) fn build(&self) -> String {
        let schema_summary: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.key().to_string(), Value::from("...")))
            .collect();
        let schema_rendered = serde_json::to_string_pretty(&Value::Object(schema_summary))
            .unwrap_or_else(|_| "{}".to_string());

        let mut prompt = String::new();
        prompt.push_str("TASK: Fill the following fields strictly from the excerpts.\n");
        prompt.push_str(&format!("SCHEMA (names only):\n{}\n", schema_rendered));
        prompt.push_str("EXCERPTS:\n");
        for (idx, snip) in self.snippets.iter().enumerate() {
            prompt.push_str(&format!(
                "--- SNIPPET {} (locator: {} | section: {}) ---\n{}\n",
                idx + 1,
                snip.locator,
                snip.section_title,
                snip.text
            ));
        }
        prompt
    }
}

/// JSON-schema response-shape hint for the structured completion.
///
/// Week counts are numeric, complication lists are string arrays,
/// everything else is a nullable string. Evidence quotes and the
/// overall confidence are always required.
pub(crate) fn response_schema(fields: &[Field]) -> Value {
    let mut properties = Map::new();
    for field in fields {
        let type_hint = match field {
            Field::GaAtDeliveryWeeks | Field::GaAtCollectionWeeks => json!({"type": ["number", "null"]}),
            _ if field.kind() == FieldKind::List => {
                json!({"type": ["array", "null"], "items": {"type": "string"}})
            }
            _ => json!({"type": ["string", "null"]}),
        };
        properties.insert(field.key().to_string(), type_hint);
    }
    properties.insert(
        "evidence_quotes".to_string(),
        json!({"type": "array", "items": {"type": "string"}}),
    );
    properties.insert("confidence".to_string(), json!({"type": ["number", "null"]}));

    json!({
        "name": "clinical_extraction",
        "schema": {
            "type": "object",
            "properties": properties,
            "required": ["confidence", "evidence_quotes"],
        },
    })
}
