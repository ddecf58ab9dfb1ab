//! Clinex Extraction Engine
//!
//! Extracts structured clinical metadata fields from free-text
//! scientific documents, reconciling deterministic pattern rules with an
//! LLM fallback into one auditable value per field.
//!
//! # Architecture
//!
//! ```text
//! Text → SnippetExtractor → RuleEngine → LlmFiller → Arbitrator → FieldTable
//! ```
//!
//! Per document: the text is normalized and scanned for candidate
//! evidence windows per field group; the rule battery claims whatever
//! fields it can with certainty; remaining fields go to the LLM filler,
//! which may escalate from the primary to the fallback backend when the
//! self-reported confidence is low; the arbitrator merges both sources
//! (rules strictly dominate) into the final field table plus audit
//! artifacts.
//!
//! # Example Usage
//!
//! ```
//! use clinex_engine::{DocumentRequest, Engine, EngineConfig, NoBackend};
//! use clinex_domain::SourceKind;
//!
//! let engine = Engine::<NoBackend, NoBackend>::rule_only(EngineConfig::default());
//! let request = DocumentRequest {
//!     document_id: "GSE0001".to_string(),
//!     text: Some("Participants were in the 1st trimester.".to_string()),
//!     source_kind: SourceKind::Xml,
//! };
//! let extraction = engine.extract(request, None);
//! assert!(extraction.problems.iter().all(|p| p.starts_with("Missing")));
//! ```

#![warn(missing_docs)]

mod arbiter;
mod audit;
mod config;
mod engine;
mod error;
mod filler;
mod normalize;
mod prompt;
mod rules;
mod snippets;

#[cfg(test)]
mod tests;

pub use arbiter::{merge, FieldInfo, MergeOutcome};
pub use audit::write_artifacts;
pub use config::EngineConfig;
pub use engine::{DocumentExtraction, DocumentRequest, Engine, NoBackend};
pub use error::EngineError;
pub use filler::fill_fields;
pub use rules::apply_rules;
pub use snippets::find_snippets;
