//! Clinex Domain Layer
//!
//! This crate contains the core data model for the clinical evidence
//! extraction engine. It defines the fixed field taxonomy, the evidence
//! value objects that flow between pipeline stages, and the trait
//! interfaces the engine depends on.
//!
//! ## Key Concepts
//!
//! - **Field**: one entry of the fixed clinical-field taxonomy
//! - **Snippet**: a candidate evidence window located in a document
//! - **FieldHit**: a single provenance-tagged value proposed for a field
//! - **ExtractionResult**: the post-processed output of one LLM call
//!
//! ## Architecture
//!
//! - Pure data and trait definitions only
//! - Infrastructure implementations (HTTP backends, cost ledger) live in
//!   other crates
//! - Every type that reaches the audit artifacts is serializable

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod extraction;
pub mod field;
pub mod hit;
pub mod snippet;
pub mod traits;

// Re-exports for convenience
pub use extraction::ExtractionResult;
pub use field::{Field, FieldKind};
pub use hit::{FieldHit, HitSource};
pub use snippet::{FieldGroup, Snippet, SourceKind};
pub use traits::{CostSink, LlmBackend, StructuredCompletion, TokenUsage};
