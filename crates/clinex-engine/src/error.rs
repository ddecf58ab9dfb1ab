//! Error types for the engine

use thiserror::Error;

/// Errors that can occur outside the no-fail extraction path.
///
/// Extraction itself never returns an error; these cover configuration
/// validation and audit-artifact persistence.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audit artifact I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Audit artifact serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
