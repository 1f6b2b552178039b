//! Error types shared across the contradiction detection pipeline.
//!
//! Each crate boundary gets its own `thiserror` enum (see
//! `contradiction-nlp::ExtractionError` and
//! `contradiction-pipeline::PipelineError`); this module holds the error
//! kinds that belong to the data model and configuration layer itself.

use thiserror::Error;

/// Errors that can occur while constructing or validating core data types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A contradiction was constructed referencing the same clause twice.
    #[error("a contradiction must reference two distinct clauses, got {0} twice")]
    SelfContradiction(contradiction_ids::ClauseId),

    /// An embedding vector had the wrong dimensionality.
    #[error("embedding has dimension {actual}, expected {expected}")]
    WrongEmbeddingDimension { expected: usize, actual: usize },

    /// A comparison session was constructed with too few or too many documents.
    #[error("comparison session must reference 2..=10 documents, got {0}")]
    InvalidDocumentCount(usize),

    /// A contradiction was constructed with confidence below the storage floor (50%).
    #[error("confidence {0:.1}% is below the 50% storage threshold")]
    ConfidenceTooLow(f64),

    /// Configuration failed to parse.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error surfaced while loading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for functions in this crate.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use contradiction_ids::ClauseId;

    #[test]
    fn self_contradiction_message_contains_id() {
        let id = ClauseId::new();
        let err = CoreError::SelfContradiction(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn wrong_dimension_display() {
        let err = CoreError::WrongEmbeddingDimension {
            expected: 384,
            actual: 128,
        };
        assert_eq!(
            err.to_string(),
            "embedding has dimension 128, expected 384"
        );
    }
}
