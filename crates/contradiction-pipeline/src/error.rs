//! Error type for the orchestrators and the `Repository`/`ObjectStore`
//! boundary they depend on.

use thiserror::Error;

/// Maximum length an orchestrator will store for a failure message, matching
/// the original worker's `str(e)[:500]` truncation.
pub const ERROR_MESSAGE_MAX_LEN: usize = 500;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("document {0} not found")]
    InvalidDocument(contradiction_ids::DocumentId),

    #[error("comparison session {0} not found")]
    InvalidSession(contradiction_ids::ComparisonSessionId),

    #[error("failed to fetch object from storage: {0}")]
    StorageFetch(String),

    #[error("failed to persist pipeline state: {0}")]
    Persistence(String),

    #[error(transparent)]
    Extraction(#[from] contradiction_nlp::ExtractionError),

    #[error("model failed to load or run: {0}")]
    Model(#[from] contradiction_nlp::ModelError),

    #[error(transparent)]
    Core(#[from] contradiction_core::CoreError),
}

impl PipelineError {
    /// Renders the error message truncated to [`ERROR_MESSAGE_MAX_LEN`]
    /// characters, suitable for storing on a `DocumentRecord`/`ComparisonSession`.
    #[must_use]
    pub fn truncated_message(&self) -> String {
        let message = self.to_string();
        if message.chars().count() > ERROR_MESSAGE_MAX_LEN {
            message.chars().take(ERROR_MESSAGE_MAX_LEN).collect()
        } else {
            message
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
