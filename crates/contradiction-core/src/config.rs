//! Pipeline configuration, loaded from a TOML file or environment overrides.
//!
//! This mirrors the subset of the original service's `Settings` that the
//! detection pipeline itself reads. HTTP, auth, and storage-provider
//! settings live in whatever `Repository`/`ObjectStore` implementation the
//! embedder binds, not here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Tunable parameters for the extraction, embedding, and decision stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory where downloaded model weights are cached between runs.
    pub model_cache_dir: PathBuf,
    /// Batch size for the NLI cross-encoder (C7).
    pub nli_batch_size: usize,
    /// Batch size for the sentence embedder (C3).
    pub embedding_batch_size: usize,
    /// Batch size for the NER model (C4); must stay above 128 per the
    /// model's throughput floor.
    pub ner_batch_size: usize,
    /// Minimum cosine similarity for two clauses within one document to
    /// become a candidate pair (C6).
    pub candidate_similarity_threshold: f32,
    /// Minimum cosine similarity for two clauses across documents to become
    /// a candidate pair (C6).
    pub cross_doc_similarity_threshold: f32,
    /// Minimum token-overlap ratio below which a candidate pair is dropped
    /// before NLI scoring (C8 pre-filter).
    pub overlap_prefilter_threshold: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model_cache_dir: PathBuf::from(".cache/models"),
            nli_batch_size: 64,
            embedding_batch_size: 50,
            ner_batch_size: 128,
            candidate_similarity_threshold: 0.82,
            cross_doc_similarity_threshold: 0.75,
            overlap_prefilter_threshold: 0.30,
        }
    }
}

impl Settings {
    /// Loads settings from a TOML file, falling back to defaults for any
    /// field the file omits.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Loads settings from an in-memory TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| CoreError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.nli_batch_size, 64);
        assert_eq!(s.embedding_batch_size, 50);
        assert_eq!(s.candidate_similarity_threshold, 0.82);
        assert_eq!(s.cross_doc_similarity_threshold, 0.75);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let s = Settings::from_toml_str("nli_batch_size = 32\n").unwrap();
        assert_eq!(s.nli_batch_size, 32);
        assert_eq!(s.embedding_batch_size, Settings::default().embedding_batch_size);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = Settings::from_toml_str("not valid = = toml").unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }
}
