//! Text extraction, segmentation, and contradiction-scoring building blocks
//! for the contradiction detection pipeline.
//!
//! Each module corresponds to one stage of the analysis: pulling raw text
//! out of an uploaded file, splitting it into clauses, embedding and
//! tagging those clauses, finding similar pairs, running rule checks and
//! NLI over the candidates, and finally deciding which pairs are worth
//! keeping. `contradiction-pipeline` wires these stages into the two
//! orchestrators (single-document and cross-document).

pub mod candidates;
pub mod decision;
pub mod description;
pub mod embedder;
pub mod error;
pub mod extractor;
pub mod ner;
pub mod nli;
pub mod rules;
pub mod segmenter;

pub use candidates::{find_cross_document_candidates, find_intra_document_candidates, CandidatePair};
pub use decision::{decide, merge_candidates, prefilter_by_overlap, DecisionCandidate};
pub use description::build_semantic_description;
pub use embedder::{embed_all, SentenceEmbedder};
pub use error::{ExtractionError, ExtractionResult, ModelError, ModelResult};
pub use extractor::extract_text;
pub use ner::{check_entity_contradictions, extract_all, EntityExtractor, EntityMap, NoopEntityExtractor, RuleViolation};
pub use nli::{batch_nli_check, softmax, CrossEncoderModel, NliPair, NliScores};
pub use rules::{
    check_authority_mismatch, check_contradictions_batch, check_modal_mismatch, check_numeric_mismatch,
};
pub use segmenter::{extract_section_heading, section_headings_for, segment_clauses};
