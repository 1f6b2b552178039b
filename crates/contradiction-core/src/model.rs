//! Data model shared by every stage of the pipeline: clauses extracted from
//! a document, contradictions found between them, and the two session types
//! that track progress (single-document and cross-document comparison).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use contradiction_ids::{ClauseId, ComparisonSessionId, ContradictionId, DocumentId};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Dimensionality of every embedding produced by the pipeline. Fixed by the
/// sentence-embedding model; any vector of a different length is rejected.
pub const EMBEDDING_DIM: usize = 384;

/// A single sentence- or bullet-level unit of text extracted from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub id: ClauseId,
    pub document_id: DocumentId,
    pub text: String,
    /// Zero-based ordinal position within the document, used for tie-breaking
    /// and for reconstructing surrounding context in descriptions.
    pub position: u32,
    pub section: Option<String>,
    pub embedding: Option<Vec<f32>>,
    /// Named-entity groups keyed by label (`"MONEY"`, `"DATE"`, ...), empty
    /// until C4 runs and still empty if NER degrades gracefully.
    pub entities: BTreeMap<String, Vec<String>>,
}

impl Clause {
    pub fn new(
        id: ClauseId,
        document_id: DocumentId,
        text: impl Into<String>,
        position: u32,
        section: Option<String>,
    ) -> Self {
        Self {
            id,
            document_id,
            text: text.into(),
            position,
            section,
            embedding: None,
            entities: BTreeMap::new(),
        }
    }

    /// Attach an embedding, rejecting anything that isn't [`EMBEDDING_DIM`]
    /// wide so a silently-truncated vector never reaches storage.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Result<Self> {
        if embedding.len() != EMBEDDING_DIM {
            return Err(CoreError::WrongEmbeddingDimension {
                expected: EMBEDDING_DIM,
                actual: embedding.len(),
            });
        }
        self.embedding = Some(embedding);
        Ok(self)
    }

    pub fn has_embedding(&self) -> bool {
        self.embedding.as_ref().is_some_and(|e| e.len() == EMBEDDING_DIM)
    }
}

/// How confident the pipeline is that two clauses actually contradict.
///
/// `Low` is a reserved variant: the decision stage (C8) never emits
/// confidence below 50%, so nothing constructs it today, but it stays part
/// of the public enum so a future gate relaxation doesn't require a
/// breaking schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Maps a confidence percentage (0.0..=100.0) to a severity, or `None`
    /// below the 50% storage floor, where the contradiction is discarded
    /// rather than kept at `Low`.
    #[must_use]
    pub fn from_confidence_percent(percent: f64) -> Option<Self> {
        if percent >= 90.0 {
            Some(Severity::High)
        } else if percent >= 50.0 {
            Some(Severity::Medium)
        } else {
            None
        }
    }
}

/// The rule or signal family that flagged a contradiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionType {
    Numeric,
    Modal,
    Authority,
    Entity,
    Date,
    Financial,
    Location,
    Quantity,
    Semantic,
}

/// Which session a contradiction belongs to: a single document's internal
/// review, or a pairing within a multi-document comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContradictionOwner {
    Document(DocumentId),
    Comparison {
        session: ComparisonSessionId,
        document_a: DocumentId,
        document_b: DocumentId,
    },
}

/// A detected contradiction between exactly two clauses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contradiction {
    pub id: ContradictionId,
    /// Clause ids, canonically ordered so `(a, b)` and `(b, a)` never
    /// produce two distinct storage rows for the same pair.
    pub clause_a_id: ClauseId,
    pub clause_b_id: ClauseId,
    pub owner: ContradictionOwner,
    pub kind: ContradictionType,
    pub severity: Severity,
    pub confidence: f64,
    /// Human-readable explanation.
    pub description: String,
}

impl Contradiction {
    /// Builds a contradiction, enforcing the invariants that a contradiction
    /// references two distinct clauses and carries confidence at or above
    /// the 50% storage floor.
    pub fn new(
        clause_a_id: ClauseId,
        clause_b_id: ClauseId,
        owner: ContradictionOwner,
        kind: ContradictionType,
        confidence_percent: f64,
        description: impl Into<String>,
    ) -> Result<Self> {
        if clause_a_id == clause_b_id {
            return Err(CoreError::SelfContradiction(clause_a_id));
        }
        let severity = Severity::from_confidence_percent(confidence_percent)
            .ok_or(CoreError::ConfidenceTooLow(confidence_percent))?;

        let (clause_a_id, clause_b_id) = if clause_a_id <= clause_b_id {
            (clause_a_id, clause_b_id)
        } else {
            (clause_b_id, clause_a_id)
        };

        let description = description.into();

        Ok(Self {
            id: ContradictionId::new(),
            clause_a_id,
            clause_b_id,
            owner,
            kind,
            severity,
            confidence: confidence_percent,
            description,
        })
    }

    /// The canonically-ordered clause pair, usable as a dedup key.
    #[must_use]
    pub fn pair_key(&self) -> (ClauseId, ClauseId) {
        (self.clause_a_id, self.clause_b_id)
    }
}

/// Lifecycle status of a document or comparison session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Named stage within either orchestrator. Single-document and
/// cross-document processing share most stage names; each orchestrator only
/// ever visits a subset in a fixed order (see `contradiction-pipeline`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    Downloading,
    Preparing,
    Extracting,
    Segmenting,
    Embedding,
    Ner,
    Similarity,
    Rules,
    Nli,
    Storing,
    Completed,
    Failed,
}

/// A document's processing record, as persisted by a `Repository`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub name: String,
    pub storage_path: String,
    pub status: DocumentStatus,
    pub stage: ProcessingStage,
    pub progress_percent: u8,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

/// A multi-document comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSession {
    pub id: ComparisonSessionId,
    pub document_ids: Vec<DocumentId>,
    pub status: DocumentStatus,
    pub stage: ProcessingStage,
    pub progress_percent: u8,
    pub cross_contradiction_count: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl ComparisonSession {
    /// Creates a new pending session, rejecting document counts outside
    /// 2..=10.
    pub fn new(id: ComparisonSessionId, document_ids: Vec<DocumentId>) -> Result<Self> {
        if !(2..=10).contains(&document_ids.len()) {
            return Err(CoreError::InvalidDocumentCount(document_ids.len()));
        }
        Ok(Self {
            id,
            document_ids,
            status: DocumentStatus::Pending,
            stage: ProcessingStage::Preparing,
            progress_percent: 0,
            cross_contradiction_count: 0,
            started_at: None,
            completed_at: None,
            error_message: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause(document_id: DocumentId, text: &str, position: u32) -> Clause {
        Clause::new(ClauseId::new(), document_id, text, position, None)
    }

    #[test]
    fn embedding_of_wrong_length_is_rejected() {
        let c = clause(DocumentId::new(), "the fee is $500", 0);
        let err = c.with_embedding(vec![0.0; 10]).unwrap_err();
        assert!(matches!(err, CoreError::WrongEmbeddingDimension { .. }));
    }

    #[test]
    fn embedding_of_right_length_is_accepted() {
        let c = clause(DocumentId::new(), "the fee is $500", 0);
        let c = c.with_embedding(vec![0.0; EMBEDDING_DIM]).unwrap();
        assert!(c.has_embedding());
    }

    #[test]
    fn self_contradiction_is_rejected() {
        let id = ClauseId::new();
        let doc = DocumentId::new();
        let err = Contradiction::new(
            id,
            id,
            ContradictionOwner::Document(doc),
            ContradictionType::Numeric,
            95.0,
            "self",
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::SelfContradiction(_)));
    }

    #[test]
    fn confidence_below_floor_is_rejected() {
        let doc = DocumentId::new();
        let err = Contradiction::new(
            ClauseId::new(),
            ClauseId::new(),
            ContradictionOwner::Document(doc),
            ContradictionType::Semantic,
            49.9,
            "weak",
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::ConfidenceTooLow(_)));
    }

    #[test]
    fn clause_pair_is_canonically_ordered_regardless_of_argument_order() {
        let doc = DocumentId::new();
        let a = ClauseId::new();
        let b = ClauseId::new();
        let owner = ContradictionOwner::Document(doc);

        let forward = Contradiction::new(a, b, owner.clone(), ContradictionType::Numeric, 95.0, "x").unwrap();
        let backward = Contradiction::new(b, a, owner, ContradictionType::Numeric, 95.0, "x").unwrap();

        assert_eq!(forward.pair_key(), backward.pair_key());
    }

    #[test]
    fn severity_thresholds_match_confidence_bands() {
        assert_eq!(Severity::from_confidence_percent(100.0), Some(Severity::High));
        assert_eq!(Severity::from_confidence_percent(90.0), Some(Severity::High));
        assert_eq!(Severity::from_confidence_percent(89.9), Some(Severity::Medium));
        assert_eq!(Severity::from_confidence_percent(50.0), Some(Severity::Medium));
        assert_eq!(Severity::from_confidence_percent(49.9), None);
    }

    #[test]
    fn description_is_preserved_verbatim() {
        let doc = DocumentId::new();
        let long = "x".repeat(600);
        let c = Contradiction::new(
            ClauseId::new(),
            ClauseId::new(),
            ContradictionOwner::Document(doc),
            ContradictionType::Semantic,
            75.0,
            long.clone(),
        )
        .unwrap();
        assert_eq!(c.description, long);
    }

    #[test]
    fn comparison_session_rejects_bad_document_counts() {
        assert!(ComparisonSession::new(ComparisonSessionId::new(), vec![DocumentId::new()]).is_err());
        let too_many: Vec<_> = (0..11).map(|_| DocumentId::new()).collect();
        assert!(ComparisonSession::new(ComparisonSessionId::new(), too_many).is_err());
        let ok: Vec<_> = (0..3).map(|_| DocumentId::new()).collect();
        assert!(ComparisonSession::new(ComparisonSessionId::new(), ok).is_ok());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A contradiction's clause pair is canonically ordered and its
        /// severity always matches the confidence band it was built from,
        /// no matter which confidence in the valid range or argument order
        /// is supplied.
        #[test]
        fn contradiction_invariants_hold_for_any_valid_confidence(confidence in 50.0f64..=100.0) {
            let doc = DocumentId::new();
            let a = ClauseId::new();
            let b = ClauseId::new();
            let owner = ContradictionOwner::Document(doc);

            let c = Contradiction::new(a, b, owner, ContradictionType::Semantic, confidence, "x").unwrap();
            prop_assert!(c.clause_a_id <= c.clause_b_id);
            prop_assert_eq!(c.clause_a_id.min(c.clause_b_id), a.min(b));

            let expected = if confidence >= 90.0 { Severity::High } else { Severity::Medium };
            prop_assert_eq!(c.severity, expected);
        }

        /// Confidence below the 50% floor is always rejected, regardless of
        /// which clause pair or contradiction type it's paired with.
        #[test]
        fn sub_floor_confidence_is_always_rejected(confidence in 0.0f64..50.0) {
            let doc = DocumentId::new();
            let owner = ContradictionOwner::Document(doc);
            let result = Contradiction::new(ClauseId::new(), ClauseId::new(), owner, ContradictionType::Numeric, confidence, "x");
            prop_assert!(result.is_err());
        }
    }
}
