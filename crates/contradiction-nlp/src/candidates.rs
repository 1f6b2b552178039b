//! Candidate-pair generation (C6): vectorized cosine similarity search over
//! clause embeddings, both within a single document and across a pair of
//! documents.

use ndarray::{Array2, Axis};

use contradiction_core::model::Clause;

/// Stabilizer added to embedding norms before dividing, matching the
/// original service's `1e-10` epsilon so an all-zero embedding doesn't
/// produce a divide-by-zero NaN.
const NORM_EPSILON: f32 = 1e-10;

/// A clause pair found similar enough to be worth rule-checking and
/// NLI-scoring, together with the raw cosine similarity that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePair {
    pub clause_a_id: contradiction_ids::ClauseId,
    pub clause_b_id: contradiction_ids::ClauseId,
    pub similarity: f32,
}

fn embedding_matrix(clauses: &[&Clause]) -> Array2<f32> {
    let dim = clauses.first().and_then(|c| c.embedding.as_ref()).map_or(0, Vec::len);
    let mut matrix = Array2::<f32>::zeros((clauses.len(), dim));
    for (i, clause) in clauses.iter().enumerate() {
        if let Some(embedding) = &clause.embedding {
            matrix.row_mut(i).assign(&ndarray::ArrayView1::from(embedding.as_slice()));
        }
    }
    matrix
}

fn row_normalize(matrix: &Array2<f32>) -> Array2<f32> {
    let norms = matrix.map_axis(Axis(1), |row| row.dot(&row).sqrt());
    let mut normalized = matrix.clone();
    for (mut row, &norm) in normalized.axis_iter_mut(Axis(0)).zip(norms.iter()) {
        row.mapv_inplace(|v| v / (norm + NORM_EPSILON));
    }
    normalized
}

/// Finds clause pairs within a single document whose embeddings have
/// cosine similarity at or above `threshold` (default 0.82 — high enough
/// that only near-paraphrase clauses become candidates). Only the upper
/// triangle is scanned so each unordered pair is reported once.
pub fn find_intra_document_candidates(clauses: &[Clause], threshold: f32) -> Vec<CandidatePair> {
    let valid: Vec<&Clause> = clauses.iter().filter(|c| c.has_embedding()).collect();
    if valid.len() < 2 {
        return Vec::new();
    }

    let matrix = row_normalize(&embedding_matrix(&valid));
    let similarity = matrix.dot(&matrix.t());

    let mut pairs = Vec::new();
    for i in 0..valid.len() {
        for j in (i + 1)..valid.len() {
            let sim = similarity[[i, j]];
            if sim >= threshold {
                pairs.push(CandidatePair {
                    clause_a_id: valid[i].id,
                    clause_b_id: valid[j].id,
                    similarity: sim,
                });
            }
        }
    }
    pairs
}

/// Finds clause pairs across two documents' clause sets whose embeddings
/// meet `threshold` (default 0.75 for cross-document comparison — lower
/// than the intra-document bar since cross-document paraphrases vary more
/// in phrasing).
pub fn find_cross_document_candidates(
    clauses_a: &[Clause],
    clauses_b: &[Clause],
    threshold: f32,
) -> Vec<CandidatePair> {
    let valid_a: Vec<&Clause> = clauses_a.iter().filter(|c| c.has_embedding()).collect();
    let valid_b: Vec<&Clause> = clauses_b.iter().filter(|c| c.has_embedding()).collect();
    if valid_a.is_empty() || valid_b.is_empty() {
        return Vec::new();
    }

    let matrix_a = row_normalize(&embedding_matrix(&valid_a));
    let matrix_b = row_normalize(&embedding_matrix(&valid_b));
    let similarity = matrix_a.dot(&matrix_b.t());

    let mut pairs = Vec::new();
    for i in 0..valid_a.len() {
        for j in 0..valid_b.len() {
            let sim = similarity[[i, j]];
            if sim >= threshold {
                pairs.push(CandidatePair {
                    clause_a_id: valid_a[i].id,
                    clause_b_id: valid_b[j].id,
                    similarity: sim,
                });
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use contradiction_core::model::EMBEDDING_DIM;
    use contradiction_ids::DocumentId;

    fn clause_with_embedding(text: &str, embedding: Vec<f32>) -> Clause {
        let doc = DocumentId::new();
        Clause::new(contradiction_ids::ClauseId::new(), doc, text, 0, None)
            .with_embedding(embedding)
            .unwrap()
    }

    fn unit_vector(mut value: f32) -> Vec<f32> {
        let mut v = vec![0.0f32; EMBEDDING_DIM];
        v[0] = value;
        value = (1.0 - value * value).max(0.0).sqrt();
        v[1] = value;
        v
    }

    #[test]
    fn identical_embeddings_are_found_as_candidates() {
        let emb = unit_vector(1.0);
        let a = clause_with_embedding("one", emb.clone());
        let b = clause_with_embedding("two", emb);
        let pairs = find_intra_document_candidates(&[a, b], 0.82);
        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].similarity > 0.99);
    }

    #[test]
    fn orthogonal_embeddings_are_not_candidates() {
        let a = clause_with_embedding("one", unit_vector(1.0));
        let b = clause_with_embedding("two", unit_vector(0.0));
        let pairs = find_intra_document_candidates(&[a, b], 0.82);
        assert!(pairs.is_empty());
    }

    #[test]
    fn clauses_without_embeddings_are_skipped() {
        let doc = DocumentId::new();
        let a = Clause::new(contradiction_ids::ClauseId::new(), doc, "no embedding", 0, None);
        let b = clause_with_embedding("has embedding", unit_vector(1.0));
        assert!(find_intra_document_candidates(&[a, b], 0.5).is_empty());
    }

    #[test]
    fn cross_document_candidates_only_pair_across_the_two_sets() {
        let emb = unit_vector(1.0);
        let doc_a_clauses = vec![clause_with_embedding("a1", emb.clone())];
        let doc_b_clauses = vec![clause_with_embedding("b1", emb)];
        let pairs = find_cross_document_candidates(&doc_a_clauses, &doc_b_clauses, 0.75);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].clause_a_id, doc_a_clauses[0].id);
        assert_eq!(pairs[0].clause_b_id, doc_b_clauses[0].id);
    }
}
