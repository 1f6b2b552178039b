//! Cross-document orchestrator (C11): compares clauses across every
//! document in a comparison session pairwise, reusing already-processed
//! clauses where a document was already run through the single-document
//! pipeline.
//!
//! Stage percentages: preparing 5, extracting 10, embedding 30,
//! similarity 45, rules 58, nli 70 (bumped to 78 once the prefiltered pair
//! list is known non-empty), storing 90, completed 100.

use std::collections::HashMap;

use contradiction_core::model::{Clause, ContradictionOwner, DocumentStatus, ProcessingStage};
use contradiction_ids::{ClauseId, ComparisonSessionId, DocumentId};
use contradiction_nlp::{
    check_authority_mismatch, check_entity_contradictions, check_modal_mismatch, check_numeric_mismatch,
    find_cross_document_candidates, merge_candidates, prefilter_by_overlap, RuleViolation,
};

use crate::error::Result;
use crate::orchestrator::Pipeline;
use crate::repository::{ObjectStore, Repository};
use crate::scoring::score_candidates;

impl Pipeline {
    /// Runs the full cross-document comparison, storing any contradiction
    /// found between two documents in the session and marking the session
    /// failed (with a truncated error message) if any stage errors out.
    pub fn process_multi_documents(
        &self,
        repo: &dyn Repository,
        store: &dyn ObjectStore,
        comparison_id: ComparisonSessionId,
    ) -> Result<()> {
        match self.process_multi_documents_inner(repo, store, comparison_id) {
            Ok(cross_count) => {
                repo.update_comparison_progress(&comparison_id, ProcessingStage::Completed, 100)?;
                repo.finish_comparison(&comparison_id, DocumentStatus::Completed, cross_count, None)?;
                Ok(())
            }
            Err(err) => {
                log::error!("comparison {comparison_id} failed: {err}");
                repo.finish_comparison(&comparison_id, DocumentStatus::Failed, 0, Some(err.truncated_message()))?;
                Err(err)
            }
        }
    }

    fn process_multi_documents_inner(
        &self,
        repo: &dyn Repository,
        store: &dyn ObjectStore,
        comparison_id: ComparisonSessionId,
    ) -> Result<u32> {
        let session = repo.load_comparison(&comparison_id)?;
        repo.update_comparison_progress(&comparison_id, ProcessingStage::Preparing, 5)?;

        repo.update_comparison_progress(&comparison_id, ProcessingStage::Extracting, 10)?;
        let mut clauses_by_doc: HashMap<DocumentId, Vec<Clause>> = HashMap::new();
        for &document_id in &session.document_ids {
            let clauses = self.clauses_for(repo, store, document_id)?;
            clauses_by_doc.insert(document_id, clauses);
        }
        repo.update_comparison_progress(&comparison_id, ProcessingStage::Embedding, 30)?;

        let clause_owner: HashMap<ClauseId, DocumentId> = clauses_by_doc
            .iter()
            .flat_map(|(doc, clauses)| clauses.iter().map(move |c| (c.id, *doc)))
            .collect();

        let mut similarity_pairs: Vec<(ClauseId, ClauseId, String, String)> = Vec::new();
        let mut rule_violations: Vec<RuleViolation> = Vec::new();

        for (i, &doc_a) in session.document_ids.iter().enumerate() {
            for &doc_b in &session.document_ids[i + 1..] {
                let clauses_a = &clauses_by_doc[&doc_a];
                let clauses_b = &clauses_by_doc[&doc_b];

                for pair in find_cross_document_candidates(clauses_a, clauses_b, self.settings.cross_doc_similarity_threshold)
                {
                    let text_a = clause_text_in(clauses_a, pair.clause_a_id);
                    let text_b = clause_text_in(clauses_b, pair.clause_b_id);
                    if let (Some(a), Some(b)) = (text_a, text_b) {
                        similarity_pairs.push((pair.clause_a_id, pair.clause_b_id, a, b));
                    }
                }
                rule_violations.extend(cross_document_rule_violations(clauses_a, clauses_b));
            }
        }
        repo.update_comparison_progress(&comparison_id, ProcessingStage::Similarity, 45)?;
        repo.update_comparison_progress(&comparison_id, ProcessingStage::Rules, 58)?;

        let candidates = prefilter_by_overlap(
            merge_candidates(&similarity_pairs, &rule_violations),
            f64::from(self.settings.overlap_prefilter_threshold),
        );

        repo.update_comparison_progress(&comparison_id, ProcessingStage::Nli, 70)?;
        if !candidates.is_empty() {
            repo.update_comparison_progress(&comparison_id, ProcessingStage::Nli, 78)?;
        }

        let contradictions = score_candidates(self.nli_model.as_ref(), self.settings.nli_batch_size, &candidates, |c| {
            owner_for_pair(comparison_id, &clause_owner, c.clause_a_id, c.clause_b_id)
        })?;
        let cross_count = contradictions.len() as u32;

        repo.update_comparison_progress(&comparison_id, ProcessingStage::Storing, 90)?;
        store_grouped_by_owner(repo, contradictions)?;

        Ok(cross_count)
    }
}

fn clause_text_in(clauses: &[Clause], id: ClauseId) -> Option<String> {
    clauses.iter().find(|c| c.id == id).map(|c| c.text.clone())
}

/// Runs the structural rule checks (numeric, modal, authority, entity)
/// across every clause pair spanning two documents. Mirrors
/// `check_contradictions_batch`'s checks but over two distinct clause lists
/// instead of all pairs within one list.
fn cross_document_rule_violations(clauses_a: &[Clause], clauses_b: &[Clause]) -> Vec<RuleViolation> {
    let mut violations = Vec::new();
    for a in clauses_a {
        for b in clauses_b {
            if let Some(v) = check_numeric_mismatch(a, b) {
                violations.push(v);
            }
            if let Some(v) = check_modal_mismatch(a, b) {
                violations.push(v);
            }
            if let Some(v) = check_authority_mismatch(a, b) {
                violations.push(v);
            }
            if !a.entities.is_empty() && !b.entities.is_empty() {
                violations.extend(check_entity_contradictions(a, b, &a.entities, &b.entities));
            }
        }
    }
    violations
}

fn owner_for_pair(
    session: ComparisonSessionId,
    clause_owner: &HashMap<ClauseId, DocumentId>,
    clause_a_id: ClauseId,
    clause_b_id: ClauseId,
) -> ContradictionOwner {
    let doc_a = *clause_owner
        .get(&clause_a_id)
        .expect("candidate clause ids always originate from clauses_by_doc");
    let doc_b = *clause_owner
        .get(&clause_b_id)
        .expect("candidate clause ids always originate from clauses_by_doc");
    let (document_a, document_b) = if doc_a <= doc_b { (doc_a, doc_b) } else { (doc_b, doc_a) };
    ContradictionOwner::Comparison { session, document_a, document_b }
}

/// `Repository::replace_contradictions` takes one owner at a time; a
/// comparison session produces contradictions under several distinct
/// `(document_a, document_b)` owners, so they're grouped before storing.
/// `ContradictionOwner` isn't `Hash`, so the grouping is a linear scan
/// rather than a `HashMap`.
fn store_grouped_by_owner(repo: &dyn Repository, contradictions: Vec<contradiction_core::model::Contradiction>) -> Result<()> {
    let mut grouped: Vec<(ContradictionOwner, Vec<contradiction_core::model::Contradiction>)> = Vec::new();
    for c in contradictions {
        match grouped.iter_mut().find(|(owner, _)| owner == &c.owner) {
            Some((_, bucket)) => bucket.push(c),
            None => grouped.push((c.owner.clone(), vec![c])),
        }
    }
    for (owner, items) in grouped {
        repo.replace_contradictions(&owner, items)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryObjectStore, InMemoryRepository};
    use contradiction_core::model::{DocumentRecord, ProcessingStage};
    use contradiction_nlp::{CrossEncoderModel, EntityExtractor, EntityMap, ModelResult, SentenceEmbedder};

    struct StubEmbedder;
    impl SentenceEmbedder for StubEmbedder {
        fn embed_chunk(&self, texts: &[String]) -> ModelResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.1; contradiction_core::EMBEDDING_DIM]).collect())
        }
    }

    struct StubExtractor;
    impl EntityExtractor for StubExtractor {
        fn extract_batch(&self, texts: &[String]) -> Vec<EntityMap> {
            vec![EntityMap::new(); texts.len()]
        }
    }

    struct StubNli;
    impl CrossEncoderModel for StubNli {
        fn predict_logits(&self, pairs: &[(String, String)]) -> ModelResult<Vec<[f64; 3]>> {
            Ok(pairs.iter().map(|_| [3.0, -1.0, -1.0]).collect())
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(
            Box::new(StubEmbedder),
            Box::new(StubExtractor),
            Box::new(StubNli),
            contradiction_core::Settings::default(),
        )
    }

    fn document(id: DocumentId, name: &str) -> DocumentRecord {
        DocumentRecord {
            id,
            name: name.to_string(),
            storage_path: format!("docs/{name}"),
            status: DocumentStatus::Pending,
            stage: ProcessingStage::Downloading,
            progress_percent: 0,
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }

    #[test]
    fn missing_session_surfaces_invalid_session_error() {
        let repo = InMemoryRepository::new();
        let store = InMemoryObjectStore::new();
        let result = pipeline().process_multi_documents(&repo, &store, ComparisonSessionId::new());
        assert!(result.is_err());
    }

    #[test]
    fn comparing_two_documents_marks_session_completed() {
        let repo = InMemoryRepository::new();
        let store = InMemoryObjectStore::new();

        let doc_a = DocumentId::new();
        let doc_b = DocumentId::new();
        repo.insert_document(document(doc_a, "a.txt"));
        repo.insert_document(document(doc_b, "b.txt"));
        store.put(
            "docs/a.txt",
            b"The vendor shall deliver all goods within thirty days of the purchase order.".to_vec(),
        );
        store.put(
            "docs/b.txt",
            b"The vendor shall deliver all goods within sixty days of the purchase order.".to_vec(),
        );

        let session = contradiction_core::model::ComparisonSession::new(
            ComparisonSessionId::new(),
            vec![doc_a, doc_b],
        )
        .unwrap();
        let session_id = session.id;
        repo.insert_comparison(session);

        pipeline().process_multi_documents(&repo, &store, session_id).unwrap();
        let loaded = repo.load_comparison(&session_id).unwrap();
        assert_eq!(loaded.status, DocumentStatus::Completed);
        assert_eq!(loaded.progress_percent, 100);
    }
}
