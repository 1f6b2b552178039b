//! Single-document orchestrator (C10): fetches a document, extracts and
//! segments its text, embeds and tags each clause, finds intra-document
//! candidate pairs, runs rule checks and NLI over them, and stores whatever
//! survives C8's gates.
//!
//! Stage percentages are fixed points borrowed from the original worker so
//! a caller polling `DocumentRecord::progress_percent` sees the same curve:
//! downloading 5, extracting 15, segmenting 25, embedding 40, ner 55,
//! similarity 65, rules 72, nli 80, storing 90, completed 100.

use std::collections::BTreeMap;

use contradiction_core::model::{Clause, ContradictionOwner, DocumentStatus, ProcessingStage};
use contradiction_ids::{ClauseId, DocumentId};
use contradiction_nlp::{
    check_contradictions_batch, embed_all, extract_all, extract_section_heading, extract_text,
    find_intra_document_candidates, merge_candidates, prefilter_by_overlap, segment_clauses,
    CrossEncoderModel, EntityExtractor, EntityMap, SentenceEmbedder,
};

use crate::error::Result;
use crate::repository::{ObjectStore, Repository};
use crate::scoring::score_candidates;

const SIGNED_URL_TTL_SECONDS: u64 = 300;

/// Holds the model-backed stages so the orchestrators don't hard-code a
/// specific inference runtime; a caller wires in whatever backs embedding,
/// NER, and NLI at the edges.
pub struct Pipeline {
    pub(crate) embedder: Box<dyn SentenceEmbedder>,
    pub(crate) entity_extractor: Box<dyn EntityExtractor>,
    pub(crate) nli_model: Box<dyn CrossEncoderModel>,
    pub(crate) settings: contradiction_core::Settings,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        embedder: Box<dyn SentenceEmbedder>,
        entity_extractor: Box<dyn EntityExtractor>,
        nli_model: Box<dyn CrossEncoderModel>,
        settings: contradiction_core::Settings,
    ) -> Self {
        Self {
            embedder,
            entity_extractor,
            nli_model,
            settings,
        }
    }

    /// Runs the full single-document pipeline, storing clauses and
    /// contradictions via `repo` and marking the document failed (with a
    /// truncated error message) if any stage errors out.
    pub fn process_document(
        &self,
        repo: &dyn Repository,
        store: &dyn ObjectStore,
        document_id: DocumentId,
    ) -> Result<()> {
        match self.process_document_inner(repo, store, document_id) {
            Ok(()) => Ok(()),
            Err(err) => {
                log::error!("document {document_id} failed: {err}");
                repo.finish_document(&document_id, DocumentStatus::Failed, Some(err.truncated_message()))?;
                Err(err)
            }
        }
    }

    fn process_document_inner(
        &self,
        repo: &dyn Repository,
        store: &dyn ObjectStore,
        document_id: DocumentId,
    ) -> Result<()> {
        let record = repo.load_document(&document_id)?;

        repo.update_document_progress(&document_id, ProcessingStage::Downloading, 5)?;
        let url = store.get_signed_url(&record.storage_path, SIGNED_URL_TTL_SECONDS)?;
        let bytes = store.fetch(&url)?;

        repo.update_document_progress(&document_id, ProcessingStage::Extracting, 15)?;
        let text = extract_text(&bytes, &record.name)?;

        repo.update_document_progress(&document_id, ProcessingStage::Segmenting, 25)?;
        let mut clauses = build_clauses(document_id, &text);
        log::info!("segmented {} into {} clauses", record.name, clauses.len());

        repo.update_document_progress(&document_id, ProcessingStage::Embedding, 40)?;
        self.embed_clauses(&mut clauses)?;

        repo.update_document_progress(&document_id, ProcessingStage::Ner, 55)?;
        let entities_map = self.tag_entities(&mut clauses);

        repo.update_document_progress(&document_id, ProcessingStage::Similarity, 65)?;
        let candidate_pairs = find_intra_document_candidates(&clauses, self.settings.candidate_similarity_threshold);

        repo.update_document_progress(&document_id, ProcessingStage::Rules, 72)?;
        let rule_violations = check_contradictions_batch(&clauses, Some(&entities_map));

        let similarity_pairs: Vec<(ClauseId, ClauseId, String, String)> = candidate_pairs
            .iter()
            .filter_map(|pair| {
                let text_a = clause_text(&clauses, pair.clause_a_id)?;
                let text_b = clause_text(&clauses, pair.clause_b_id)?;
                Some((pair.clause_a_id, pair.clause_b_id, text_a, text_b))
            })
            .collect();
        let candidates = prefilter_by_overlap(
            merge_candidates(&similarity_pairs, &rule_violations),
            f64::from(self.settings.overlap_prefilter_threshold),
        );

        repo.update_document_progress(&document_id, ProcessingStage::Nli, 80)?;
        let owner = ContradictionOwner::Document(document_id);
        let contradictions = score_candidates(
            self.nli_model.as_ref(),
            self.settings.nli_batch_size,
            &candidates,
            |_| owner.clone(),
        )?;

        repo.update_document_progress(&document_id, ProcessingStage::Storing, 90)?;
        repo.replace_clauses(&document_id, clauses)?;
        repo.replace_contradictions(&owner, contradictions)?;

        repo.update_document_progress(&document_id, ProcessingStage::Completed, 100)?;
        repo.finish_document(&document_id, DocumentStatus::Completed, None)?;
        Ok(())
    }

    pub(crate) fn embed_clauses(&self, clauses: &mut [Clause]) -> Result<()> {
        let texts: Vec<String> = clauses.iter().map(|c| c.text.clone()).collect();
        let embeddings = embed_all(self.embedder.as_ref(), &texts, self.settings.embedding_batch_size)?;
        for (clause, embedding) in clauses.iter_mut().zip(embeddings) {
            clause.embedding = Some(embedding);
        }
        Ok(())
    }

    pub(crate) fn tag_entities(&self, clauses: &mut [Clause]) -> BTreeMap<ClauseId, EntityMap> {
        let texts: Vec<String> = clauses.iter().map(|c| c.text.clone()).collect();
        let entities = extract_all(self.entity_extractor.as_ref(), &texts, self.settings.ner_batch_size);
        let mut map = BTreeMap::new();
        for (clause, entity_map) in clauses.iter_mut().zip(entities) {
            clause.entities = entity_map.clone();
            map.insert(clause.id, entity_map);
        }
        map
    }

    fn fetch_and_prepare(
        &self,
        repo: &dyn Repository,
        store: &dyn ObjectStore,
        document_id: DocumentId,
    ) -> Result<Vec<Clause>> {
        let record = repo.load_document(&document_id)?;
        let url = store.get_signed_url(&record.storage_path, SIGNED_URL_TTL_SECONDS)?;
        let bytes = store.fetch(&url)?;
        let text = extract_text(&bytes, &record.name)?;
        let mut clauses = build_clauses(document_id, &text);
        self.embed_clauses(&mut clauses)?;
        self.tag_entities(&mut clauses);
        repo.replace_clauses(&document_id, clauses.clone())?;
        Ok(clauses)
    }

    /// Returns `document_id`'s clauses, reusing an already-processed,
    /// embedded set if one is on file rather than re-running extraction.
    pub(crate) fn clauses_for(
        &self,
        repo: &dyn Repository,
        store: &dyn ObjectStore,
        document_id: DocumentId,
    ) -> Result<Vec<Clause>> {
        let existing = repo.clauses_with_embeddings(&document_id)?;
        if !existing.is_empty() {
            return Ok(existing);
        }
        self.fetch_and_prepare(repo, store, document_id)
    }
}

/// Builds numbered `Clause`s from segmented text, attaching each the nearest
/// preceding section heading. Segmentation only hands back clause text, so
/// the byte offset needed for heading lookup is recovered by searching
/// forward from the previous clause's offset.
pub(crate) fn build_clauses(document_id: DocumentId, text: &str) -> Vec<Clause> {
    let sentences = segment_clauses(text);
    let mut search_from = 0usize;

    sentences
        .into_iter()
        .enumerate()
        .map(|(i, sentence)| {
            let offset = text[search_from..]
                .find(sentence.as_str())
                .map_or(search_from, |p| search_from + p);
            search_from = offset;

            let heading = extract_section_heading(text, offset);
            let section = if heading.is_empty() { None } else { Some(heading) };
            Clause::new(ClauseId::new(), document_id, sentence, i as u32, section)
        })
        .collect()
}

pub(crate) fn clause_text(clauses: &[Clause], id: ClauseId) -> Option<String> {
    clauses.iter().find(|c| c.id == id).map(|c| c.text.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contradiction_core::model::{DocumentRecord, EMBEDDING_DIM};
    use contradiction_nlp::ModelResult;

    struct StubEmbedder;
    impl SentenceEmbedder for StubEmbedder {
        fn embed_chunk(&self, texts: &[String]) -> ModelResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.1; EMBEDDING_DIM]).collect())
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

    fn document_record(id: DocumentId, name: &str) -> DocumentRecord {
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
    fn missing_document_surfaces_invalid_document_error() {
        let repo = crate::repository::InMemoryRepository::new();
        let store = crate::repository::InMemoryObjectStore::new();
        let result = pipeline().process_document(&repo, &store, DocumentId::new());
        assert!(result.is_err());
    }

    #[test]
    fn processing_a_document_marks_it_completed() {
        let repo = crate::repository::InMemoryRepository::new();
        let store = crate::repository::InMemoryObjectStore::new();
        let id = DocumentId::new();
        repo.insert_document(document_record(id, "contract.txt"));
        store.put(
            "docs/contract.txt",
            b"The contractor shall deliver all equipment within thirty days of signing this agreement. The contractor shall deliver all equipment within sixty days of signing this agreement.".to_vec(),
        );

        pipeline().process_document(&repo, &store, id).unwrap();
        let record = repo.load_document(&id).unwrap();
        assert_eq!(record.status, DocumentStatus::Completed);
        assert_eq!(record.progress_percent, 100);
    }

    #[test]
    fn build_clauses_numbers_positions_sequentially() {
        let doc = DocumentId::new();
        let text = "The first sentence has enough words to survive noise filtering today.\n\nThe second sentence also has enough words to survive noise filtering today.";
        let clauses = build_clauses(doc, text);
        for (i, clause) in clauses.iter().enumerate() {
            assert_eq!(clause.position, i as u32);
        }
    }
}
