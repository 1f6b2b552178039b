//! The `Repository`/`ObjectStore` boundary the orchestrators depend on,
//! plus an in-process implementation used by the CLI and by this crate's
//! own integration tests. A real deployment swaps this for a relational
//! store and a blob service without touching the orchestrators.

use std::collections::HashMap;
use std::sync::Mutex;

use contradiction_core::model::{
    Clause, ComparisonSession, Contradiction, ContradictionOwner, DocumentRecord, DocumentStatus,
    ProcessingStage,
};
use contradiction_ids::{ComparisonSessionId, DocumentId};

use crate::error::{PipelineError, Result};

/// Fetches raw document bytes given a storage path. Implementations own the
/// actual transport (signed S3 URLs, a local filesystem, ...).
pub trait ObjectStore: Send + Sync {
    fn get_signed_url(&self, path: &str, ttl_seconds: u64) -> Result<String>;
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Persists document/comparison progress and the clauses/contradictions the
/// orchestrators produce. One method per logical step, matching a call per
/// SQLAlchemy-session operation in the system this was adapted from rather
/// than a single long-lived transaction object.
pub trait Repository: Send + Sync {
    fn load_document(&self, id: &DocumentId) -> Result<DocumentRecord>;
    fn update_document_progress(&self, id: &DocumentId, stage: ProcessingStage, percent: u8) -> Result<()>;
    fn replace_clauses(&self, document_id: &DocumentId, clauses: Vec<Clause>) -> Result<Vec<Clause>>;
    fn replace_contradictions(&self, owner: &ContradictionOwner, items: Vec<Contradiction>) -> Result<()>;
    fn clauses_with_embeddings(&self, document_id: &DocumentId) -> Result<Vec<Clause>>;
    fn load_comparison(&self, id: &ComparisonSessionId) -> Result<ComparisonSession>;
    fn update_comparison_progress(&self, id: &ComparisonSessionId, stage: ProcessingStage, percent: u8) -> Result<()>;
    fn finish_document(&self, id: &DocumentId, status: DocumentStatus, error: Option<String>) -> Result<()>;
    fn finish_comparison(
        &self,
        id: &ComparisonSessionId,
        status: DocumentStatus,
        cross_count: u32,
        error: Option<String>,
    ) -> Result<()>;
}

/// `HashMap`-backed `Repository`, used by `contradiction-cli` and by tests
/// elsewhere in the workspace. Not meant to survive process restarts.
#[derive(Default)]
pub struct InMemoryRepository {
    documents: Mutex<HashMap<DocumentId, DocumentRecord>>,
    clauses: Mutex<HashMap<DocumentId, Vec<Clause>>>,
    contradictions: Mutex<Vec<Contradiction>>,
    comparisons: Mutex<HashMap<ComparisonSessionId, ComparisonSession>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_document(&self, record: DocumentRecord) {
        self.documents.lock().unwrap().insert(record.id, record);
    }

    pub fn insert_comparison(&self, session: ComparisonSession) {
        self.comparisons.lock().unwrap().insert(session.id, session);
    }

    #[must_use]
    pub fn contradictions(&self) -> Vec<Contradiction> {
        self.contradictions.lock().unwrap().clone()
    }
}

impl Repository for InMemoryRepository {
    fn load_document(&self, id: &DocumentId) -> Result<DocumentRecord> {
        self.documents
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(PipelineError::InvalidDocument(*id))
    }

    fn update_document_progress(&self, id: &DocumentId, stage: ProcessingStage, percent: u8) -> Result<()> {
        let mut docs = self.documents.lock().unwrap();
        let record = docs.get_mut(id).ok_or(PipelineError::InvalidDocument(*id))?;
        record.stage = stage;
        record.progress_percent = percent;
        record.status = DocumentStatus::Processing;
        Ok(())
    }

    fn replace_clauses(&self, document_id: &DocumentId, clauses: Vec<Clause>) -> Result<Vec<Clause>> {
        self.clauses.lock().unwrap().insert(*document_id, clauses.clone());
        Ok(clauses)
    }

    fn replace_contradictions(&self, owner: &ContradictionOwner, items: Vec<Contradiction>) -> Result<()> {
        let mut store = self.contradictions.lock().unwrap();
        store.retain(|c| &c.owner != owner);
        store.extend(items);
        Ok(())
    }

    fn clauses_with_embeddings(&self, document_id: &DocumentId) -> Result<Vec<Clause>> {
        Ok(self
            .clauses
            .lock()
            .unwrap()
            .get(document_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(Clause::has_embedding)
            .collect())
    }

    fn load_comparison(&self, id: &ComparisonSessionId) -> Result<ComparisonSession> {
        self.comparisons
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(PipelineError::InvalidSession(*id))
    }

    fn update_comparison_progress(
        &self,
        id: &ComparisonSessionId,
        stage: ProcessingStage,
        percent: u8,
    ) -> Result<()> {
        let mut comparisons = self.comparisons.lock().unwrap();
        let session = comparisons.get_mut(id).ok_or(PipelineError::InvalidSession(*id))?;
        session.stage = stage;
        session.progress_percent = percent;
        session.status = DocumentStatus::Processing;
        Ok(())
    }

    fn finish_document(&self, id: &DocumentId, status: DocumentStatus, error: Option<String>) -> Result<()> {
        let mut docs = self.documents.lock().unwrap();
        let record = docs.get_mut(id).ok_or(PipelineError::InvalidDocument(*id))?;
        record.status = status;
        record.error_message = error;
        if status == DocumentStatus::Completed {
            record.progress_percent = 100;
        }
        Ok(())
    }

    fn finish_comparison(
        &self,
        id: &ComparisonSessionId,
        status: DocumentStatus,
        cross_count: u32,
        error: Option<String>,
    ) -> Result<()> {
        let mut comparisons = self.comparisons.lock().unwrap();
        let session = comparisons.get_mut(id).ok_or(PipelineError::InvalidSession(*id))?;
        session.status = status;
        session.cross_contradiction_count = cross_count;
        session.error_message = error;
        if status == DocumentStatus::Completed {
            session.progress_percent = 100;
        }
        Ok(())
    }
}

/// `HashMap`-backed `ObjectStore`: a "signed url" is just the storage path
/// itself, and `fetch` looks the path up directly.
#[derive(Default)]
pub struct InMemoryObjectStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: impl Into<String>, bytes: Vec<u8>) {
        self.blobs.lock().unwrap().insert(path.into(), bytes);
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn get_signed_url(&self, path: &str, _ttl_seconds: u64) -> Result<String> {
        Ok(path.to_string())
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.blobs
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| PipelineError::StorageFetch(format!("no object at {url}")))
    }
}
