//! Sentence embedding (C3): turns clause text into fixed-width vectors for
//! candidate-pair similarity search.

use contradiction_core::model::EMBEDDING_DIM;

use crate::error::{ModelError, ModelResult};

/// Produces sentence embeddings for batches of text. A concrete
/// implementation binds to whatever model runtime loads the embedding
/// model (ONNX, a remote endpoint, ...); this crate only depends on the
/// trait, the same dependency-inversion shape the original model wrapper
/// used for its load-then-infer split.
pub trait SentenceEmbedder: Send + Sync {
    /// Embeds one chunk of texts in a single model call. Implementations
    /// may assume `texts.len()` is already <= their preferred batch size —
    /// chunking across a whole document's clauses is [`embed_all`]'s job.
    fn embed_chunk(&self, texts: &[String]) -> ModelResult<Vec<Vec<f32>>>;
}

/// Embeds every clause text, chunking so a single call never exceeds
/// `chunk_size` inputs, and logging progress between chunks the way the
/// original batch embedder did.
pub fn embed_all(
    embedder: &dyn SentenceEmbedder,
    texts: &[String],
    chunk_size: usize,
) -> ModelResult<Vec<Vec<f32>>> {
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    if texts.len() <= chunk_size {
        return validate_chunk(embedder.embed_chunk(texts)?, texts.len());
    }

    let mut all = Vec::with_capacity(texts.len());
    for (i, chunk) in texts.chunks(chunk_size).enumerate() {
        log::info!(
            "generating embeddings: {}/{} clauses processed...",
            i * chunk_size,
            texts.len()
        );
        let embeddings = validate_chunk(embedder.embed_chunk(chunk)?, chunk.len())?;
        all.extend(embeddings);
    }
    log::info!("successfully generated {} embeddings in total", texts.len());
    Ok(all)
}

fn validate_chunk(embeddings: Vec<Vec<f32>>, expected: usize) -> ModelResult<Vec<Vec<f32>>> {
    if embeddings.len() != expected {
        return Err(ModelError::BatchSizeMismatch {
            expected,
            actual: embeddings.len(),
        });
    }
    for e in &embeddings {
        if e.len() != EMBEDDING_DIM {
            return Err(ModelError::BatchSizeMismatch {
                expected: EMBEDDING_DIM,
                actual: e.len(),
            });
        }
    }
    Ok(embeddings)
}
