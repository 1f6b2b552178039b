//! Deterministic stand-ins for the model-backed stages, used so the CLI can
//! run the pipeline end to end without a served embedding or NLI model.
//! Neither is meant to produce research-grade results.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use contradiction_core::model::EMBEDDING_DIM;
use contradiction_nlp::{CrossEncoderModel, ModelResult, SentenceEmbedder};

/// Embeds text with the hashing trick: each word is hashed into one of
/// [`EMBEDDING_DIM`] buckets and the resulting bag-of-words vector is
/// L2-normalized. Good enough to make near-duplicate sentences land close
/// together in cosine similarity; not a substitute for a trained model.
pub struct HashEmbedder;

impl SentenceEmbedder for HashEmbedder {
    fn embed_chunk(&self, texts: &[String]) -> ModelResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| hash_embed(t)).collect())
    }
}

fn hash_embed(text: &str) -> Vec<f32> {
    let mut vector = vec![0f32; EMBEDDING_DIM];
    for word in text.to_lowercase().split_whitespace() {
        let mut hasher = DefaultHasher::new();
        word.hash(&mut hasher);
        let bucket = (hasher.finish() % EMBEDDING_DIM as u64) as usize;
        vector[bucket] += 1.0;
    }
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

/// Scores a pair from word overlap and an exact-match check rather than a
/// trained cross-encoder: identical text entails, moderate-to-high overlap
/// with differing wording looks like a contradiction, and low overlap is
/// neutral.
pub struct HeuristicNliModel;

impl CrossEncoderModel for HeuristicNliModel {
    fn predict_logits(&self, pairs: &[(String, String)]) -> ModelResult<Vec<[f64; 3]>> {
        Ok(pairs.iter().map(|(a, b)| heuristic_logits(a, b)).collect())
    }
}

fn heuristic_logits(a: &str, b: &str) -> [f64; 3] {
    if a.trim().eq_ignore_ascii_case(b.trim()) {
        return [-2.0, 3.0, -1.0];
    }

    let words = |t: &str| -> HashSet<String> {
        t.to_lowercase().split_whitespace().filter(|w| w.len() > 2).map(String::from).collect()
    };
    let wa = words(a);
    let wb = words(b);
    if wa.is_empty() || wb.is_empty() {
        return [-1.0, -1.0, 2.0];
    }

    let overlap = wa.intersection(&wb).count() as f64 / wa.len().max(wb.len()) as f64;
    if overlap >= 0.4 {
        [2.5, -0.5, -1.0]
    } else {
        [-1.0, -1.0, 2.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_words_produce_identical_embeddings() {
        let a = hash_embed("the quick brown fox");
        let b = hash_embed("the quick brown fox");
        assert_eq!(a, b);
    }

    #[test]
    fn embeddings_are_unit_length() {
        let v = hash_embed("the quick brown fox jumps");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_produces_zero_vector() {
        assert!(hash_embed("").iter().all(|v| *v == 0.0));
    }

    #[test]
    fn identical_text_entails() {
        let logits = heuristic_logits("the fee is due monthly", "the fee is due monthly");
        assert!(logits[1] > logits[0] && logits[1] > logits[2]);
    }

    #[test]
    fn disjoint_text_is_neutral() {
        let logits = heuristic_logits("the sky is blue today", "quarterly revenue grew sharply");
        assert!(logits[2] > logits[0] && logits[2] > logits[1]);
    }

    #[test]
    fn overlapping_but_differing_text_looks_contradictory() {
        let logits = heuristic_logits(
            "the contractor shall deliver within thirty days",
            "the contractor shall deliver within sixty days",
        );
        assert!(logits[0] > logits[1] && logits[0] > logits[2]);
    }
}
