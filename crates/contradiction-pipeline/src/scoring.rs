//! Shared NLI-scoring step used by both orchestrators: turns a filtered list
//! of decision candidates into the final `Contradiction`s, running one
//! batched NLI call and applying C8's gates per pair.

use contradiction_core::model::{Contradiction, ContradictionOwner};
use contradiction_nlp::{batch_nli_check, decide, CrossEncoderModel, DecisionCandidate, NliPair};

use crate::error::Result;

/// Scores already-prefiltered candidates against the NLI model and keeps
/// only the pairs that survive C8's gates. `owner_for` lets each caller
/// attach the right `ContradictionOwner` (a single document, or a specific
/// document pair within a comparison session).
pub fn score_candidates(
    nli_model: &dyn CrossEncoderModel,
    batch_size: usize,
    candidates: &[DecisionCandidate],
    owner_for: impl Fn(&DecisionCandidate) -> ContradictionOwner,
) -> Result<Vec<Contradiction>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let pairs: Vec<NliPair> = candidates
        .iter()
        .map(|c| NliPair {
            clause_a_id: c.clause_a_id,
            clause_b_id: c.clause_b_id,
            text_a: c.text_a.clone(),
            text_b: c.text_b.clone(),
        })
        .collect();

    let scores = batch_nli_check(nli_model, &pairs, batch_size)?;

    let mut contradictions = Vec::new();
    for (candidate, score) in candidates.iter().zip(scores) {
        if let Some(contradiction) = decide(candidate, score, owner_for(candidate)) {
            contradictions.push(contradiction);
        }
    }
    Ok(contradictions)
}
