//! Natural language inference scoring (C7): a cross-encoder predicts
//! `[contradiction, entailment, neutral]` logits for each candidate clause
//! pair, which are then converted to probabilities with a numerically
//! stable softmax.

use ndarray::Array2;

use crate::error::ModelResult;

/// A clause pair to be scored by the NLI model, carrying both clause ids so
/// results can be matched back to their source pair.
#[derive(Debug, Clone)]
pub struct NliPair {
    pub clause_a_id: contradiction_ids::ClauseId,
    pub clause_b_id: contradiction_ids::ClauseId,
    pub text_a: String,
    pub text_b: String,
}

/// Per-pair contradiction/entailment/neutral probabilities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NliScores {
    pub contradiction: f64,
    pub entailment: f64,
    pub neutral: f64,
}

/// Predicts raw `[contradiction, entailment, neutral]` logits for batches
/// of clause pairs. A concrete implementation binds to whatever model
/// runtime hosts the cross-encoder.
pub trait CrossEncoderModel: Send + Sync {
    /// Predicts logits for one batch; `pairs.len() <= batch_size` is the
    /// caller's responsibility (see [`batch_nli_check`]).
    fn predict_logits(&self, pairs: &[(String, String)]) -> ModelResult<Vec<[f64; 3]>>;
}

/// Runs NLI over every pair, batching at `batch_size` (the model this was
/// grounded on recommends 64), and converts logits to probabilities with
/// one vectorized softmax call over the whole result set.
pub fn batch_nli_check(
    model: &dyn CrossEncoderModel,
    pairs: &[NliPair],
    batch_size: usize,
) -> ModelResult<Vec<NliScores>> {
    if pairs.is_empty() {
        return Ok(Vec::new());
    }

    let mut all_logits = Vec::with_capacity(pairs.len());
    for chunk in pairs.chunks(batch_size.max(1)) {
        let text_pairs: Vec<(String, String)> =
            chunk.iter().map(|p| (p.text_a.clone(), p.text_b.clone())).collect();
        all_logits.extend(model.predict_logits(&text_pairs)?);
    }

    Ok(softmax_batch(&all_logits))
}

/// Numerically stable softmax for a single 3-way logit vector: subtracts
/// the row max before exponentiating.
pub fn softmax(logits: [f64; 3]) -> NliScores {
    let max = logits.iter().cloned().fold(f64::MIN, f64::max);
    let exp: Vec<f64> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f64 = exp.iter().sum();
    NliScores {
        contradiction: exp[0] / sum,
        entailment: exp[1] / sum,
        neutral: exp[2] / sum,
    }
}

/// Vectorized row-wise softmax over a batch of logit rows.
fn softmax_batch(logits: &[[f64; 3]]) -> Vec<NliScores> {
    let rows = logits.len();
    let mut matrix = Array2::<f64>::zeros((rows, 3));
    for (i, row) in logits.iter().enumerate() {
        matrix.row_mut(i).assign(&ndarray::arr1(row));
    }

    let row_max = matrix.map_axis(ndarray::Axis(1), |row| row.iter().cloned().fold(f64::MIN, f64::max));
    for (mut row, &max) in matrix.axis_iter_mut(ndarray::Axis(0)).zip(row_max.iter()) {
        row.mapv_inplace(|v| (v - max).exp());
    }
    let row_sum = matrix.map_axis(ndarray::Axis(1), |row| row.sum());

    (0..rows)
        .map(|i| {
            let sum = row_sum[i];
            NliScores {
                contradiction: matrix[[i, 0]] / sum,
                entailment: matrix[[i, 1]] / sum,
                neutral: matrix[[i, 2]] / sum,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLogits(Vec<[f64; 3]>);
    impl CrossEncoderModel for FixedLogits {
        fn predict_logits(&self, pairs: &[(String, String)]) -> ModelResult<Vec<[f64; 3]>> {
            Ok(self.0.iter().take(pairs.len()).cloned().collect())
        }
    }

    fn pair() -> NliPair {
        NliPair {
            clause_a_id: contradiction_ids::ClauseId::new(),
            clause_b_id: contradiction_ids::ClauseId::new(),
            text_a: "a".to_string(),
            text_b: "b".to_string(),
        }
    }

    #[test]
    fn softmax_probabilities_sum_to_one() {
        let scores = softmax([2.0, 0.5, -1.0]);
        let total = scores.contradiction + scores.entailment + scores.neutral;
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let scores = softmax([1000.0, 999.0, 998.0]);
        assert!(scores.contradiction.is_finite());
        assert!(scores.contradiction > scores.entailment);
    }

    #[test]
    fn dominant_logit_produces_highest_probability() {
        let scores = softmax([5.0, -5.0, -5.0]);
        assert!(scores.contradiction > 0.9);
    }

    #[test]
    fn batch_check_matches_single_softmax_per_row() {
        let model = FixedLogits(vec![[3.0, 0.0, 0.0], [0.0, 3.0, 0.0]]);
        let pairs = vec![pair(), pair()];
        let results = batch_nli_check(&model, &pairs, 64).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].contradiction > results[0].entailment);
        assert!(results[1].entailment > results[1].contradiction);
    }

    #[test]
    fn empty_pairs_returns_empty_scores() {
        let model = FixedLogits(vec![]);
        assert!(batch_nli_check(&model, &[], 64).unwrap().is_empty());
    }
}
