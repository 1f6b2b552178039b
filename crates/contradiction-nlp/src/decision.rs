//! Final decision stage (C8): merges candidate pairs and rule violations
//! into a single list, runs the word-overlap pre-filter, applies the
//! contradiction/entailment/neutral gates (bypassed for numeric-rule
//! matches), and produces the confidence/severity a [`Contradiction`] is
//! finally built from.
//!
//! [`Contradiction`]: contradiction_core::model::Contradiction

use std::collections::{BTreeMap, HashSet};

use contradiction_core::model::{Contradiction, ContradictionOwner, ContradictionType, Severity};
use contradiction_ids::ClauseId;

use crate::description::build_semantic_description;
use crate::nli::NliScores;
use crate::ner::RuleViolation;

/// Confidence floor for a rule-backed pair (a rule violation lowers the bar
/// since the rule itself already established a conflict).
const MIN_SCORE_RULE_BACKED: f64 = 0.50;

/// Confidence floor for a pair with no supporting rule.
const MIN_SCORE_SEMANTIC: f64 = 0.75;

/// Entailment score above which a pair is vetoed regardless of its
/// contradiction score, unless a numeric rule bypasses the gate.
const ENTAILMENT_VETO_THRESHOLD: f64 = 0.5;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "shall", "should", "may", "might", "can", "could", "of",
    "in", "to", "for", "and", "or", "but", "on", "at", "by", "with", "from", "as", "into", "that",
    "this", "it", "its", "not", "no", "if", "so", "than", "then", "such", "also", "any", "all",
    "each", "every", "both", "other",
];

fn word_overlap(text_a: &str, text_b: &str) -> f64 {
    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    let words = |t: &str| -> HashSet<String> {
        t.to_lowercase()
            .split_whitespace()
            .filter(|w| !stop.contains(w) && w.len() > 2)
            .map(String::from)
            .collect()
    };
    let wa = words(text_a);
    let wb = words(text_b);
    if wa.is_empty() || wb.is_empty() {
        return 0.0;
    }
    wa.intersection(&wb).count() as f64 / wa.len().max(wb.len()) as f64
}

/// One clause pair carried through the decision stage: the two clause
/// texts, an optional rule violation backing it, and (once computed) the
/// NLI scores for the pair.
#[derive(Debug, Clone)]
pub struct DecisionCandidate {
    pub clause_a_id: ClauseId,
    pub clause_b_id: ClauseId,
    pub text_a: String,
    pub text_b: String,
    pub rule_violation: Option<RuleViolation>,
}

/// Canonical key so a pair surfaced by both the candidate-similarity search
/// and a rule check is only carried through the pipeline once.
fn pair_key(a: ClauseId, b: ClauseId) -> (ClauseId, ClauseId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Merges similarity candidates and rule violations into one deduplicated
/// list of decision candidates, keyed by canonical clause-id pair. A pair
/// found by both keeps its rule violation.
pub fn merge_candidates(
    similarity_pairs: &[(ClauseId, ClauseId, String, String)],
    rule_violations: &[RuleViolation],
) -> Vec<DecisionCandidate> {
    let mut by_key: BTreeMap<(ClauseId, ClauseId), DecisionCandidate> = BTreeMap::new();

    for (a, b, text_a, text_b) in similarity_pairs {
        by_key.insert(
            pair_key(*a, *b),
            DecisionCandidate {
                clause_a_id: *a,
                clause_b_id: *b,
                text_a: text_a.clone(),
                text_b: text_b.clone(),
                rule_violation: None,
            },
        );
    }

    for violation in rule_violations {
        let key = pair_key(violation.clause_a_id, violation.clause_b_id);
        by_key
            .entry(key)
            .and_modify(|c| c.rule_violation = Some(violation.clone()))
            .or_insert_with(|| DecisionCandidate {
                clause_a_id: violation.clause_a_id,
                clause_b_id: violation.clause_b_id,
                text_a: String::new(),
                text_b: String::new(),
                rule_violation: Some(violation.clone()),
            });
    }

    by_key.into_values().collect()
}

/// Drops candidates whose clause texts don't meet `threshold` word overlap
/// (see `Settings::overlap_prefilter_threshold`). Rule-backed candidates
/// without text (merged in purely from a rule pass that didn't carry clause
/// text) are kept — the rule itself already established relatedness.
pub fn prefilter_by_overlap(candidates: Vec<DecisionCandidate>, threshold: f64) -> Vec<DecisionCandidate> {
    candidates
        .into_iter()
        .filter(|c| {
            if c.text_a.is_empty() || c.text_b.is_empty() {
                return true;
            }
            word_overlap(&c.text_a, &c.text_b) >= threshold
        })
        .collect()
}

/// Applies the three contradiction gates and, if the pair survives, builds
/// the final [`Contradiction`]. `owner` identifies whether this is a
/// single-document or cross-document finding.
pub fn decide(
    candidate: &DecisionCandidate,
    nli: NliScores,
    owner: ContradictionOwner,
) -> Option<Contradiction> {
    let rule = candidate.rule_violation.as_ref();
    let is_numeric_rule = rule.is_some_and(|r| r.kind == ContradictionType::Numeric);
    let min_score = if rule.is_some() {
        MIN_SCORE_RULE_BACKED
    } else {
        MIN_SCORE_SEMANTIC
    };

    if !is_numeric_rule {
        if nli.contradiction <= min_score {
            return None;
        }
        if nli.contradiction <= nli.entailment || nli.contradiction <= nli.neutral {
            return None;
        }
        if nli.entailment > ENTAILMENT_VETO_THRESHOLD {
            return None;
        }
    }

    let confidence = if is_numeric_rule && nli.contradiction < MIN_SCORE_RULE_BACKED {
        rule.map(|r| r.confidence).unwrap_or(nli.contradiction)
    } else {
        nli.contradiction
    };

    let confidence_percent = (confidence * 100.0 * 10.0).round() / 10.0;
    Severity::from_confidence_percent(confidence_percent)?;

    let kind = rule.map(|r| r.kind).unwrap_or(ContradictionType::Semantic);
    let description = match rule {
        Some(r) => r.description.clone(),
        None => build_semantic_description(&candidate.text_a, &candidate.text_b, confidence_percent),
    };

    Contradiction::new(
        candidate.clause_a_id,
        candidate.clause_b_id,
        owner,
        kind,
        confidence_percent,
        description,
    )
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use contradiction_ids::DocumentId;

    fn ids() -> (ClauseId, ClauseId) {
        (ClauseId::new(), ClauseId::new())
    }

    fn owner() -> ContradictionOwner {
        ContradictionOwner::Document(DocumentId::new())
    }

    #[test]
    fn semantic_pair_below_min_score_is_rejected() {
        let (a, b) = ids();
        let candidate = DecisionCandidate {
            clause_a_id: a,
            clause_b_id: b,
            text_a: "the term shall be thirty days".into(),
            text_b: "the term shall be ninety days".into(),
            rule_violation: None,
        };
        let nli = NliScores { contradiction: 0.6, entailment: 0.1, neutral: 0.3 };
        assert!(decide(&candidate, nli, owner()).is_none());
    }

    #[test]
    fn semantic_pair_above_min_score_and_dominant_is_accepted() {
        let (a, b) = ids();
        let candidate = DecisionCandidate {
            clause_a_id: a,
            clause_b_id: b,
            text_a: "the term shall be thirty days".into(),
            text_b: "the term shall be ninety days".into(),
            rule_violation: None,
        };
        let nli = NliScores { contradiction: 0.9, entailment: 0.05, neutral: 0.05 };
        let result = decide(&candidate, nli, owner());
        assert!(result.is_some());
        assert_eq!(result.unwrap().kind, ContradictionType::Semantic);
    }

    #[test]
    fn entailment_veto_rejects_even_high_contradiction_score() {
        let (a, b) = ids();
        let candidate = DecisionCandidate {
            clause_a_id: a,
            clause_b_id: b,
            text_a: "text a".into(),
            text_b: "text b".into(),
            rule_violation: None,
        };
        let nli = NliScores { contradiction: 0.8, entailment: 0.6, neutral: 0.1 };
        assert!(decide(&candidate, nli, owner()).is_none());
    }

    #[test]
    fn numeric_rule_bypasses_gates_even_with_low_contradiction_score() {
        let (a, b) = ids();
        let rule = RuleViolation {
            clause_a_id: a,
            clause_b_id: b,
            kind: ContradictionType::Numeric,
            description: "Numeric mismatch: 30 vs 90".into(),
            confidence: 0.9,
        };
        let candidate = DecisionCandidate {
            clause_a_id: a,
            clause_b_id: b,
            text_a: "thirty days".into(),
            text_b: "ninety days".into(),
            rule_violation: Some(rule),
        };
        let nli = NliScores { contradiction: 0.2, entailment: 0.7, neutral: 0.1 };
        let result = decide(&candidate, nli, owner());
        assert!(result.is_some());
        let c = result.unwrap();
        assert_eq!(c.kind, ContradictionType::Numeric);
        assert_eq!(c.confidence, 90.0);
    }

    #[test]
    fn merge_deduplicates_pair_seen_in_both_similarity_and_rules() {
        let (a, b) = ids();
        let similarity = vec![(a, b, "text a".to_string(), "text b".to_string())];
        let rule = RuleViolation {
            clause_a_id: a,
            clause_b_id: b,
            kind: ContradictionType::Numeric,
            description: "desc".into(),
            confidence: 0.9,
        };
        let merged = merge_candidates(&similarity, &[rule]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].rule_violation.is_some());
    }

    #[test]
    fn prefilter_drops_low_overlap_pairs() {
        let (a, b) = ids();
        let candidates = vec![DecisionCandidate {
            clause_a_id: a,
            clause_b_id: b,
            text_a: "apples and oranges are fruit".into(),
            text_b: "quantum computing uses superposition states".into(),
            rule_violation: None,
        }];
        assert!(prefilter_by_overlap(candidates, 0.30).is_empty());
    }

    #[rstest::rstest]
    #[case::dominant_contradiction_passes(0.9, 0.05, 0.05, true)]
    #[case::below_min_score_fails(0.6, 0.1, 0.3, false)]
    #[case::entailment_dominates_fails(0.55, 0.6, 0.05, false)]
    #[case::neutral_dominates_fails(0.55, 0.1, 0.6, false)]
    #[case::entailment_veto_fails(0.8, 0.55, 0.1, false)]
    fn semantic_gates_match_expected_outcome(
        #[case] contradiction: f64,
        #[case] entailment: f64,
        #[case] neutral: f64,
        #[case] expect_some: bool,
    ) {
        let (a, b) = ids();
        let candidate = DecisionCandidate {
            clause_a_id: a,
            clause_b_id: b,
            text_a: "the supplier shall deliver goods within the agreed window".into(),
            text_b: "the supplier shall deliver goods outside the agreed window".into(),
            rule_violation: None,
        };
        let nli = NliScores { contradiction, entailment, neutral };
        assert_eq!(decide(&candidate, nli, owner()).is_some(), expect_some);
    }
}
