//! Rule-based contradiction checks (C5): numeric, modal, and authority
//! mismatches, plus the NER-driven entity checks dispatched from
//! [`crate::ner`]. These run on every clause pair before candidate
//! similarity search and NLI scoring, and their hits get a lower NLI bar in
//! the decision stage (C8) since they already carry structural evidence.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

use contradiction_core::model::{Clause, ContradictionType};

use crate::ner::{check_entity_contradictions, EntityMap, RuleViolation};

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "shall", "should", "may", "might", "can", "could", "of",
    "in", "to", "for", "and", "or", "but", "on", "at", "by", "with", "from", "as", "into", "that",
    "this", "it", "its", "not", "no", "if", "so", "than", "then", "such", "also", "any", "all",
    "each", "every", "both", "other",
];

fn content_overlap(text_a: &str, text_b: &str) -> f64 {
    let stop: std::collections::HashSet<&str> = STOP_WORDS.iter().copied().collect();
    let la = text_a.to_lowercase();
    let lb = text_b.to_lowercase();
    let wa: std::collections::HashSet<&str> =
        la.split_whitespace().filter(|w| !stop.contains(w) && w.len() > 2).collect();
    let wb: std::collections::HashSet<&str> =
        lb.split_whitespace().filter(|w| !stop.contains(w) && w.len() > 2).collect();
    if wa.is_empty() || wb.is_empty() {
        return 0.0;
    }
    wa.intersection(&wb).count() as f64 / wa.len().max(wb.len()) as f64
}

static DIGIT_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").unwrap());
static DIGIT_NUMBER_WHOLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)?$").unwrap());
static WORD_PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,;.!?]").unwrap());
static MODAL_STRONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(must|shall|required|mandatory|obligatory)\b").unwrap());
static MODAL_WEAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(may|can|optional|permitted|allowed)\b").unwrap());
static AUTHORITY_TERM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(responsible|authority|department|team|manager|director)\b").unwrap());
static PROPER_NOUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b").unwrap());

fn number_words() -> &'static HashMap<&'static str, &'static str> {
    static MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
        HashMap::from([
            ("zero", "0"), ("one", "1"), ("two", "2"), ("three", "3"), ("four", "4"),
            ("five", "5"), ("six", "6"), ("seven", "7"), ("eight", "8"), ("nine", "9"),
            ("ten", "10"), ("eleven", "11"), ("twelve", "12"), ("thirteen", "13"),
            ("fourteen", "14"), ("fifteen", "15"), ("sixteen", "16"), ("seventeen", "17"),
            ("eighteen", "18"), ("nineteen", "19"), ("twenty", "20"), ("thirty", "30"),
            ("forty", "40"), ("fifty", "50"), ("sixty", "60"), ("seventy", "70"),
            ("eighty", "80"), ("ninety", "90"), ("hundred", "100"), ("thousand", "1000"),
            ("once", "1"), ("twice", "2"), ("thrice", "3"),
            ("first", "1"), ("second", "2"), ("third", "3"), ("fourth", "4"), ("fifth", "5"),
        ])
    });
    &MAP
}

fn extract_numbers(text: &str) -> Vec<String> {
    let mut nums: Vec<String> = DIGIT_NUMBER.find_iter(text).map(|m| m.as_str().to_string()).collect();
    for word in text.to_lowercase().split_whitespace() {
        let clean = WORD_PUNCTUATION.replace_all(word, "");
        if let Some(digit) = number_words().get(clean.as_ref()) {
            nums.push((*digit).to_string());
        }
    }
    nums
}

struct NumberWithContext {
    num: String,
    original: String,
    context: String,
}

fn extract_numbers_with_context(text: &str) -> Vec<NumberWithContext> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut results = Vec::new();
    for (i, word) in words.iter().enumerate() {
        let clean = WORD_PUNCTUATION.replace_all(word, "").to_string();
        let num = if DIGIT_NUMBER_WHOLE.is_match(&clean) {
            Some(clean.clone())
        } else {
            number_words().get(clean.to_lowercase().as_str()).map(|s| s.to_string())
        };
        if let Some(num) = num {
            let context = words[(i + 1).min(words.len())..(i + 3).min(words.len())]
                .join(" ")
                .trim_end_matches(['.', ',', ';', ':', '!', '?'])
                .to_string();
            results.push(NumberWithContext { num, original: clean, context });
        }
    }
    results
}

fn build_numeric_description(text_a: &str, text_b: &str, nums_a: &[String], nums_b: &[String]) -> String {
    let details_a = extract_numbers_with_context(text_a);
    let details_b = extract_numbers_with_context(text_b);

    let set_a: std::collections::HashSet<&String> = nums_a.iter().collect();
    let set_b: std::collections::HashSet<&String> = nums_b.iter().collect();
    let only_in_a: std::collections::HashSet<&String> = set_a.difference(&set_b).copied().collect();
    let only_in_b: std::collections::HashSet<&String> = set_b.difference(&set_a).copied().collect();

    let text_a_lower = text_a.to_lowercase();
    let text_b_lower = text_b.to_lowercase();

    let best_detail = |details: &[NumberWithContext],
                        only: &std::collections::HashSet<&String>,
                        other_text: &str|
     -> Option<String> {
        let mut scored: Vec<(usize, &NumberWithContext)> = details
            .iter()
            .filter(|d| only.contains(&d.num))
            .map(|d| {
                let hits = d
                    .context
                    .to_lowercase()
                    .split_whitespace()
                    .filter(|w| w.len() > 2 && other_text.contains(w))
                    .count();
                (hits, d)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.first().map(|(_, d)| format!("{} {}", d.original, d.context).trim().to_string())
    };

    let label_a = best_detail(&details_a, &only_in_a, &text_b_lower);
    let label_b = best_detail(&details_b, &only_in_b, &text_a_lower);

    if let (Some(a), Some(b)) = (&label_a, &label_b) {
        return format!("Numeric conflict: {a} vs {b}");
    }

    if !only_in_a.is_empty() && !only_in_b.is_empty() {
        let mut a_sorted: Vec<&str> = only_in_a.iter().map(|s| s.as_str()).collect();
        let mut b_sorted: Vec<&str> = only_in_b.iter().map(|s| s.as_str()).collect();
        a_sorted.sort_unstable();
        b_sorted.sort_unstable();
        return format!("Numeric conflict: {} vs {}", a_sorted.join(", "), b_sorted.join(", "));
    }
    "Numeric conflict: values differ between statements".to_string()
}

/// Flags a numeric mismatch between two structurally-similar sentences:
/// both mention numbers, the numbers differ, and the sentences share
/// enough content-word overlap (>=40%) to be about the same thing.
pub fn check_numeric_mismatch(clause_a: &Clause, clause_b: &Clause) -> Option<RuleViolation> {
    if clause_a.text.split_whitespace().count() < 8 || clause_b.text.split_whitespace().count() < 8 {
        return None;
    }

    let mut nums_a = extract_numbers(&clause_a.text);
    let mut nums_b = extract_numbers(&clause_b.text);
    if nums_a.is_empty() || nums_b.is_empty() {
        return None;
    }
    nums_a.sort_unstable();
    nums_b.sort_unstable();
    if nums_a == nums_b {
        return None;
    }

    if content_overlap(&clause_a.text, &clause_b.text) < 0.40 {
        return None;
    }

    let description = build_numeric_description(&clause_a.text, &clause_b.text, &nums_a, &nums_b);
    Some(RuleViolation {
        clause_a_id: clause_a.id,
        clause_b_id: clause_b.id,
        kind: ContradictionType::Numeric,
        description,
        confidence: 0.9,
    })
}

/// Flags a modal mismatch ("must" in one clause, "may" in the near-identical
/// counterpart) when the two clauses share >55% content-word overlap.
pub fn check_modal_mismatch(clause_a: &Clause, clause_b: &Clause) -> Option<RuleViolation> {
    let strong_a = MODAL_STRONG.is_match(&clause_a.text);
    let weak_a = MODAL_WEAK.is_match(&clause_a.text);
    let strong_b = MODAL_STRONG.is_match(&clause_b.text);
    let weak_b = MODAL_WEAK.is_match(&clause_b.text);

    if !((strong_a && weak_b) || (weak_a && strong_b)) {
        return None;
    }
    if clause_a.text.split_whitespace().count() < 8 || clause_b.text.split_whitespace().count() < 8 {
        return None;
    }
    if content_overlap(&clause_a.text, &clause_b.text) <= 0.55 {
        return None;
    }

    Some(RuleViolation {
        clause_a_id: clause_a.id,
        clause_b_id: clause_b.id,
        kind: ContradictionType::Modal,
        description: "Modal mismatch: mandatory vs optional".to_string(),
        confidence: 0.75,
    })
}

/// Flags an authority/responsibility mismatch when both clauses name
/// responsibility in similar structure but cite different proper nouns.
pub fn check_authority_mismatch(clause_a: &Clause, clause_b: &Clause) -> Option<RuleViolation> {
    if !AUTHORITY_TERM.is_match(&clause_a.text) || !AUTHORITY_TERM.is_match(&clause_b.text) {
        return None;
    }
    if clause_a.text.split_whitespace().count() < 8 || clause_b.text.split_whitespace().count() < 8 {
        return None;
    }

    let entities_a: Vec<&str> = PROPER_NOUN.find_iter(&clause_a.text).map(|m| m.as_str()).collect();
    let entities_b: Vec<&str> = PROPER_NOUN.find_iter(&clause_b.text).map(|m| m.as_str()).collect();
    if entities_a.is_empty() || entities_b.is_empty() {
        return None;
    }

    let set_a: std::collections::HashSet<&str> = entities_a.iter().copied().collect();
    let set_b: std::collections::HashSet<&str> = entities_b.iter().copied().collect();
    if set_a == set_b {
        return None;
    }

    if content_overlap(&clause_a.text, &clause_b.text) <= 0.55 {
        return None;
    }

    Some(RuleViolation {
        clause_a_id: clause_a.id,
        clause_b_id: clause_b.id,
        kind: ContradictionType::Authority,
        description: format!(
            "Authority mismatch: {} vs {}",
            entities_a.join(", "),
            entities_b.join(", ")
        ),
        confidence: 0.7,
    })
}

/// Runs every rule check over every clause pair in `clauses`, optionally
/// enriched with NER entity maps keyed by clause id.
pub fn check_contradictions_batch(
    clauses: &[Clause],
    entities_map: Option<&BTreeMap<contradiction_ids::ClauseId, EntityMap>>,
) -> Vec<RuleViolation> {
    let mut violations = Vec::new();
    let empty = EntityMap::new();

    for i in 0..clauses.len() {
        for j in (i + 1)..clauses.len() {
            let a = &clauses[i];
            let b = &clauses[j];

            if let Some(v) = check_numeric_mismatch(a, b) {
                violations.push(v);
            }
            if let Some(v) = check_modal_mismatch(a, b) {
                violations.push(v);
            }
            if let Some(v) = check_authority_mismatch(a, b) {
                violations.push(v);
            }

            if let Some(map) = entities_map {
                let ents_a = map.get(&a.id).unwrap_or(&empty);
                let ents_b = map.get(&b.id).unwrap_or(&empty);
                if !ents_a.is_empty() || !ents_b.is_empty() {
                    violations.extend(check_entity_contradictions(a, b, ents_a, ents_b));
                }
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use contradiction_ids::DocumentId;

    fn clause(text: &str) -> Clause {
        Clause::new(contradiction_ids::ClauseId::new(), DocumentId::new(), text, 0, None)
    }

    #[test]
    fn numeric_mismatch_with_high_overlap_is_flagged() {
        let a = clause("The contractor shall deliver all equipment within thirty days of signing.");
        let b = clause("The contractor shall deliver all equipment within sixty days of signing.");
        let v = check_numeric_mismatch(&a, &b).unwrap();
        assert_eq!(v.kind, ContradictionType::Numeric);
        assert!(v.description.contains("Numeric conflict"));
    }

    #[test]
    fn numeric_mismatch_without_overlap_is_not_flagged() {
        let a = clause("The contractor shall deliver all equipment within thirty days of signing.");
        let b = clause("Employees must submit timesheets every two weeks without exception please.");
        assert!(check_numeric_mismatch(&a, &b).is_none());
    }

    #[test]
    fn modal_mismatch_requires_high_overlap() {
        let a = clause("Employees must complete the mandatory safety training before starting work.");
        let b = clause("Employees may complete the mandatory safety training before starting work.");
        let v = check_modal_mismatch(&a, &b).unwrap();
        assert_eq!(v.kind, ContradictionType::Modal);
    }

    #[test]
    fn authority_mismatch_needs_different_named_parties() {
        let a = clause("The Finance Department is responsible for approving all vendor payments.");
        let b = clause("The Legal Department is responsible for approving all vendor payments.");
        let v = check_authority_mismatch(&a, &b).unwrap();
        assert_eq!(v.kind, ContradictionType::Authority);
    }

    #[test]
    fn batch_check_runs_over_every_pair() {
        let clauses = vec![
            clause("The contractor shall deliver all equipment within thirty days of signing."),
            clause("The contractor shall deliver all equipment within sixty days of signing."),
            clause("Unrelated clause about something entirely different today in the office."),
        ];
        let violations = check_contradictions_batch(&clauses, None);
        assert!(violations.iter().any(|v| v.kind == ContradictionType::Numeric));
    }
}
