//! Named-entity extraction (C4) and the entity-based contradiction checks
//! that ride on top of it.
//!
//! The extractor itself is a trait so the pipeline doesn't hard-code a
//! particular model runtime; callers bind a concrete implementation (ONNX,
//! a remote inference endpoint, ...) at the edges. If no model is available
//! the pipeline is expected to degrade gracefully to empty entity maps
//! rather than fail the whole run, matching the original service's
//! behavior when its NER model failed to load.

use std::collections::BTreeMap;

use contradiction_core::model::Clause;

/// Entity labels retained for contradiction detection. Anything a model
/// emits outside this set (e.g. spaCy's `WORK_OF_ART`, `NORP`) is dropped.
pub const RETAINED_LABELS: &[&str] = &[
    "PERSON", "ORG", "GPE", "LOC", "DATE", "TIME", "MONEY", "PERCENT", "QUANTITY", "CARDINAL",
    "ORDINAL", "LAW", "PRODUCT", "EVENT",
];

pub type EntityMap = BTreeMap<String, Vec<String>>;

/// Extracts named entities from clause text, grouped by label.
pub trait EntityExtractor: Send + Sync {
    /// Runs extraction over a batch of texts, one entity map per input in
    /// the same order. Implementations should batch internally (the model
    /// this was grounded on recommends batches of 128+ for throughput) and
    /// must never panic on a text it can't process — an empty map for that
    /// entry is always an acceptable answer.
    fn extract_batch(&self, texts: &[String]) -> Vec<EntityMap>;
}

/// An extractor that always returns empty maps, used when no model backend
/// is configured. The rest of the pipeline treats this identically to a
/// partially-failed real extractor: rule checks involving entities simply
/// never fire.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEntityExtractor;

impl EntityExtractor for NoopEntityExtractor {
    fn extract_batch(&self, texts: &[String]) -> Vec<EntityMap> {
        vec![EntityMap::new(); texts.len()]
    }
}

/// Extracts entities for every clause text, chunking so a single call never
/// exceeds `chunk_size` inputs, mirroring [`embed_all`]'s chunking for the
/// embedding stage.
///
/// [`embed_all`]: crate::embed_all
pub fn extract_all(extractor: &dyn EntityExtractor, texts: &[String], chunk_size: usize) -> Vec<EntityMap> {
    if texts.is_empty() {
        return Vec::new();
    }
    if texts.len() <= chunk_size {
        return extractor.extract_batch(texts);
    }

    let mut all = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(chunk_size) {
        all.extend(extractor.extract_batch(chunk));
    }
    all
}

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "shall", "should", "may", "might", "can", "could", "of",
    "in", "to", "for", "and", "or", "but", "on", "at", "by", "with", "from", "as", "into", "that",
    "this", "it", "its", "not", "no", "if", "so", "than", "then", "such", "also", "any", "all",
    "each", "every", "both", "other",
];

fn content_word_overlap(a: &str, b: &str) -> f64 {
    let stop: std::collections::HashSet<&str> = STOP_WORDS.iter().copied().collect();
    let words_a: std::collections::HashSet<String> = a
        .to_lowercase()
        .split_whitespace()
        .filter(|w| !stop.contains(w) && w.len() > 2)
        .map(String::from)
        .collect();
    let words_b: std::collections::HashSet<String> = b
        .to_lowercase()
        .split_whitespace()
        .filter(|w| !stop.contains(w) && w.len() > 2)
        .map(String::from)
        .collect();
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }
    words_a.intersection(&words_b).count() as f64 / words_a.len().max(words_b.len()) as f64
}

/// An entity-driven contradiction candidate, not yet a [`Contradiction`]:
/// the decision stage (C8) still has to run NLI and confidence scaling over
/// these before anything is stored.
///
/// [`Contradiction`]: contradiction_core::model::Contradiction
#[derive(Debug, Clone, PartialEq)]
pub struct RuleViolation {
    pub clause_a_id: contradiction_ids::ClauseId,
    pub clause_b_id: contradiction_ids::ClauseId,
    pub kind: contradiction_core::model::ContradictionType,
    pub description: String,
    pub confidence: f64,
}

struct LabelConflictSpec {
    labels: &'static [&'static str],
    kind: contradiction_core::model::ContradictionType,
    describe: fn(&str, &str) -> String,
    confidence: f64,
}

fn label_conflict_specs() -> [LabelConflictSpec; 5] {
    use contradiction_core::model::ContradictionType as T;
    [
        LabelConflictSpec {
            labels: &["DATE", "TIME"],
            kind: T::Date,
            describe: |a, b| format!("Date/time conflict: {a} vs {b}"),
            confidence: 0.85,
        },
        LabelConflictSpec {
            labels: &["MONEY", "PERCENT"],
            kind: T::Financial,
            describe: |a, b| format!("Financial conflict: {a} vs {b}"),
            confidence: 0.88,
        },
        LabelConflictSpec {
            labels: &["PERSON", "ORG"],
            kind: T::Entity,
            describe: |a, b| format!("Entity conflict: {a} vs {b}"),
            confidence: 0.75,
        },
        LabelConflictSpec {
            labels: &["GPE", "LOC"],
            kind: T::Location,
            describe: |a, b| format!("Location conflict: {a} vs {b}"),
            confidence: 0.78,
        },
        LabelConflictSpec {
            labels: &["QUANTITY", "CARDINAL"],
            kind: T::Quantity,
            describe: |a, b| format!("Quantity conflict: {a} vs {b}"),
            confidence: 0.80,
        },
    ]
}

/// Compares two clauses' entity maps and emits a violation per label
/// family (date/time, money/percent, person/org, location, quantity) where
/// both sides have entities of that family but the value sets are
/// completely disjoint. Requires >=50% topical word overlap first so
/// unrelated clauses that happen to mention different entities don't fire,
/// and skips a family if the combined entity count exceeds 4 (more likely
/// an enumeration than a conflict).
pub fn check_entity_contradictions(
    clause_a: &Clause,
    clause_b: &Clause,
    entities_a: &EntityMap,
    entities_b: &EntityMap,
) -> Vec<RuleViolation> {
    if entities_a.is_empty() || entities_b.is_empty() {
        return Vec::new();
    }
    if clause_a.text.split_whitespace().count() < 8 || clause_b.text.split_whitespace().count() < 8
    {
        return Vec::new();
    }
    if content_word_overlap(&clause_a.text, &clause_b.text) < 0.50 {
        return Vec::new();
    }

    let mut violations = Vec::new();
    for spec in label_conflict_specs() {
        let vals_a: Vec<&String> = spec
            .labels
            .iter()
            .flat_map(|l| entities_a.get(*l).into_iter().flatten())
            .collect();
        let vals_b: Vec<&String> = spec
            .labels
            .iter()
            .flat_map(|l| entities_b.get(*l).into_iter().flatten())
            .collect();
        if vals_a.is_empty() || vals_b.is_empty() {
            continue;
        }

        let set_a: std::collections::HashSet<String> =
            vals_a.iter().map(|v| v.to_lowercase()).collect();
        let set_b: std::collections::HashSet<String> =
            vals_b.iter().map(|v| v.to_lowercase()).collect();

        if set_a.is_disjoint(&set_b) {
            if set_a.len() + set_b.len() > 4 {
                continue;
            }
            let a_desc = vals_a.iter().take(3).map(|s| s.as_str()).collect::<Vec<_>>().join(", ");
            let b_desc = vals_b.iter().take(3).map(|s| s.as_str()).collect::<Vec<_>>().join(", ");
            violations.push(RuleViolation {
                clause_a_id: clause_a.id,
                clause_b_id: clause_b.id,
                kind: spec.kind,
                description: (spec.describe)(&a_desc, &b_desc),
                confidence: spec.confidence,
            });
        }
    }
    violations
}
