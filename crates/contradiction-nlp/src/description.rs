//! Shared semantic-description builder (C9), used by the decision stage for
//! contradictions that aren't backed by a specific rule: it diffs the two
//! clauses down to the content words unique to each side, then surfaces the
//! most telling span built from only those words instead of dumping the
//! whole text.

use std::collections::HashSet;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "shall", "should", "may", "might", "can", "could", "of",
    "in", "to", "for", "and", "or", "but", "on", "at", "by", "with", "from", "as", "into", "that",
    "this", "it", "its", "not", "no", "if", "so", "than", "then", "such", "also", "any", "all",
    "each", "every", "both", "other",
];

const MAX_SPAN_WORDS: usize = 12;

fn normalize(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase()
}

/// Lowercased, punctuation-stripped content words (stop words excluded).
fn content_words(text: &str) -> HashSet<String> {
    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    text.split_whitespace()
        .map(normalize)
        .filter(|w| !w.is_empty() && !stop.contains(w.as_str()))
        .collect()
}

/// Builds a human-readable description for a semantic (non-rule) NLI
/// contradiction. Computes the symmetric difference of each clause's content
/// words, restricts the span search on each side to its own unique words,
/// and joins the two spans as `"Semantic conflict: '{a}' vs '{b}'"`. Falls
/// back to a generic confidence-only message when either side yields no
/// usable span.
pub fn build_semantic_description(text_a: &str, text_b: &str, confidence_percent: f64) -> String {
    let words_a = content_words(text_a);
    let words_b = content_words(text_b);
    let unique_a: HashSet<String> = words_a.difference(&words_b).cloned().collect();
    let unique_b: HashSet<String> = words_b.difference(&words_a).cloned().collect();

    let span_a = extract_best_span(text_a, &unique_a);
    let span_b = extract_best_span(text_b, &unique_b);

    match (span_a, span_b) {
        (Some(a), Some(b)) => format!("Semantic conflict: '{a}' vs '{b}'"),
        _ => format!("Semantic conflict detected (confidence: {confidence_percent:.0}%)"),
    }
}

/// Extracts the longest contiguous run of words from `text` that are in
/// `unique_words` (one word of leading context included), capped at
/// [`MAX_SPAN_WORDS`], trimmed of trailing punctuation. Returns `None` if no
/// run is found.
fn extract_best_span(text: &str, unique_words: &HashSet<String>) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return None;
    }

    let is_unique = |w: &str| unique_words.contains(&normalize(w));

    let mut best_start = None;
    let mut best_len = 0usize;
    let mut i = 0;
    while i < words.len() {
        if !is_unique(words[i]) {
            i += 1;
            continue;
        }
        let start = i;
        let mut seen = HashSet::new();
        let mut j = i;
        while j < words.len() && is_unique(words[j]) {
            if !seen.insert(normalize(words[j])) {
                break;
            }
            j += 1;
        }
        let len = j - start;
        if len > best_len {
            best_len = len;
            best_start = Some(start);
        }
        i = j.max(i + 1);
    }

    let start = best_start?;
    if best_len == 0 {
        return None;
    }

    let with_context = start.saturating_sub(1);
    let end = (with_context + MAX_SPAN_WORDS.min(best_len + 1)).min(words.len());
    if with_context >= end {
        return None;
    }

    let span = words[with_context..end].join(" ");
    let trimmed = span.trim_end_matches(|c: char| c.is_ascii_punctuation());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_distinctive_span_from_each_clause() {
        let a = "The contractor shall deliver the equipment within thirty days of signing.";
        let b = "The contractor shall deliver the equipment within ninety days of signing.";
        let desc = build_semantic_description(a, b, 82.5);
        assert!(desc.starts_with("Semantic conflict: '"));
        assert!(desc.contains("' vs '"));
        assert!(desc.contains("thirty"));
        assert!(desc.contains("ninety"));
    }

    #[test]
    fn shared_words_are_excluded_from_both_spans() {
        let a = "The warranty period is thirty days from delivery.";
        let b = "The warranty period is ninety days from delivery.";
        let desc = build_semantic_description(a, b, 91.0);
        assert!(desc.contains("thirty"));
        assert!(desc.contains("ninety"));
        assert!(!desc.contains("warranty period"));
    }

    #[test]
    fn falls_back_to_generic_message_for_empty_text() {
        let desc = build_semantic_description("", "", 60.0);
        assert_eq!(desc, "Semantic conflict detected (confidence: 60%)");
    }

    #[test]
    fn falls_back_when_clauses_share_every_content_word() {
        let desc = build_semantic_description("the fee is due monthly", "the fee is due monthly", 55.0);
        assert_eq!(desc, "Semantic conflict detected (confidence: 55%)");
    }

    #[test]
    fn span_is_capped_at_max_words() {
        let long = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu nu xi omicron pi";
        let unique: HashSet<String> = content_words(long);
        let span = extract_best_span(long, &unique).unwrap();
        assert!(span.split_whitespace().count() <= MAX_SPAN_WORDS + 1);
    }

    #[test]
    fn stops_at_repeated_content_word() {
        let text = "report report report unique words here";
        let unique = content_words(text);
        let span = extract_best_span(text, &unique);
        assert!(span.is_some());
    }
}
