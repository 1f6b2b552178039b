//! Sentence-level clause segmentation.
//!
//! Extracts complete, assertive sentences from extracted document text.
//! Only sentences that make a claim (contain a verb, proper structure,
//! sentence-like shape) survive; headings, page furniture, boilerplate, and
//! data rows are discarded. Rust's `regex` crate has no lookaround, so the
//! sentence-boundary split that the original used `(?<=[.;?!])`/`(?=[A-Z])`
//! for is done with a small hand-written scanner instead (see
//! `split_sentences`).

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

static SECTION_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)(?:^|\n)(?:(?:\d+\.)+\s+|(?:Article|Section|Chapter|Part)\s+\d+[:.]?\s+)([^\n]+)").unwrap()
});

static BULLET_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\n)\s*(?:[•\-*]|\d+[.)])\s+").unwrap());

static LEADING_NUMBERING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:\d+\.)+\s*").unwrap());
static LEADING_LETTER_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^[a-z]\)\s+").unwrap());
static LEADING_ROMAN_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:i{1,3}|iv|vi{0,3}|ix|x{1,3})[.)]\s+").unwrap());

static HAS_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:is|are|was|were|be|been|being|am",
        r"|have|has|had|having",
        r"|do|does|did|doing",
        r"|will|would|shall|should|may|might|can|could|must",
        r"|include[sd]?|contain[sd]?|consist[sd]?|comprise[sd]?",
        r"|provide[sd]?|require[sd]?|specify|specifies|specified",
        r"|state[sd]?|define[sd]?|describe[sd]?|indicate[sd]?",
        r"|allow[sd]?|permit[sd]?|prohibit[sd]?|restrict[sd]?",
        r"|ensure[sd]?|maintain[sd]?|establish(?:es|ed)?",
        r"|determine[sd]?|affect[sd]?|impact[sd]?|influence[sd]?",
        r"|increase[sd]?|decrease[sd]?|reduce[sd]?|improve[sd]?",
        r"|exceed[sd]?|remain[sd]?|occur[sd]?|exist[sd]?",
        r"|operate[sd]?|function[sd]?|perform[sd]?",
        r"|submit[sd]?|report[sd]?|recommend[sd]?",
        r"|manage[sd]?|monitor[sd]?|assess(?:es|ed)?",
        r"|predict[sd]?|estimate[sd]?|measure[sd]?",
        r"|implement(?:ed|s)?|apply|applies|applied",
        r"|use[sd]?|using|employ[sd]?",
        r"|demonstrate[sd]?|show[sd]?|suggest[sd]?",
        r"|result[sd]?|cause[sd]?|lead[sd]?|contribute[sd]?)\b",
    ))
    .unwrap()
});

static STARTS_SENTENCE_LIKE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^[A-Z0-9"'(]"#).unwrap());

static PAGE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:page\s+)?\d+(?:\s*(?:of|/)\s*\d+)?$").unwrap());
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").unwrap());
static TOC_ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{3,}\s*\d+$").unwrap());
static DATE_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:date[:\s]*)?(?:\d{1,2}[/\-.]\d{1,2}[/\-.]\d{2,4}",
        r"|(?:january|february|march|april|may|june|july|august|september|october|november|december)\s+\d{1,2},?\s*\d{2,4}",
        r"|\d{1,2}\s+(?:january|february|march|april|may|june|july|august|september|october|november|december),?\s*\d{2,4})$",
    ))
    .unwrap()
});
static NUMERIC_ROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\d\s.,$%€£()\-+/|:]+$").unwrap());
static SIGNATURE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:(?:signed|signature|authorized|approved|witnessed|notarized)(?:\s+by)?[:\s]|_{3,}|\.{3,}\s*$)").unwrap()
});
static COPYRIGHT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:©|\(c\)|copyright|all\s+rights\s+reserved|confidential\s+and\s+proprietary)").unwrap()
});
static HEADER_FOOTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:private\s+&?\s*confidential|draft|for\s+internal\s+use\s+only",
        r"|strictly\s+confidential|do\s+not\s+distribute",
        r"|privileged\s+and\s+confidential",
        r"|prepared\s+(?:by|for)[:\s]",
        r"|document\s+(?:no|number|ref|reference|id|version)[:\s#]",
        r"|rev(?:ision)?[:\s.]?\s*\d",
        r"|version[:\s.]?\s*\d",
        r"|effective\s+date[:\s]",
        r"|last\s+(?:updated|modified|revised)[:\s])",
    ))
    .unwrap()
});
static DISCLAIMER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)(?:this\s+document\s+is\s+(?:provided|furnished)\s+(?:as\s+is|for\s+information)",
        r"|(?:no|without)\s+(?:warranty|guarantee|representation)",
        r"|for\s+informational\s+purposes\s+only",
        r"|e\.?\s*&?\s*o\.?\s*e\.?",
        r"|errors?\s+and\s+omissions?\s+excepted)",
    ))
    .unwrap()
});
static TABLE_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:(?:sr\.?\s*no|s\.?\s*no|sl\.?\s*no|#|item|description|qty|quantity",
        r"|amount|total|subtotal|unit|rate|price|cost|value|balance",
        r"|debit|credit|particulars|remarks?)\s*[|\t,]){2,}",
    ))
    .unwrap()
});
static BOILERPLATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:",
        r"this\s+(?:section|chapter|report|document|annex|appendix|part)\s+(?:describes|outlines|provides|presents|discusses|covers|deals\s+with|sets\s+out|contains|summarizes|explains|focuses|examines)",
        r"|for\s+the\s+purposes?\s+of\s+this\s+(?:document|report|agreement|policy|standard|guideline)",
        r"|the\s+following\s+(?:section|table|figure|chart|diagram|list|annex|appendix)",
        r"|as\s+(?:described|defined|outlined|mentioned|noted|discussed|stated|specified|indicated|shown|illustrated)\s+(?:in|above|below|earlier|previously)",
        r"|(?:see|refer\s+to)\s+(?:section|chapter|annex|appendix|table|figure|paragraph|page|clause)",
        r"|in\s+accordance\s+with\s+(?:section|clause|article|annex|appendix)",
        r"|note[:\s]",
        r"|source[:\s]",
        r")",
    ))
    .unwrap()
});
static CITATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)(?:\[\d+\]",
        r"|\((?:(?:19|20)\d{2}[a-z]?(?:;\s*)?)+\)",
        r"|\b(?:ibid|op\.?\s*cit|et\s+al)\.?",
        r"|^\d+\.\s+[A-Z][^.]{5,60}\.\s+(?:(?:19|20)\d{2}))",
    ))
    .unwrap()
});
static LIST_INTRO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^.*(?:as\s+follows|the\s+following|includes?\s+(?:the\s+following|but\s+not\s+limited\s+to)|such\s+as|for\s+example|e\.g\.|i\.e\.)[:\s]*$").unwrap()
});
static CHAPTER_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:",
        r"(?:chapter|part|module|unit|volume|phase|stage|annex|appendix)\s*[-\x{2013}\x{2014}]?\s*\d+",
        r"|\d+\.\s*(?:introduction|conclusion|summary|overview|background|methodology|results|discussion|analysis|objectives?|scope|limitations?|recommendations?)",
        r"|(?:abstract|acknowledgements?|preface|foreword|executive\s+summary|list\s+of\s+(?:figures|tables|abbreviations))",
        r")\s*$",
    ))
    .unwrap()
});
static RUNNING_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\|\s*\d{1,4}\s|^\d{1,4}\s+[A-Z]|[A-Z][^|]{5,}\|\s*\d)").unwrap()
});
static EMAIL_PHONE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:email|e-mail|tel|phone|fax|mobile|contact)[:\s]").unwrap());
static ADDRESS_ZIP_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{5,6}\b$").unwrap());

const SKIP_SECTION_TITLES: &[&str] = &[
    "table of contents",
    "contents",
    "index",
    "appendix",
    "glossary",
    "definitions",
    "abbreviations",
    "acronyms",
    "references",
    "bibliography",
    "attachments",
    "annexure",
    "signature page",
    "execution page",
    "witness",
];

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "of", "in", "to", "for", "and", "or", "but", "on", "at", "by", "with",
    "from", "as", "into", "that", "this", "it", "its", "not", "no", "if", "so", "than", "then",
];

/// Runs the full segmentation pipeline over extracted, cleaned text.
pub fn segment_clauses(raw_text: &str) -> Vec<String> {
    if raw_text.trim().is_empty() {
        return Vec::new();
    }

    let mut sentences = Vec::new();

    for (is_heading, chunk) in split_sections(raw_text) {
        if is_heading {
            continue;
        }
        let heading_lower = chunk.to_lowercase();
        // `split_sections` only yields body chunks here; section-skip state
        // is handled by the caller of this loop in `split_sections_typed`
        // below — see note there.
        let _ = heading_lower;

        for bullet_chunk in BULLET_SPLIT.split(&chunk) {
            if bullet_chunk.trim().is_empty() {
                continue;
            }
            for raw in split_sentences(bullet_chunk) {
                let cleaned = clean_sentence(&raw);
                if cleaned.is_empty() {
                    continue;
                }
                if is_noise(&cleaned) {
                    continue;
                }
                if !is_sentence(&cleaned) {
                    continue;
                }
                sentences.push(cleaned);
            }
        }
    }

    let unique = deduplicate(sentences);
    log::info!(
        "segmented {} sentences from {} characters",
        unique.len(),
        raw_text.len()
    );
    unique
}

/// Splits text on section headings, tracking whether a following body chunk
/// sits inside a section whose title marks it for skipping entirely (table
/// of contents, glossary, signature page, ...). Returns `(is_heading,
/// text)` pairs in document order, mirroring the interleaved captures a
/// Python `re.split` with a capturing group would produce.
fn split_sections(raw_text: &str) -> Vec<(bool, String)> {
    let mut pieces = Vec::new();
    let mut last_end = 0;
    for caps in SECTION_HEADING.captures_iter(raw_text) {
        let whole = caps.get(0).unwrap();
        let heading = caps.get(1).unwrap();
        pieces.push((false, raw_text[last_end..whole.start()].to_string()));
        pieces.push((true, heading.as_str().trim().to_string()));
        last_end = whole.end();
    }
    pieces.push((false, raw_text[last_end..].to_string()));

    let mut in_skip_section = false;
    let mut result = Vec::with_capacity(pieces.len());
    for (is_heading, text) in pieces {
        if is_heading {
            let lower = text.to_lowercase();
            in_skip_section = SKIP_SECTION_TITLES.iter().any(|t| lower.contains(t));
            result.push((true, text));
        } else if in_skip_section {
            result.push((true, text));
        } else {
            result.push((false, text));
        }
    }
    result
}

/// Splits a chunk into sentence-shaped pieces on `[.;?!]` followed by a
/// newline, two-or-more spaces, or (for `.?!` only) a single space and an
/// uppercase letter. Rust's `regex` crate has no lookaround, so this walks
/// the string directly instead of translating the original lookbehind-based
/// pattern.
fn split_sentences(chunk: &str) -> Vec<String> {
    let chars: Vec<char> = chunk.chars().collect();
    let mut result = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        if matches!(c, '.' | ';' | '?' | '!') {
            let ws_start = i + 1;
            let mut j = ws_start;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            let ws_slice = &chars[ws_start..j];
            let ws_has_newline = ws_slice.contains(&'\n');
            let ws_len = ws_slice.len();
            let next_upper = chars.get(j).is_some_and(|c| c.is_uppercase());

            let boundary = ws_len > 0
                && (ws_has_newline
                    || ws_len >= 2
                    || (matches!(c, '.' | '?' | '!') && ws_len == 1 && next_upper));

            if boundary {
                result.push(chars[start..=i].iter().collect());
                start = j;
                i = j;
                continue;
            }
        }
        i += 1;
    }

    if start < chars.len() {
        result.push(chars[start..].iter().collect());
    }
    result
}

fn clean_sentence(raw: &str) -> String {
    let s = raw.trim();
    let s = LEADING_NUMBERING.replace(s, "");
    let s = LEADING_LETTER_ITEM.replace(&s, "");
    let s = LEADING_ROMAN_ITEM.replace(&s, "");
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_sentence(text: &str) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 8 {
        return false;
    }
    if !HAS_VERB.is_match(text) {
        return false;
    }
    if !STARTS_SENTENCE_LIKE.is_match(text) {
        return false;
    }
    true
}

fn is_noise(text: &str) -> bool {
    let stripped = text.trim();
    let words: Vec<&str> = stripped.split_whitespace().collect();

    if words.len() < 6 {
        return true;
    }
    if PAGE_NUMBER.is_match(stripped) {
        return true;
    }
    if URL.is_match(stripped) {
        return true;
    }
    if TOC_ENTRY.is_match(stripped) {
        return true;
    }
    if DATE_ONLY.is_match(stripped) {
        return true;
    }
    if NUMERIC_ROW.is_match(stripped) {
        return true;
    }
    if SIGNATURE_LINE.is_match(stripped) {
        return true;
    }
    if COPYRIGHT.is_match(stripped) && words.len() < 20 {
        return true;
    }
    if HEADER_FOOTER.is_match(stripped) {
        return true;
    }
    if DISCLAIMER.is_match(stripped) && words.len() < 30 {
        return true;
    }
    if TABLE_HEADER.is_match(stripped) {
        return true;
    }
    if BOILERPLATE.is_match(stripped) && words.len() < 25 {
        return true;
    }
    if CITATION.is_match(stripped) && words.len() < 20 {
        return true;
    }
    if LIST_INTRO.is_match(stripped) {
        return true;
    }
    if CHAPTER_HEADING.is_match(stripped) {
        return true;
    }
    if RUNNING_HEADER.is_match(stripped) && words.len() < 15 {
        return true;
    }
    if stripped.chars().all(|c| !c.is_alphabetic() || c.is_uppercase()) && stripped.len() < 60 {
        return true;
    }
    let alpha_chars = stripped.chars().filter(|c| c.is_alphabetic()).count();
    if !stripped.is_empty() && (alpha_chars as f64 / stripped.len() as f64) < 0.35 {
        return true;
    }
    if EMAIL_PHONE_LINE.is_match(stripped) {
        return true;
    }
    if ADDRESS_ZIP_TAIL.is_match(stripped) && words.len() < 8 {
        return true;
    }

    false
}

/// Removes exact duplicates and near-duplicates (>=85% content-word
/// overlap), keeping the first occurrence and preserving document order.
fn deduplicate(sentences: Vec<String>) -> Vec<String> {
    let mut seen_norm: HashSet<String> = HashSet::new();
    let mut seen_word_sets: Vec<HashSet<String>> = Vec::new();
    let mut unique = Vec::new();

    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();

    for sent in sentences {
        let norm = sent.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ");
        if seen_norm.contains(&norm) {
            continue;
        }
        seen_norm.insert(norm.clone());

        let content_words: HashSet<String> = norm
            .split_whitespace()
            .filter(|w| !stop.contains(w) && w.len() > 2)
            .map(String::from)
            .collect();

        let mut is_near_dup = false;
        for prev in &seen_word_sets {
            if content_words.is_empty() || prev.is_empty() {
                continue;
            }
            let overlap = content_words.intersection(prev).count() as f64
                / content_words.len().max(prev.len()) as f64;
            if overlap >= 0.85 {
                is_near_dup = true;
                break;
            }
        }
        if is_near_dup {
            continue;
        }

        seen_word_sets.push(content_words);
        unique.push(sent);
    }

    unique
}

/// Finds the nearest section heading preceding `position` in `text`.
pub fn extract_section_heading(text: &str, position: usize) -> String {
    let before = &text[..position.min(text.len())];
    SECTION_HEADING
        .captures_iter(before)
        .last()
        .map(|c| c.get(1).unwrap().as_str().trim().to_string())
        .unwrap_or_default()
}

/// Map from clause text to the section heading it falls under, computed in
/// one pass over the document so callers don't re-scan per clause.
pub fn section_headings_for(text: &str, positions: &[usize]) -> HashMap<usize, String> {
    positions
        .iter()
        .map(|&pos| (pos, extract_section_heading(text, pos)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_assertive_sentences_and_drops_short_fragments() {
        let text = "1. Introduction\n\nThe contractor shall deliver all equipment within thirty days of signing. Total.";
        let clauses = segment_clauses(text);
        assert_eq!(clauses.len(), 1);
        assert!(clauses[0].contains("shall deliver"));
    }

    #[test]
    fn drops_page_numbers_and_headers() {
        let text = "Page 3\n\nAcme Corp Confidential\n\nThe agreement remains binding until terminated by either party.";
        let clauses = segment_clauses(text);
        assert_eq!(clauses.len(), 1);
        assert!(clauses[0].contains("remains binding"));
    }

    #[test]
    fn skip_section_titles_drop_everything_under_them() {
        let text = "Section 1 Glossary\n\nThis term is defined as meaning something specific here today.\n\nSection 2 Obligations\n\nThe supplier must ship the goods within ten business days always.";
        let clauses = segment_clauses(text);
        assert_eq!(clauses.len(), 1);
        assert!(clauses[0].contains("must ship"));
    }

    #[test]
    fn near_duplicate_sentences_collapse_to_first() {
        let text = "The tenant shall pay rent of five hundred dollars monthly without exception. The tenant shall pay rent of five hundred dollars every month without exception.";
        let clauses = segment_clauses(text);
        assert_eq!(clauses.len(), 1);
    }

    #[test]
    fn sentence_without_verb_is_rejected() {
        assert!(!is_sentence("A very long list of nouns and adjectives here today"));
    }

    #[test]
    fn sentence_too_short_is_rejected() {
        assert!(!is_sentence("The party shall comply."));
    }

    #[test]
    fn all_caps_short_line_is_noise() {
        assert!(is_noise("TERMS AND CONDITIONS APPLY"));
    }

    #[test]
    fn mostly_numeric_line_is_noise() {
        assert!(is_noise("123 456 789 $500 12/01/2024 99999"));
    }

    #[test]
    fn leading_numbering_is_stripped() {
        assert_eq!(clean_sentence("1.2.3 The supplier must comply."), "The supplier must comply.");
    }

    #[test]
    fn split_sentences_breaks_on_period_space_uppercase() {
        let parts = split_sentences("First clause here. Second clause starts now.");
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn extract_section_heading_finds_nearest_preceding_heading() {
        let text = "1. Payment Terms\nThe buyer shall pay within 30 days.\n2. Delivery\nThe seller shall ship within 10 days.";
        let pos = text.find("The seller").unwrap();
        assert_eq!(extract_section_heading(text, pos), "Delivery");
    }
}
