//! Raw-text extraction from PDF, DOCX/DOC, and TXT uploads.
//!
//! PDF goes through `lopdf`'s content-stream text operators, DOCX through a
//! manual ZIP + XML walk of `word/document.xml` (docx-rs is writer-only),
//! and TXT through a UTF-8-then-Latin-1 decode fallback. `.doc` is routed
//! through the DOCX path on the assumption that whatever produced it saved
//! in the modern container format; true legacy binary `.doc` is out of
//! scope.

use std::io::Cursor;

use once_cell::sync::Lazy;
use regex::Regex;
use zip::ZipArchive;

use crate::error::{ExtractionError, ExtractionResult};

static PIPE_NUMBER_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|\s*\d{1,4}\s").unwrap());
static STANDALONE_NUMBER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)\d{1,4}(?:\s|$)").unwrap());
static STANDALONE_PAGE_NUMBER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*[-\u{2013}\u{2014}]?\s*(?:page\s+)?\d{1,4}\s*[-\u{2013}\u{2014}]?\s*$").unwrap());
static PURE_NUMERIC_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d\s.,$%€£()\-+/|:]+$").unwrap());
static MULTISPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r" +").unwrap());

/// Extracts and normalizes text from a file, dispatching on its extension.
pub fn extract_text(bytes: &[u8], filename: &str) -> ExtractionResult<String> {
    let ext = filename
        .rsplit('.')
        .next()
        .map(str::to_lowercase)
        .unwrap_or_default();

    let raw = match ext.as_str() {
        "pdf" => extract_pdf(bytes)?,
        "docx" | "doc" => extract_docx(bytes)?,
        "txt" => extract_txt(bytes)?,
        other => return Err(ExtractionError::UnsupportedFileType(format!(".{other}"))),
    };

    Ok(clean_text(&raw))
}

fn extract_pdf(bytes: &[u8]) -> ExtractionResult<String> {
    let doc = lopdf::Document::load_mem(bytes)?;
    let page_ids: Vec<_> = doc.get_pages().into_keys().collect();
    let num_pages = page_ids.len();

    let mut parts = Vec::with_capacity(page_ids.len());
    for page_id in page_ids {
        match doc.extract_text(&[page_id]) {
            Ok(text) if !text.trim().is_empty() => parts.push(text),
            Ok(_) => {}
            Err(e) => log::warn!("failed to extract text from PDF page {page_id:?}: {e}"),
        }
    }

    let raw = parts.join("\n\n");
    if raw.trim().is_empty() {
        return Err(ExtractionError::EmptyPdf);
    }

    Ok(strip_repeated_headers_and_footers(&raw, num_pages))
}

/// Removes header/footer lines that repeat across a large fraction of
/// pages, after normalizing away page-number tokens so "Title | 3" and
/// "Title | 12" count as the same line, plus standalone page-number lines.
fn strip_repeated_headers_and_footers(raw_text: &str, num_pages: usize) -> String {
    let lines: Vec<&str> = raw_text.split('\n').collect();
    if num_pages < 2 || lines.len() < 10 {
        return raw_text.trim().to_string();
    }

    let normalize = |line: &str| -> String {
        let s = line.trim();
        let s = PIPE_NUMBER_TOKEN.replace_all(s, "| # ");
        let s = STANDALONE_NUMBER_TOKEN.replace_all(&s, " # ");
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    };

    let mut norm_counts: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for line in &lines {
        let stripped = line.trim();
        if !stripped.is_empty() {
            *norm_counts.entry(normalize(stripped)).or_insert(0) += 1;
        }
    }

    let repeat_threshold = (num_pages as f64 * 0.4).floor().max(2.0) as usize;
    let repeated_norms: std::collections::HashSet<String> = norm_counts
        .into_iter()
        .filter(|(norm, count)| *count >= repeat_threshold && norm.len() < 140)
        .map(|(norm, _)| norm)
        .collect();

    let mut cleaned = Vec::with_capacity(lines.len());
    for line in lines {
        let stripped = line.trim();
        if !stripped.is_empty() && repeated_norms.contains(&normalize(stripped)) {
            continue;
        }
        if STANDALONE_PAGE_NUMBER_LINE.is_match(line) {
            continue;
        }
        cleaned.push(line);
    }

    cleaned.join("\n").trim().to_string()
}

fn extract_docx(bytes: &[u8]) -> ExtractionResult<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let xml = {
        let mut file = archive.by_name("word/document.xml")?;
        let mut buf = String::new();
        std::io::Read::read_to_string(&mut file, &mut buf)?;
        buf
    };

    let mut parts = Vec::new();
    walk_document_xml(&xml, &mut parts)?;

    let raw = parts.join("\n\n");
    if raw.trim().is_empty() {
        return Err(ExtractionError::EmptyDocx);
    }
    Ok(raw.trim().to_string())
}

/// A single logical table row's worth of cell text, accumulated while
/// walking the XML so a whole table's numeric-density check can run before
/// any of its text is committed to `parts`.
#[derive(Default)]
struct TableCtx {
    rows: Vec<Vec<String>>,
    current_row: Vec<String>,
    current_cell: String,
}

fn walk_document_xml(xml: &str, parts: &mut Vec<String>) -> ExtractionResult<()> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut paragraph = String::new();
    let mut in_paragraph = false;
    let mut table_depth = 0usize;
    let mut table: Option<TableCtx> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"tbl" => {
                    table_depth += 1;
                    table = Some(TableCtx::default());
                }
                b"tr" if table.is_some() => {}
                b"tc" if table.is_some() => {}
                b"p" => {
                    in_paragraph = true;
                    paragraph.clear();
                }
                _ => {}
            },
            Event::Text(t) if in_paragraph || table.is_some() => {
                let text = t.unescape()?.into_owned();
                if let Some(ctx) = table.as_mut() {
                    ctx.current_cell.push_str(&text);
                } else {
                    paragraph.push_str(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    in_paragraph = false;
                    if !paragraph.trim().is_empty() {
                        parts.push(paragraph.clone());
                    }
                }
                b"tc" => {
                    if let Some(ctx) = table.as_mut() {
                        let cell = std::mem::take(&mut ctx.current_cell);
                        ctx.current_row.push(cell);
                    }
                }
                b"tr" => {
                    if let Some(ctx) = table.as_mut() {
                        let row = std::mem::take(&mut ctx.current_row);
                        ctx.rows.push(row);
                    }
                }
                b"tbl" => {
                    table_depth = table_depth.saturating_sub(1);
                    if table_depth == 0 {
                        if let Some(ctx) = table.take() {
                            emit_table_if_not_numeric(&ctx, parts);
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Mirrors the Python extractor's "skip if >50% of non-empty cells are
/// purely numeric/currency/date" heuristic, so financial or tabular data
/// tables don't flood the clause segmenter with non-prose cells.
fn emit_table_if_not_numeric(ctx: &TableCtx, parts: &mut Vec<String>) {
    let mut total_cells = 0usize;
    let mut numeric_cells = 0usize;
    for row in &ctx.rows {
        for cell in row {
            let text = cell.trim();
            if !text.is_empty() {
                total_cells += 1;
                if PURE_NUMERIC_CELL.is_match(text) {
                    numeric_cells += 1;
                }
            }
        }
    }

    if total_cells > 0 && (numeric_cells as f64 / total_cells as f64) > 0.5 {
        return;
    }

    for row in &ctx.rows {
        for cell in row {
            let text = cell.trim();
            if !text.is_empty() {
                parts.push(text.to_string());
            }
        }
    }
}

fn extract_txt(bytes: &[u8]) -> ExtractionResult<String> {
    let raw = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            // encoding_rs has no bare ISO-8859-1 decoder; Windows-1252 is a
            // superset and the closer real-world fallback for uploaded text.
            let (cow, _, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
            if had_errors {
                return Err(ExtractionError::UndecodableText);
            }
            cow.into_owned()
        }
    };

    if raw.trim().is_empty() {
        return Err(ExtractionError::EmptyTxt);
    }
    Ok(raw.trim().to_string())
}

/// Collapses blank lines and repeated spaces the same way across every
/// extractor, after format-specific extraction has already run.
fn clean_text(raw_text: &str) -> String {
    let lines: Vec<String> = raw_text
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    let joined = lines.join("\n");
    MULTISPACE.replace_all(&joined, " ").into_owned()
}
