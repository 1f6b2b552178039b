//! Errors surfaced by extraction, segmentation, and scoring.

use thiserror::Error;

/// Errors that can occur while pulling raw text out of an uploaded document.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("unsupported file type: {0}. Supported types: .pdf, .docx, .doc, .txt")]
    UnsupportedFileType(String),

    #[error("no text could be extracted from PDF")]
    EmptyPdf,

    #[error("no text could be extracted from DOCX")]
    EmptyDocx,

    #[error("no text could be extracted from TXT file")]
    EmptyTxt,

    #[error("failed to parse PDF: {0}")]
    PdfParse(#[from] lopdf::Error),

    #[error("failed to read DOCX archive: {0}")]
    ZipRead(#[from] zip::result::ZipError),

    #[error("failed to parse DOCX XML: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("failed to decode text file with either UTF-8 or Latin-1")]
    UndecodableText,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by model-backed components (embedding, NER, NLI) when the
/// underlying runtime fails outright, as opposed to degrading gracefully.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("embedding batch returned {actual} vectors for {expected} inputs")]
    BatchSizeMismatch { expected: usize, actual: usize },
}

pub type ExtractionResult<T> = std::result::Result<T, ExtractionError>;
pub type ModelResult<T> = std::result::Result<T, ModelError>;
