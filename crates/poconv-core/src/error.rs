//! Error types for the poconv-core library.

use thiserror::Error;

use crate::models::line::{ExtractionMethod, Transcript};

/// Main error type for the poconv library.
#[derive(Error, Debug)]
pub enum PoError {
    /// The byte stream is not a readable document.
    #[error("document unreadable: {0}")]
    DocumentUnreadable(#[from] PdfError),

    /// Extraction produced no non-empty line on any page.
    #[error("no content extracted using {method}; the document may be a scan that requires OCR")]
    NoContentExtracted {
        /// Method that was used.
        method: ExtractionMethod,
    },

    /// Content was extracted but no line-item anchor matched.
    #[error("no line items matched in {} extracted lines", transcript.lines.len())]
    NoItemsMatched {
        /// Full transcript, kept for diagnosis.
        transcript: Transcript,
    },

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// CSV export error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to obtain a raster image for a page.
    #[error("failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The OCR backend could not be started or its models loaded.
    #[error("OCR backend unavailable: {0}")]
    Unavailable(String),

    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Image preprocessing failed.
    #[error("preprocessing failed: {0}")]
    Preprocessing(String),
}

/// Result type for the poconv library.
pub type Result<T> = std::result::Result<T, PoError>;
