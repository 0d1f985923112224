//! Core library for purchase-order conversion.
//!
//! This crate provides:
//! - PDF processing (text layer and embedded page images)
//! - OCR backends (Tesseract CLI, pure-Rust PaddleOCR models)
//! - Text source adapters producing an ordered line transcript
//! - Line-item reconstruction from noisy purchase-order text
//! - CSV/JSON/text export of reconstructed line items

pub mod error;
pub mod export;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod reconstruct;
pub mod source;

pub use error::{PoError, Result};
pub use models::config::PoConfig;
pub use models::item::{LineItem, CSV_COLUMNS, UNKNOWN_SKU};
pub use models::line::{ExtractionMethod, RawLine, Transcript};
pub use pdf::{PdfExtractor, PdfProcessor};
pub use ocr::{OcrBackend, TextBox};
pub use pipeline::{Conversion, Converter};
pub use reconstruct::{Reconstructor, ReconstructConfig};
pub use source::{PageProgress, TextSource};
