//! PDF processing module.

mod extractor;
#[cfg(feature = "pdfium")]
mod pdfium;

pub use extractor::PdfExtractor;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
///
/// Page numbers are 1-based throughout.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract the text layer of every page, in page order.
    fn extract_page_texts(&self) -> Result<Vec<String>>;

    /// Width of the page's media box in PDF points, if declared.
    fn page_width_points(&self, page: u32) -> Option<f32>;

    /// Rasterise a page at the specified DPI.
    ///
    /// With the `pdfium` feature and a loadable PDFium library the page is
    /// rendered; otherwise its largest embedded raster is resampled.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage>;

    /// Extract embedded images from a page.
    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>>;
}
