//! Text source adapters.
//!
//! Every adapter turns document bytes into the same [`Transcript`] shape:
//! non-empty lines in page-ascending, top-to-bottom order.

mod auto;
mod ocr;
mod plain;
mod text_layer;

pub use auto::AutoSource;
pub use ocr::OcrSource;
pub use plain::PlainTextSource;
pub use text_layer::TextLayerSource;

use std::fmt;

use crate::error::{PoError, Result};
use crate::models::config::{PoConfig, SourceMode};
use crate::models::line::{ExtractionMethod, Transcript};

/// What a source is doing with a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStage {
    /// Reading the embedded text layer.
    Extracting,
    /// Rasterising the page.
    Rendering,
    /// Running OCR on the page image.
    Recognizing,
}

impl fmt::Display for PageStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageStage::Extracting => write!(f, "extracting"),
            PageStage::Rendering => write!(f, "rendering"),
            PageStage::Recognizing => write!(f, "recognizing"),
        }
    }
}

/// Advisory progress event: page `page` of `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    pub page: u32,
    pub total: u32,
    pub stage: PageStage,
}

/// Produces an ordered line transcript from document bytes.
pub trait TextSource {
    /// The acquisition method this source uses first.
    fn method(&self) -> ExtractionMethod;

    /// Produce the transcript, reporting page progress.
    fn produce_with_progress(
        &self,
        document: &[u8],
        progress: &mut dyn FnMut(PageProgress),
    ) -> Result<Transcript>;

    /// Produce the transcript.
    fn produce(&self, document: &[u8]) -> Result<Transcript> {
        self.produce_with_progress(document, &mut |_| {})
    }
}

/// Build the source selected by `config.source.mode`.
pub fn from_config(config: &PoConfig) -> Result<Box<dyn TextSource>> {
    match config.source.mode {
        SourceMode::Text => Ok(Box::new(TextLayerSource::new(config.source.clone()))),
        SourceMode::Auto => Ok(Box::new(AutoSource::new(
            config.source.clone(),
            config.ocr.clone(),
        ))),
        SourceMode::Ocr => ocr_from_config(config).map(|s| Box::new(s) as Box<dyn TextSource>),
    }
}

/// Build an OCR source with the configured backend.
#[cfg(feature = "native")]
pub fn ocr_from_config(config: &PoConfig) -> Result<OcrSource> {
    let backend = crate::ocr::create_backend(&config.ocr)?;
    Ok(OcrSource::new(backend, config.source.clone()))
}

/// Build an OCR source with the configured backend.
#[cfg(not(feature = "native"))]
pub fn ocr_from_config(_config: &PoConfig) -> Result<OcrSource> {
    Err(PoError::Config(
        "OCR backends are not available in this build".to_string(),
    ))
}

/// Limit a page count by `max_pages` (0 = unlimited).
fn page_limit(page_count: u32, max_pages: usize) -> u32 {
    if max_pages == 0 {
        page_count
    } else {
        page_count.min(max_pages as u32)
    }
}

/// Turn per-page text into a transcript, failing when nothing was found.
fn finish(method: ExtractionMethod, pages: Vec<String>) -> Result<Transcript> {
    let transcript = Transcript::from_pages(method, pages);
    if !transcript.empty_pages.is_empty() {
        tracing::warn!(
            "{} of {} pages produced no text: {:?}",
            transcript.empty_pages.len(),
            transcript.page_count,
            transcript.empty_pages
        );
    }
    if transcript.is_empty() {
        return Err(PoError::NoContentExtracted { method });
    }
    Ok(transcript)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_limit() {
        assert_eq!(page_limit(5, 0), 5);
        assert_eq!(page_limit(5, 2), 2);
        assert_eq!(page_limit(1, 3), 1);
    }

    #[test]
    fn test_finish_empty_is_no_content() {
        let err = finish(ExtractionMethod::Ocr, vec![String::new(), " \n".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            PoError::NoContentExtracted {
                method: ExtractionMethod::Ocr
            }
        ));
    }

    #[test]
    fn test_text_mode_builds_text_layer_source() {
        let mut config = PoConfig::default();
        config.source.mode = SourceMode::Text;
        let source = from_config(&config).unwrap();
        assert_eq!(source.method(), ExtractionMethod::TextLayer);
    }
}
