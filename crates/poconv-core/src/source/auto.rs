//! Text layer first, OCR for the pages the text layer leaves blank.

use tracing::{info, warn};

use super::{OcrSource, PageProgress, TextLayerSource, TextSource, finish, page_limit};
use crate::error::{PdfError, PoError, Result};
use crate::models::config::{OcrConfig, PoConfig, SourceConfig};
use crate::models::line::{ExtractionMethod, Transcript};
use crate::pdf::{PdfExtractor, PdfProcessor};

/// Falls back to OCR page by page.
///
/// Pages with a usable text layer keep it; blank pages are rendered and
/// recognised, and their text is spliced back in page order. The OCR backend
/// is only constructed when some page needs it, so text PDFs convert without
/// an OCR engine installed.
pub struct AutoSource {
    text: TextLayerSource,
    source_config: SourceConfig,
    ocr_config: OcrConfig,
    ocr: Option<OcrSource>,
}

impl AutoSource {
    pub fn new(source_config: SourceConfig, ocr_config: OcrConfig) -> Self {
        Self {
            text: TextLayerSource::new(source_config.clone()),
            source_config,
            ocr_config,
            ocr: None,
        }
    }

    /// Use `ocr` for the fallback instead of building the configured backend.
    pub fn with_ocr_source(mut self, ocr: OcrSource) -> Self {
        self.ocr = Some(ocr);
        self
    }

    fn build_ocr_source(&self) -> Result<OcrSource> {
        super::ocr_from_config(&PoConfig {
            source: self.source_config.clone(),
            ocr: self.ocr_config.clone(),
            ..PoConfig::default()
        })
    }
}

impl TextSource for AutoSource {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::TextLayer
    }

    fn produce_with_progress(
        &self,
        document: &[u8],
        progress: &mut dyn FnMut(PageProgress),
    ) -> Result<Transcript> {
        let pdf = PdfExtractor::from_bytes(document)?;
        let total = page_limit(pdf.page_count(), self.source_config.max_pages);

        let (mut pages, extraction_failure) = match self.text.page_texts(&pdf, progress) {
            Ok(pages) => (pages, None),
            Err(PoError::DocumentUnreadable(PdfError::TextExtraction(reason))) => {
                warn!("Text layer could not be read ({}), falling back to OCR", reason);
                (vec![String::new(); total as usize], Some(reason))
            }
            Err(e) => return Err(e),
        };

        let blank: Vec<u32> = pages
            .iter()
            .enumerate()
            .filter(|(_, text)| text.trim().is_empty())
            .map(|(i, _)| i as u32 + 1)
            .collect();
        if blank.is_empty() {
            return finish(ExtractionMethod::TextLayer, pages);
        }

        let built;
        let ocr = match &self.ocr {
            Some(ocr) => ocr,
            None => match self.build_ocr_source() {
                Ok(ocr) => {
                    built = ocr;
                    &built
                }
                Err(e) => {
                    warn!("OCR fallback unavailable: {}", e);
                    // Report what the text layer gave, which is what the caller can act on
                    return match extraction_failure {
                        Some(reason) => Err(PdfError::TextExtraction(reason).into()),
                        None => finish(ExtractionMethod::TextLayer, pages),
                    };
                }
            },
        };

        info!(
            "Text layer blank on {} of {} pages, running {} OCR on {:?}",
            blank.len(),
            pages.len(),
            ocr.backend_name(),
            blank
        );
        for &page in &blank {
            pages[(page - 1) as usize] = ocr.recognize_page(&pdf, page, total, progress)?;
        }

        if blank.len() == pages.len() {
            return finish(ExtractionMethod::Ocr, pages);
        }
        let mut transcript = finish(ExtractionMethod::TextLayer, pages)?;
        transcript.ocr_pages = blank
            .into_iter()
            .filter(|p| !transcript.empty_pages.contains(p))
            .collect();
        Ok(transcript)
    }
}
