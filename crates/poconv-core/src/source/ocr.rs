//! OCR of rendered page images.

use image::DynamicImage;
use tracing::{debug, info, warn};

use super::{PageProgress, PageStage, TextSource, finish, page_limit};
use crate::error::{OcrError, PoError, Result};
use crate::models::config::SourceConfig;
use crate::models::line::{ExtractionMethod, Transcript};
use crate::ocr::{ImagePreprocessor, OcrBackend};
use crate::pdf::{PdfExtractor, PdfProcessor};

/// Renders each page and runs it through an OCR backend.
pub struct OcrSource {
    backend: Box<dyn OcrBackend>,
    preprocessor: ImagePreprocessor,
    config: SourceConfig,
}

impl OcrSource {
    pub fn new(backend: Box<dyn OcrBackend>, config: SourceConfig) -> Self {
        Self {
            backend,
            preprocessor: ImagePreprocessor::from_config(&config),
            config,
        }
    }

    /// Recognise a standalone image as a one-page document.
    pub fn produce_image(&self, image: &DynamicImage) -> Result<Transcript> {
        let text = self.recognize(image)?;
        finish(ExtractionMethod::Ocr, vec![text])
    }

    /// Render and recognise one page of `pdf`.
    ///
    /// A page that fails to render or recognise comes back blank; only an
    /// unavailable backend is an error.
    pub fn recognize_page(
        &self,
        pdf: &PdfExtractor,
        page: u32,
        total: u32,
        progress: &mut dyn FnMut(PageProgress),
    ) -> Result<String> {
        progress(PageProgress {
            page,
            total,
            stage: PageStage::Rendering,
        });
        let image = match pdf.render_page(page, self.config.render_dpi) {
            Ok(image) => image,
            Err(e) => {
                warn!("Skipping page {}: {}", page, e);
                return Ok(String::new());
            }
        };

        progress(PageProgress {
            page,
            total,
            stage: PageStage::Recognizing,
        });
        match self.recognize(&image) {
            Ok(text) => {
                debug!("Page {}: {} OCR lines", page, text.lines().count());
                Ok(text)
            }
            Err(e @ OcrError::Unavailable(_)) => Err(PoError::Ocr(e)),
            Err(e) => {
                warn!("OCR failed on page {}: {}", page, e);
                Ok(String::new())
            }
        }
    }

    /// Name of the backend in use.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn recognize(&self, image: &DynamicImage) -> std::result::Result<String, OcrError> {
        let prepared = self.preprocessor.prepare(image);
        self.backend.recognize(&prepared)
    }
}

impl TextSource for OcrSource {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::Ocr
    }

    fn produce_with_progress(
        &self,
        document: &[u8],
        progress: &mut dyn FnMut(PageProgress),
    ) -> Result<Transcript> {
        let pdf = PdfExtractor::from_bytes(document)?;
        let total = page_limit(pdf.page_count(), self.config.max_pages);
        info!(
            "Running {} OCR on {} pages at {} dpi",
            self.backend_name(),
            total,
            self.config.render_dpi
        );

        let mut pages = Vec::with_capacity(total as usize);
        for page in 1..=total {
            pages.push(self.recognize_page(&pdf, page, total, progress)?);
        }

        finish(ExtractionMethod::Ocr, pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CannedOcr {
        text: &'static str,
        calls: Cell<u32>,
    }

    impl OcrBackend for CannedOcr {
        fn name(&self) -> &'static str {
            "canned"
        }

        fn recognize(&self, image: &DynamicImage) -> std::result::Result<String, OcrError> {
            self.calls.set(self.calls.get() + 1);
            assert!(matches!(image, DynamicImage::ImageLuma8(_)));
            Ok(self.text.to_string())
        }
    }

    #[test]
    fn test_image_is_preprocessed_and_recognized() {
        let source = OcrSource::new(
            Box::new(CannedOcr {
                text: "7 SK01-123 24 l8.44 442.56\n\nBlue Widget",
                calls: Cell::new(0),
            }),
            SourceConfig::default(),
        );
        let image = DynamicImage::new_rgb8(8, 8);
        let transcript = source.produce_image(&image).unwrap();
        assert_eq!(transcript.method, ExtractionMethod::Ocr);
        assert_eq!(transcript.lines.len(), 2);
        assert_eq!(transcript.lines[1].text, "Blue Widget");
    }

    #[test]
    fn test_blank_recognition_is_no_content() {
        let source = OcrSource::new(
            Box::new(CannedOcr {
                text: "   ",
                calls: Cell::new(0),
            }),
            SourceConfig::default(),
        );
        let err = source.produce_image(&DynamicImage::new_rgb8(4, 4)).unwrap_err();
        assert!(matches!(
            err,
            PoError::NoContentExtracted {
                method: ExtractionMethod::Ocr
            }
        ));
    }

    #[test]
    fn test_garbage_bytes_are_unreadable() {
        let source = OcrSource::new(
            Box::new(CannedOcr {
                text: "",
                calls: Cell::new(0),
            }),
            SourceConfig::default(),
        );
        assert!(matches!(
            source.produce(b"%PDF-garbage"),
            Err(PoError::DocumentUnreadable(_))
        ));
    }
}
