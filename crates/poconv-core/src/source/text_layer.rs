//! Direct text-layer extraction.

use tracing::debug;

use super::{PageProgress, PageStage, TextSource, finish, page_limit};
use crate::error::Result;
use crate::models::config::SourceConfig;
use crate::models::line::{ExtractionMethod, Transcript};
use crate::pdf::{PdfExtractor, PdfProcessor};

/// Reads the embedded text of each page.
#[derive(Debug, Clone, Default)]
pub struct TextLayerSource {
    config: SourceConfig,
}

impl TextLayerSource {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    /// Text layer of each page up to `max_pages`, with pages shorter than
    /// `min_text_length` blanked.
    pub fn page_texts(
        &self,
        pdf: &PdfExtractor,
        progress: &mut dyn FnMut(PageProgress),
    ) -> Result<Vec<String>> {
        let total = page_limit(pdf.page_count(), self.config.max_pages);

        let mut pages = pdf.extract_page_texts()?;
        pages.truncate(total as usize);

        for (i, text) in pages.iter_mut().enumerate() {
            let page = i as u32 + 1;
            progress(PageProgress {
                page,
                total,
                stage: PageStage::Extracting,
            });
            let chars = text.trim().chars().count();
            if chars < self.config.min_text_length {
                debug!("Page {} text layer too short ({} chars), treating as empty", page, chars);
                text.clear();
            }
        }

        Ok(pages)
    }
}

impl TextSource for TextLayerSource {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::TextLayer
    }

    fn produce_with_progress(
        &self,
        document: &[u8],
        progress: &mut dyn FnMut(PageProgress),
    ) -> Result<Transcript> {
        let pdf = PdfExtractor::from_bytes(document)?;
        let pages = self.page_texts(&pdf, progress)?;
        finish(ExtractionMethod::TextLayer, pages)
    }
}
