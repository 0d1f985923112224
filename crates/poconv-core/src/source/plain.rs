//! Pre-extracted plain text.

use super::{PageProgress, PageStage, TextSource};
use crate::error::{PoError, Result};
use crate::models::line::{ExtractionMethod, Transcript};

/// Treats the input bytes as already-extracted UTF-8 text.
///
/// Form feeds separate pages.
#[derive(Debug, Clone, Copy)]
pub struct PlainTextSource {
    method: ExtractionMethod,
}

impl PlainTextSource {
    /// Text that came from a text layer or was typed in.
    pub fn new() -> Self {
        Self {
            method: ExtractionMethod::Plain,
        }
    }

    /// Text saved from an earlier OCR run, so the confusion table applies.
    pub fn from_ocr_output() -> Self {
        Self {
            method: ExtractionMethod::Ocr,
        }
    }
}

impl Default for PlainTextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSource for PlainTextSource {
    fn method(&self) -> ExtractionMethod {
        self.method
    }

    fn produce_with_progress(
        &self,
        document: &[u8],
        progress: &mut dyn FnMut(PageProgress),
    ) -> Result<Transcript> {
        let text = String::from_utf8_lossy(document);
        let pages: Vec<&str> = text.split('\x0c').collect();
        let total = pages.len() as u32;
        for page in 1..=total {
            progress(PageProgress {
                page,
                total,
                stage: PageStage::Extracting,
            });
        }

        let transcript = if pages.len() > 1 {
            Transcript::from_pages(self.method, pages)
        } else {
            Transcript::from_text(self.method, &text)
        };
        if transcript.is_empty() {
            return Err(PoError::NoContentExtracted {
                method: self.method,
            });
        }
        Ok(transcript)
    }
}
