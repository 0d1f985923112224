//! Document conversion: text source, then reconstruction.

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::{PoError, Result};
use crate::models::config::PoConfig;
use crate::models::item::LineItem;
use crate::models::line::Transcript;
use crate::reconstruct::{Reconstruction, Reconstructor};
use crate::source::{self, OcrSource, PageProgress, PlainTextSource, TextSource};

/// Outcome of a successful conversion.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// Lines the items were reconstructed from.
    pub transcript: Transcript,
    /// Reconstructed items in document order.
    pub items: Vec<LineItem>,
    /// Anchor candidates rejected for lack of a quantity.
    pub dropped: Vec<usize>,
}

/// Converts purchase-order documents into line items.
pub struct Converter {
    config: PoConfig,
    reconstructor: Reconstructor,
}

impl Converter {
    /// Create a converter, validating the configuration.
    pub fn new(config: PoConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            reconstructor: Reconstructor::new(config.reconstruct.clone()),
            config,
        })
    }

    /// Access the configuration.
    pub fn config(&self) -> &PoConfig {
        &self.config
    }

    /// Access the reconstructor.
    pub fn reconstructor(&self) -> &Reconstructor {
        &self.reconstructor
    }

    /// Convert PDF bytes using the configured source mode.
    pub fn convert(&self, document: &[u8]) -> Result<Conversion> {
        self.convert_with_progress(document, &mut |_| {})
    }

    /// Convert PDF bytes, reporting page progress.
    pub fn convert_with_progress(
        &self,
        document: &[u8],
        progress: &mut dyn FnMut(PageProgress),
    ) -> Result<Conversion> {
        let source = source::from_config(&self.config)?;
        self.convert_with_source(source.as_ref(), document, progress)
    }

    /// Convert document bytes with an explicit source.
    pub fn convert_with_source(
        &self,
        source: &dyn TextSource,
        document: &[u8],
        progress: &mut dyn FnMut(PageProgress),
    ) -> Result<Conversion> {
        let transcript = source.produce_with_progress(document, progress)?;
        self.convert_transcript(transcript)
    }

    /// Convert pre-extracted text.
    pub fn convert_text(&self, text: &str) -> Result<Conversion> {
        let transcript = PlainTextSource::new().produce(text.as_bytes())?;
        self.convert_transcript(transcript)
    }

    /// Convert a single page image with the configured OCR backend.
    pub fn convert_image(&self, image: &DynamicImage) -> Result<Conversion> {
        let ocr: OcrSource = source::ocr_from_config(&self.config)?;
        let transcript = ocr.produce_image(image)?;
        self.convert_transcript(transcript)
    }

    /// Convert encoded image bytes (PNG, JPEG, TIFF, BMP).
    pub fn convert_image_bytes(&self, bytes: &[u8]) -> Result<Conversion> {
        let image = image::load_from_memory(bytes)?;
        self.convert_image(&image)
    }

    /// Reconstruct items from a transcript.
    ///
    /// Fails with `NoContentExtracted` for an empty transcript and with
    /// `NoItemsMatched` when no anchor survives.
    pub fn convert_transcript(&self, transcript: Transcript) -> Result<Conversion> {
        if transcript.is_empty() {
            return Err(PoError::NoContentExtracted {
                method: transcript.method,
            });
        }

        let Reconstruction {
            items,
            candidates,
            dropped,
        } = self.reconstructor.reconstruct_with_report(&transcript);

        if items.is_empty() {
            warn!(
                "No line items matched in {} lines ({} anchor candidates)",
                transcript.lines.len(),
                candidates.len()
            );
            return Err(PoError::NoItemsMatched { transcript });
        }

        let unknown = items.iter().filter(|i| i.has_unknown_sku()).count();
        if unknown > 0 {
            debug!("{} items have no vendor product number", unknown);
        }

        info!(
            "Converted {} items from {} ({} pages)",
            items.len(),
            transcript.method,
            transcript.page_count
        );

        Ok(Conversion {
            transcript,
            items,
            dropped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::line::ExtractionMethod;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_convert_text() {
        let converter = Converter::new(PoConfig::default()).unwrap();
        let conversion = converter
            .convert_text("7 SKU-123 EA 1 24 18.44 442.56\nBlue Widget\nEAN NO: 5012345678901\nTotal 442.56")
            .unwrap();
        assert_eq!(conversion.items.len(), 1);
        assert_eq!(
            conversion.items[0].to_record(),
            ["7", "SKU-123", "Blue Widget", "5012345678901", "24", "18.44", "442.56"]
        );
        assert_eq!(conversion.transcript.lines.len(), 4);
    }

    #[test]
    fn test_text_without_items_keeps_transcript() {
        let converter = Converter::new(PoConfig::default()).unwrap();
        match converter.convert_text("PURCHASE ORDER\nTotal 442.56") {
            Err(PoError::NoItemsMatched { transcript }) => {
                assert_eq!(transcript.raw_text(), "PURCHASE ORDER\nTotal 442.56");
            }
            other => panic!("expected NoItemsMatched, got {:?}", other.map(|c| c.items)),
        }
    }

    #[test]
    fn test_empty_transcript_is_no_content() {
        let converter = Converter::new(PoConfig::default()).unwrap();
        let empty = Transcript::from_pages(ExtractionMethod::Ocr, ["", ""]);
        assert!(matches!(
            converter.convert_transcript(empty),
            Err(PoError::NoContentExtracted {
                method: ExtractionMethod::Ocr
            })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = PoConfig::default();
        config.reconstruct.lookahead_window = 0;
        assert!(matches!(Converter::new(config), Err(PoError::Config(_))));
    }

    #[test]
    fn test_unreadable_document() {
        let converter = Converter::new(PoConfig::default()).unwrap();
        assert!(matches!(
            converter.convert(b"definitely not a pdf"),
            Err(PoError::DocumentUnreadable(_))
        ));
    }

    #[test]
    fn test_bad_image_bytes() {
        let converter = Converter::new(PoConfig::default()).unwrap();
        assert!(matches!(
            converter.convert_image_bytes(b"nope"),
            Err(PoError::Image(_))
        ));
    }
}
