//! OCR backends producing line-ordered page text.

pub mod layout;
pub mod preprocessing;

#[cfg(feature = "native")]
mod pure_engine;
#[cfg(feature = "native")]
mod tesseract;

pub use layout::group_into_lines;
pub use preprocessing::ImagePreprocessor;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;
#[cfg(feature = "native")]
pub use tesseract::TesseractBackend;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;
#[cfg(feature = "native")]
use crate::models::config::{OcrBackendKind, OcrConfig};

/// A detected text box with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub score: f32,
}

impl TextBox {
    /// Get the center point of the bounding box.
    pub fn center(&self) -> (f32, f32) {
        let x = (self.bbox[0] + self.bbox[2] + self.bbox[4] + self.bbox[6]) / 4.0;
        let y = (self.bbox[1] + self.bbox[3] + self.bbox[5] + self.bbox[7]) / 4.0;
        (x, y)
    }

    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }

    /// Height of the axis-aligned bounding rectangle.
    pub fn height(&self) -> f32 {
        let (_, min_y, _, max_y) = self.rect();
        max_y - min_y
    }
}

/// A text recognition engine.
///
/// Implementations return the page text as newline-separated lines in
/// top-to-bottom order, each line read left to right.
pub trait OcrBackend {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Recognize the text of one page image.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

impl<T: OcrBackend + ?Sized> OcrBackend for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        (**self).recognize(image)
    }
}

/// Create the backend selected in the configuration.
#[cfg(feature = "native")]
pub fn create_backend(config: &OcrConfig) -> Result<Box<dyn OcrBackend>, OcrError> {
    match config.backend {
        OcrBackendKind::Tesseract => {
            let backend = TesseractBackend::new(config.clone());
            backend.ensure_available()?;
            Ok(Box::new(backend))
        }
        OcrBackendKind::Onnx => Ok(Box::new(PureOcrEngine::from_dir(
            &config.model_dir,
            config.clone(),
        )?)),
    }
}
