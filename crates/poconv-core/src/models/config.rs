//! Configuration structures for the conversion pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::PoError;

/// Largest accepted lookahead window.
pub const MAX_LOOKAHEAD_WINDOW: usize = 12;

/// Main configuration for the poconv pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PoConfig {
    /// Text acquisition configuration.
    pub source: SourceConfig,

    /// OCR backend configuration.
    pub ocr: OcrConfig,

    /// Line-item reconstruction tunables.
    pub reconstruct: ReconstructConfig,
}

/// Which text acquisition strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Text layer first, OCR when the text layer is empty.
    Auto,
    /// Text layer only.
    Text,
    /// OCR only.
    Ocr,
}

/// Text acquisition configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Acquisition strategy.
    pub mode: SourceMode,

    /// DPI for rendering pages before OCR.
    pub render_dpi: u32,

    /// Convert page images to greyscale before OCR.
    pub greyscale: bool,

    /// Apply adaptive-threshold binarisation before OCR.
    pub binarize: bool,

    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,

    /// Minimum trimmed characters for a page's text layer to count as present.
    pub min_text_length: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::Auto,
            render_dpi: 300,
            greyscale: true,
            binarize: false,
            max_pages: 0,
            min_text_length: 1,
        }
    }
}

/// OCR backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackendKind {
    /// Tesseract command-line binary.
    Tesseract,
    /// PaddleOCR ONNX models via pure-onnx-ocr.
    Onnx,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Which backend to run.
    pub backend: OcrBackendKind,

    /// Path to the tesseract binary.
    pub tesseract_path: String,

    /// Tesseract language code.
    pub language: String,

    /// Tesseract page segmentation mode (6 = single uniform block).
    pub page_segmentation_mode: u8,

    /// Directory containing det.onnx, latin_rec.onnx and latin_dict.txt.
    pub model_dir: PathBuf,

    /// Vertical tolerance for merging boxes into one line, as a fraction of
    /// the median box height.
    pub row_tolerance: f32,

    /// Keep `[UNK]` tokens emitted by the recognizer.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackendKind::Tesseract,
            tesseract_path: "tesseract".to_string(),
            language: "eng".to_string(),
            page_segmentation_mode: 6,
            model_dir: PathBuf::from("models"),
            row_tolerance: 0.5,
            keep_unk: false,
        }
    }
}

/// How strictly a line must look like a table row to be an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorStrictness {
    /// Line starts with a digit.
    Lenient,
    /// Line starts with a short line number followed by a SKU-shaped token.
    Strict,
}

/// When to apply the OCR confusion table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMode {
    /// Only for OCR-derived transcripts.
    Auto,
    /// Always.
    Always,
    /// Never.
    Never,
}

/// Line-item reconstruction tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructConfig {
    /// Lines after an anchor scanned for description and EAN.
    pub lookahead_window: usize,

    /// Anchor row-shape check.
    pub strictness: AnchorStrictness,

    /// OCR confusion correction.
    pub ocr_normalization: NormalizationMode,

    /// Treat a digit-only first token as the line number only up to this
    /// many digits. `None` accepts any length.
    pub line_number_max_digits: Option<usize>,

    /// Only accept EAN candidates on lines carrying an "EAN" label.
    pub require_ean_label: bool,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            lookahead_window: 5,
            strictness: AnchorStrictness::Lenient,
            ocr_normalization: NormalizationMode::Auto,
            line_number_max_digits: None,
            require_ean_label: false,
        }
    }
}

impl ReconstructConfig {
    /// Check tunables are within their accepted ranges.
    pub fn validate(&self) -> Result<(), PoError> {
        if self.lookahead_window == 0 || self.lookahead_window > MAX_LOOKAHEAD_WINDOW {
            return Err(PoError::Config(format!(
                "reconstruct.lookahead_window must be between 1 and {}, got {}",
                MAX_LOOKAHEAD_WINDOW, self.lookahead_window
            )));
        }
        if self.line_number_max_digits == Some(0) {
            return Err(PoError::Config(
                "reconstruct.line_number_max_digits must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl PoConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Check every section for out-of-range values.
    pub fn validate(&self) -> Result<(), PoError> {
        if !(72..=1200).contains(&self.source.render_dpi) {
            return Err(PoError::Config(format!(
                "source.render_dpi must be between 72 and 1200, got {}",
                self.source.render_dpi
            )));
        }
        if !(0.0..=2.0).contains(&self.ocr.row_tolerance) {
            return Err(PoError::Config(format!(
                "ocr.row_tolerance must be between 0 and 2, got {}",
                self.ocr.row_tolerance
            )));
        }
        self.reconstruct.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PoConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.source.render_dpi, 300);
        assert_eq!(config.ocr.page_segmentation_mode, 6);
        assert_eq!(config.reconstruct.lookahead_window, 5);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: PoConfig =
            serde_json::from_str(r#"{"reconstruct": {"strictness": "strict"}}"#).unwrap();
        assert_eq!(config.reconstruct.strictness, AnchorStrictness::Strict);
        assert_eq!(config.reconstruct.lookahead_window, 5);
        assert_eq!(config.source.mode, SourceMode::Auto);
    }

    #[test]
    fn test_rejects_zero_window() {
        let mut config = PoConfig::default();
        config.reconstruct.lookahead_window = 0;
        assert!(matches!(config.validate(), Err(PoError::Config(_))));
    }

    #[test]
    fn test_rejects_low_dpi() {
        let mut config = PoConfig::default();
        config.source.render_dpi = 10;
        assert!(config.validate().is_err());
    }
}
