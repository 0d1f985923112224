//! Tesseract command-line backend.
//!
//! The page image is written to a temporary PNG and recognised with
//! `tesseract <img> stdout -l <lang> --psm <mode>`. Mode 6 treats the page
//! as one uniform block, which keeps table rows on single lines.

use std::process::Command;

use image::DynamicImage;
use tracing::{debug, info};

use super::OcrBackend;
use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// OCR backend that shells out to the Tesseract binary.
pub struct TesseractBackend {
    config: OcrConfig,
}

impl TesseractBackend {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Whether the configured binary can be executed.
    pub fn is_available(&self) -> bool {
        Command::new(&self.config.tesseract_path)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Fail with `Unavailable` when the binary cannot be executed.
    pub fn ensure_available(&self) -> Result<(), OcrError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(OcrError::Unavailable(format!(
                "tesseract not found at '{}'; install it or set ocr.tesseract_path",
                self.config.tesseract_path
            )))
        }
    }

    fn args(&self) -> Vec<String> {
        vec![
            "stdout".to_string(),
            "-l".to_string(),
            self.config.language.clone(),
            "--psm".to_string(),
            self.config.page_segmentation_mode.to_string(),
        ]
    }
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let temp_dir = tempfile::tempdir()
            .map_err(|e| OcrError::Preprocessing(format!("failed to create temp dir: {}", e)))?;
        let image_path = temp_dir.path().join("page.png");
        image
            .save(&image_path)
            .map_err(|e| OcrError::Preprocessing(format!("failed to write page image: {}", e)))?;

        debug!(
            "Running {} on {}x{} image",
            self.config.tesseract_path,
            image.width(),
            image.height()
        );

        let output = Command::new(&self.config.tesseract_path)
            .arg(&image_path)
            .args(self.args())
            .output()
            .map_err(|e| {
                OcrError::Unavailable(format!(
                    "failed to run tesseract (path='{}'): {}",
                    self.config.tesseract_path, e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Recognition(format!(
                "tesseract exited with code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).replace('\x0c', "");
        info!("Tesseract recognised {} lines", text.lines().count());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_use_configured_mode() {
        let backend = TesseractBackend::new(OcrConfig {
            language: "deu".to_string(),
            page_segmentation_mode: 4,
            ..OcrConfig::default()
        });
        assert_eq!(backend.args(), vec!["stdout", "-l", "deu", "--psm", "4"]);
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let backend = TesseractBackend::new(OcrConfig {
            tesseract_path: "/nonexistent/tesseract-binary".to_string(),
            ..OcrConfig::default()
        });
        assert!(!backend.is_available());
        assert!(matches!(
            backend.ensure_available(),
            Err(OcrError::Unavailable(_))
        ));
    }
}
