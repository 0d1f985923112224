//! Image preprocessing for OCR.

use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use crate::models::config::SourceConfig;

/// Image preprocessor applied to page images before recognition.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    greyscale: bool,
    binarize: bool,
    /// Side of the square neighbourhood used for local means.
    block_size: u32,
    /// Offset subtracted from the local mean.
    offset: i32,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self {
            greyscale: true,
            binarize: false,
            block_size: 15,
            offset: 5,
        }
    }

    /// Create a preprocessor from source settings.
    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new()
            .with_greyscale(config.greyscale)
            .with_binarize(config.binarize)
    }

    /// Convert to greyscale.
    pub fn with_greyscale(mut self, enabled: bool) -> Self {
        self.greyscale = enabled;
        self
    }

    /// Apply adaptive-threshold binarisation (implies greyscale).
    pub fn with_binarize(mut self, enabled: bool) -> Self {
        self.binarize = enabled;
        self
    }

    /// Prepare a page image for recognition.
    pub fn prepare(&self, image: &DynamicImage) -> DynamicImage {
        if self.binarize {
            debug!("Binarising {}x{} page image", image.width(), image.height());
            let gray = image.to_luma8();
            DynamicImage::ImageLuma8(adaptive_threshold(&gray, self.block_size, self.offset))
        } else if self.greyscale {
            DynamicImage::ImageLuma8(image.to_luma8())
        } else {
            image.clone()
        }
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Mean-based adaptive threshold using a summed-area table.
fn adaptive_threshold(image: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);

    // integral[(y + 1) * (w + 1) + (x + 1)] = sum of pixels in [0..=x] x [0..=y]
    let stride = w + 1;
    let mut integral = vec![0u64; stride * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            row_sum += u64::from(image.get_pixel(x as u32, y as u32)[0]);
            integral[(y + 1) * stride + x + 1] = integral[y * stride + x + 1] + row_sum;
        }
    }

    let half = (block_size / 2) as usize;
    let mut result = GrayImage::new(width, height);

    for y in 0..h {
        let y0 = y.saturating_sub(half);
        let y1 = (y + half + 1).min(h);
        for x in 0..w {
            let x0 = x.saturating_sub(half);
            let x1 = (x + half + 1).min(w);

            let sum = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                - integral[y0 * stride + x1]
                - integral[y1 * stride + x0];
            let count = ((y1 - y0) * (x1 - x0)) as u64;

            let threshold = (sum / count) as i32 - offset;
            let pixel = i32::from(image.get_pixel(x as u32, y as u32)[0]);
            let output = if pixel > threshold { 255 } else { 0 };
            result.put_pixel(x as u32, y as u32, Luma([output]));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_greyscale_by_default() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([200, 10, 10])));
        let prepared = ImagePreprocessor::new().prepare(&img);
        assert!(matches!(prepared, DynamicImage::ImageLuma8(_)));
        assert_eq!(prepared.width(), 4);
    }

    #[test]
    fn test_passthrough_when_disabled() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let prepared = ImagePreprocessor::new().with_greyscale(false).prepare(&img);
        assert!(matches!(prepared, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_binarize_separates_ink_from_paper() {
        let mut gray = GrayImage::from_pixel(20, 20, Luma([230]));
        for y in 8..12 {
            for x in 2..18 {
                gray.put_pixel(x, y, Luma([20]));
            }
        }
        let out = adaptive_threshold(&gray, 15, 5);
        assert_eq!(out.get_pixel(10, 10)[0], 0);
        assert_eq!(out.get_pixel(10, 2)[0], 255);
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }
}
