//! Page rasterisation through Google PDFium.
//!
//! The library is bound at runtime, so a build with the `pdfium` feature
//! still works on machines without it: callers fall back to the page's
//! embedded raster. `Pdfium` is `!Send`, so each call binds afresh; the OS
//! caches the library load.

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

use super::Result;
use crate::error::PdfError;

/// Upper bound on either side of a rendered page.
const MAX_DIMENSION_PX: u32 = 10_000;

const POINTS_PER_INCH: f32 = 72.0;

/// Bind PDFium from `PDFIUM_DYNAMIC_LIB_PATH`, the executable's directory,
/// or the system library path, in that order.
fn load_pdfium(page: u32) -> Result<Pdfium> {
    let unavailable = |reason: String| PdfError::Render { page, reason };

    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let bindings = Pdfium::bind_to_library(&path)
            .map_err(|e| unavailable(format!("failed to load PDFium from {}: {}", path, e)))?;
        return Ok(Pdfium::new(bindings));
    }

    if let Some(dir) = std::env::current_exe().ok().and_then(|exe| exe.parent().map(|d| d.to_path_buf())) {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(dir.to_string_lossy().as_ref());
        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            debug!("Loaded PDFium from {}", dir.display());
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library()
        .map_err(|e| unavailable(format!("PDFium library not found: {}", e)))?;
    Ok(Pdfium::new(bindings))
}

/// Pixel size of a page rendered at `dpi`, scaled down to fit
/// [`MAX_DIMENSION_PX`] with the aspect ratio kept.
fn render_dimensions(width_pts: f32, height_pts: f32, dpi: u32) -> (u32, u32) {
    let scale = dpi as f32 / POINTS_PER_INCH;
    let width = (width_pts * scale).max(1.0);
    let height = (height_pts * scale).max(1.0);

    let longest = width.max(height);
    let ratio = if longest > MAX_DIMENSION_PX as f32 {
        MAX_DIMENSION_PX as f32 / longest
    } else {
        1.0
    };
    (
        ((width * ratio).round() as u32).clamp(1, MAX_DIMENSION_PX),
        ((height * ratio).round() as u32).clamp(1, MAX_DIMENSION_PX),
    )
}

/// Render page `page` (1-based) of the PDF in `data` at `dpi`.
pub fn render_page(data: &[u8], page: u32, dpi: u32) -> Result<DynamicImage> {
    let pdfium = load_pdfium(page)?;
    let document = pdfium
        .load_pdf_from_byte_slice(data, None)
        .map_err(|e| PdfError::Render {
            page,
            reason: format!("PDFium could not open the document: {}", e),
        })?;

    let index = page
        .checked_sub(1)
        .and_then(|i| u16::try_from(i).ok())
        .ok_or(PdfError::InvalidPage(page))?;
    let pdf_page = document
        .pages()
        .get(index)
        .map_err(|_| PdfError::InvalidPage(page))?;

    let (width, height) = render_dimensions(pdf_page.width().value, pdf_page.height().value, dpi);
    let config = PdfRenderConfig::new()
        .set_target_width(width as i32)
        .set_maximum_height(height as i32);

    let bitmap = pdf_page
        .render_with_config(&config)
        .map_err(|e| PdfError::Render {
            page,
            reason: format!("PDFium rendering failed: {}", e),
        })?;

    debug!("Rendered page {} with PDFium at {}x{} ({} dpi)", page, width, height, dpi);
    Ok(bitmap.as_image())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_page_at_300_dpi() {
        assert_eq!(render_dimensions(612.0, 792.0, 300), (2550, 3300));
    }

    #[test]
    fn test_oversized_page_is_capped() {
        let (width, height) = render_dimensions(14_400.0, 7_200.0, 300);
        assert_eq!(width, MAX_DIMENSION_PX);
        assert_eq!(height, MAX_DIMENSION_PX / 2);
    }

    #[test]
    fn test_degenerate_page_is_one_pixel() {
        assert_eq!(render_dimensions(0.0, 0.0, 300), (1, 1));
    }
}
