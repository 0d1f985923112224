//! PDF text and image extraction using lopdf and pdf-extract.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageBuffer, Rgba};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// Points per inch in PDF user space.
const POINTS_PER_INCH: f32 = 72.0;

/// PDF content extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
        }
    }

    /// Create an extractor and load `data` into it.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut extractor = Self::new();
        extractor.load(data)?;
        Ok(extractor)
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or(PdfError::Parse("No document loaded".to_string()))
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        let doc = self.document()?;
        doc.get_pages()
            .get(&page)
            .copied()
            .ok_or(PdfError::InvalidPage(page))
    }

    #[cfg(feature = "pdfium")]
    fn render_with_pdfium(&self, page: u32, dpi: u32) -> Option<DynamicImage> {
        match super::pdfium::render_page(&self.raw_data, page, dpi) {
            Ok(image) => Some(image),
            Err(e) => {
                debug!("{}; falling back to the embedded raster", e);
                None
            }
        }
    }

    #[cfg(not(feature = "pdfium"))]
    fn render_with_pdfium(&self, _page: u32, _dpi: u32) -> Option<DynamicImage> {
        None
    }

    fn try_extract_image_from_object(&self, doc: &Document, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
        let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;

        trace!("Found image object: {}x{}", width, height);

        if let Ok(filter) = dict.get(b"Filter") {
            let filter_name = match filter {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.last().and_then(|o| o.as_name().ok()),
                _ => None,
            };

            match filter_name {
                Some(b"DCTDecode") => {
                    // JPEG bytes are stored as-is
                    return image::load_from_memory_with_format(
                        &stream.content,
                        image::ImageFormat::Jpeg,
                    )
                    .ok();
                }
                Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                    trace!(
                        "Unsupported image filter: {}",
                        String::from_utf8_lossy(filter_name.unwrap_or_default())
                    );
                    return None;
                }
                _ => {}
            }
        }

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8) as u8;

        image_from_raw(&data, width, height, color_space, bits)
    }

    /// Look up a page attribute, following the page tree for inherited values.
    fn inherited_attribute<'a>(
        &self,
        doc: &'a Document,
        node_id: ObjectId,
        key: &[u8],
    ) -> Option<&'a Object> {
        let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
            return None;
        };
        if let Ok(value) = dict.get(key) {
            return doc.dereference(value).ok().map(|(_, obj)| obj);
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.inherited_attribute(doc, *parent_id, key),
            _ => None,
        }
    }

    fn page_resources<'a>(&self, doc: &'a Document, page_id: ObjectId) -> Option<&'a Dictionary> {
        match self.inherited_attribute(doc, page_id, b"Resources") {
            Some(Object::Dictionary(dict)) => Some(dict),
            _ => None,
        }
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf_extract needs the decrypted bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_page_texts(&self) -> Result<Vec<String>> {
        self.document()?;
        let pages = pdf_extract::extract_text_from_mem_by_pages(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;
        debug!("Extracted text layer from {} pages", pages.len());
        Ok(pages)
    }

    fn page_width_points(&self, page: u32) -> Option<f32> {
        let doc = self.document.as_ref()?;
        let page_id = self.page_id(page).ok()?;
        let Object::Array(media_box) = self.inherited_attribute(doc, page_id, b"MediaBox")? else {
            return None;
        };
        let coords: Vec<f32> = media_box.iter().filter_map(number).collect();
        match coords.as_slice() {
            [x0, _, x1, _] => Some((x1 - x0).abs()).filter(|w| *w > 0.0),
            _ => None,
        }
    }

    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage> {
        if let Some(image) = self.render_with_pdfium(page, dpi) {
            return Ok(image);
        }

        let images = self.extract_images(page)?;

        // The largest embedded raster is taken as the page scan
        let Some(scan) = images
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
        else {
            return Err(PdfError::Render {
                page,
                reason: "page has no embedded raster image".to_string(),
            });
        };

        let Some(width_pts) = self.page_width_points(page) else {
            debug!("Page {} has no media box, using native image resolution", page);
            return Ok(scan);
        };

        Ok(scale_to_dpi(scan, width_pts, dpi))
    }

    fn extract_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let doc = self.document()?;
        let page_id = self.page_id(page)?;

        let mut images = Vec::new();

        if let Some(resources) = self.page_resources(doc, page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = doc.dereference(obj_ref) {
                            if let Some(img) = self.try_extract_image_from_object(doc, obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        debug!("Extracted {} images from page {}", images.len(), page);
        Ok(images)
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Resample a page scan so that the page width maps to `dpi`.
fn scale_to_dpi(scan: DynamicImage, width_pts: f32, dpi: u32) -> DynamicImage {
    let (width, height) = scan.dimensions();
    let target_width = (width_pts / POINTS_PER_INCH * dpi as f32).round().max(1.0) as u32;
    if target_width == width {
        return scan;
    }
    let target_height = ((height as f32) * target_width as f32 / width as f32)
        .round()
        .max(1.0) as u32;
    debug!(
        "Resampling page scan {}x{} -> {}x{} for {} dpi",
        width, height, target_width, target_height, dpi
    );
    scan.resize_exact(target_width, target_height, FilterType::Lanczos3)
}

fn image_from_raw(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: u8,
) -> Option<DynamicImage> {
    trace!(
        "Creating image from raw data: {}x{}, colorspace={:?}, bits={}",
        width,
        height,
        String::from_utf8_lossy(color_space),
        bits_per_component
    );

    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixels = (width as usize) * (height as usize);
    let rgba: Vec<u8> = match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => data[..pixels * 3]
            .chunks_exact(3)
            .flat_map(|c| [c[0], c[1], c[2], 255])
            .collect(),
        b"DeviceGray" | b"G" if data.len() >= pixels => data[..pixels]
            .iter()
            .flat_map(|&g| [g, g, g, 255])
            .collect(),
        _ => {
            trace!("Could not decode image: data_len={}, pixels={}", data.len(), pixels);
            return None;
        }
    };

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    /// One page with a raw greyscale image XObject and the given media box width.
    fn make_scanned_pdf(media_width: i64, pixels: &[u8], width: i64, height: i64) -> Vec<u8> {
        let mut doc = Document::with_version("1.4");

        let img_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            pixels.to_vec(),
        ));
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            b"q 72 0 0 36 0 0 cm /Im1 Do Q".to_vec(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im1" => img_id },
            },
        });
        // MediaBox lives on the page tree node and is inherited
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), media_width.into(), 36.into()],
        });
        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
            dict.set("Parent", pages_id);
        }
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let err = PdfExtractor::from_bytes(b"not a pdf").err().unwrap();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_extract_raw_gray_image() {
        let pdf = make_scanned_pdf(72, &[0, 64, 128, 255, 255, 128, 64, 0], 4, 2);
        let extractor = PdfExtractor::from_bytes(&pdf).unwrap();

        let images = extractor.extract_images(1).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].dimensions(), (4, 2));
        assert_eq!(images[0].to_rgba8().get_pixel(3, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_inherited_media_box() {
        let pdf = make_scanned_pdf(144, &[0; 8], 4, 2);
        let extractor = PdfExtractor::from_bytes(&pdf).unwrap();
        assert_eq!(extractor.page_width_points(1), Some(144.0));
        assert_eq!(extractor.page_width_points(2), None);
    }

    #[test]
    fn test_render_page_resamples_to_dpi() {
        // One inch wide page at 144 dpi becomes 144 pixels wide
        let pdf = make_scanned_pdf(72, &[0; 8], 4, 2);
        let extractor = PdfExtractor::from_bytes(&pdf).unwrap();
        let rendered = extractor.render_page(1, 144).unwrap();
        assert_eq!(rendered.dimensions(), (144, 72));
    }

    #[cfg(not(feature = "pdfium"))]
    #[test]
    fn test_page_without_raster_cannot_render() {
        let mut doc = Document::with_version("1.4");
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"0 0 m 10 10 l S".to_vec()));
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 72.into(), 72.into()],
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        let mut pdf = Vec::new();
        doc.save_to(&mut pdf).unwrap();

        let extractor = PdfExtractor::from_bytes(&pdf).unwrap();
        assert!(matches!(
            extractor.render_page(1, 300),
            Err(PdfError::Render { page: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_page() {
        let pdf = make_scanned_pdf(72, &[0; 8], 4, 2);
        let extractor = PdfExtractor::from_bytes(&pdf).unwrap();
        assert!(matches!(
            extractor.extract_images(3),
            Err(PdfError::InvalidPage(3))
        ));
    }
}
