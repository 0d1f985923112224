//! WASM bindings for purchase-order line-item extraction.
//!
//! Browsers only get text-layer extraction. Scanned orders are handled by
//! running OCR in JavaScript and feeding the boxes or text back through
//! [`OcrResultJs`] or [`reconstruct_text`].

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use poconv_core::models::config::SourceMode;
use poconv_core::ocr::group_into_lines;
use poconv_core::{
    Conversion, Converter, ExtractionMethod, LineItem, PoConfig, TextBox, TextSource, Transcript,
    export,
};
use poconv_core::source::TextLayerSource;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<E: std::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn text_layer_converter() -> Result<Converter, JsValue> {
    let mut config = PoConfig::default();
    config.source.mode = SourceMode::Text;
    Converter::new(config).map_err(to_js)
}

fn items_to_js(conversion: &Conversion) -> Result<JsValue, JsValue> {
    if !conversion.dropped.is_empty() {
        web_sys::console::warn_1(&JsValue::from_str(&format!(
            "poconv: {} item rows skipped for lack of a quantity",
            conversion.dropped.len()
        )));
    }
    serde_wasm_bindgen::to_value(&conversion.items).map_err(to_js)
}

/// Extract line items from PDF bytes using the embedded text layer.
#[wasm_bindgen]
pub fn convert_pdf(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let conversion = text_layer_converter()?.convert(bytes).map_err(to_js)?;
    items_to_js(&conversion)
}

/// Extract line items from a `File` chosen in the browser.
#[wasm_bindgen]
pub async fn convert_file(file: web_sys::File) -> Result<JsValue, JsValue> {
    let buffer = JsFuture::from(file.array_buffer()).await?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    convert_pdf(&bytes)
}

/// Extract line items from already-extracted text.
///
/// Set `ocr` when the text came from OCR so digit confusions are corrected.
#[wasm_bindgen]
pub fn reconstruct_text(text: &str, ocr: bool) -> Result<JsValue, JsValue> {
    let method = if ocr {
        ExtractionMethod::Ocr
    } else {
        ExtractionMethod::Plain
    };
    let transcript = Transcript::from_text(method, text);
    let conversion = text_layer_converter()?
        .convert_transcript(transcript)
        .map_err(to_js)?;
    items_to_js(&conversion)
}

/// Render items (as returned by the conversion functions) as CSV.
#[wasm_bindgen]
pub fn items_to_csv(items: JsValue) -> Result<String, JsValue> {
    let items: Vec<LineItem> = serde_wasm_bindgen::from_value(items)?;
    export::to_csv_string(&items).map_err(to_js)
}

/// Text lines of a PDF's text layer, for inspection.
#[wasm_bindgen]
pub fn pdf_lines(bytes: &[u8]) -> Result<js_sys::Array, JsValue> {
    let converter = text_layer_converter()?;
    let transcript = TextLayerSource::new(converter.config().source.clone())
        .produce(bytes)
        .map_err(to_js)?;
    Ok(transcript
        .lines
        .iter()
        .map(|l| JsValue::from_str(l.text.trim()))
        .collect())
}

/// OCR boxes collected from browser-side recognition.
#[wasm_bindgen]
pub struct OcrResultJs {
    boxes: Vec<TextBox>,
    text: String,
    row_tolerance: f32,
}

#[wasm_bindgen]
impl OcrResultJs {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            boxes: Vec::new(),
            text: String::new(),
            row_tolerance: PoConfig::default().ocr.row_tolerance,
        }
    }

    /// Add a text box given its four corner points.
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn add_box(
        &mut self,
        text: &str,
        x1: f32, y1: f32,
        x2: f32, y2: f32,
        x3: f32, y3: f32,
        x4: f32, y4: f32,
        confidence: f32,
    ) {
        self.boxes.push(TextBox {
            bbox: [x1, y1, x2, y2, x3, y3, x4, y4],
            text: text.to_string(),
            score: confidence,
        });
    }

    /// Vertical merge tolerance as a fraction of the median box height.
    #[wasm_bindgen]
    pub fn set_row_tolerance(&mut self, tolerance: f32) {
        self.row_tolerance = tolerance;
    }

    /// Set the full text, bypassing box grouping.
    #[wasm_bindgen]
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    /// Boxes grouped into lines in reading order, or the text set directly.
    #[wasm_bindgen]
    pub fn get_text(&self) -> String {
        if self.text.is_empty() {
            group_into_lines(self.boxes.clone(), self.row_tolerance).join("\n")
        } else {
            self.text.clone()
        }
    }

    /// Extract line items from this OCR result.
    #[wasm_bindgen]
    pub fn extract_items(&self) -> Result<JsValue, JsValue> {
        reconstruct_text(&self.get_text(), true)
    }
}

impl Default for OcrResultJs {
    fn default() -> Self {
        Self::new()
    }
}
