//! Subcommands and the input handling they share.

pub mod batch;
pub mod config;
pub mod convert;
pub mod lines;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use poconv_core::models::config::{AnchorStrictness, OcrBackendKind, SourceMode};
use poconv_core::source::{self, PlainTextSource, TextSource};
use poconv_core::{PoConfig, Transcript};

/// Extensions accepted as page images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Kind of input file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Image,
    Text,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(InputKind::Pdf),
            "txt" => Some(InputKind::Text),
            e if IMAGE_EXTENSIONS.contains(&e) => Some(InputKind::Image),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    /// Text layer, OCR when empty
    Auto,
    /// Text layer only
    Text,
    /// OCR only
    Ocr,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum BackendArg {
    /// Tesseract command-line binary
    Tesseract,
    /// PaddleOCR ONNX models
    Onnx,
}

/// Options that override the configuration file for one run.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Text acquisition mode
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Render DPI for OCR
    #[arg(long)]
    dpi: Option<u32>,

    /// OCR backend
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Directory with det.onnx, latin_rec.onnx and latin_dict.txt
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Lines scanned below each item for description and EAN
    #[arg(long)]
    lookahead: Option<usize>,

    /// Require a line number and SKU-shaped token at the start of item rows
    #[arg(long)]
    strict: bool,

    /// Treat .txt input as OCR output (apply character-confusion correction)
    #[arg(long)]
    ocr_text: bool,
}

impl SourceArgs {
    /// Apply overrides to a loaded configuration.
    pub fn apply(&self, config: &mut PoConfig) {
        if let Some(mode) = self.mode {
            config.source.mode = match mode {
                ModeArg::Auto => SourceMode::Auto,
                ModeArg::Text => SourceMode::Text,
                ModeArg::Ocr => SourceMode::Ocr,
            };
        }
        if let Some(dpi) = self.dpi {
            config.source.render_dpi = dpi;
        }
        if let Some(backend) = self.backend {
            config.ocr.backend = match backend {
                BackendArg::Tesseract => OcrBackendKind::Tesseract,
                BackendArg::Onnx => OcrBackendKind::Onnx,
            };
        }
        if let Some(dir) = &self.model_dir {
            config.ocr.model_dir = dir.clone();
        }
        if let Some(window) = self.lookahead {
            config.reconstruct.lookahead_window = window;
        }
        if self.strict {
            config.reconstruct.strictness = AnchorStrictness::Strict;
        }
    }
}

/// Load the configuration from `-c`, the default location, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PoConfig> {
    if let Some(path) = config_path {
        return Ok(PoConfig::from_file(Path::new(path))?);
    }
    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        Ok(PoConfig::from_file(&default_path)?)
    } else {
        Ok(PoConfig::default())
    }
}

/// Page progress bar drawn on stderr.
pub fn page_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} pages {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb
}

/// Read a document and produce its line transcript.
pub fn read_transcript(
    path: &Path,
    config: &PoConfig,
    ocr_text: bool,
    pb: &ProgressBar,
) -> anyhow::Result<Transcript> {
    let Some(kind) = InputKind::from_path(path) else {
        anyhow::bail!(
            "Unsupported file format: {} (expected pdf, txt or {})",
            path.display(),
            IMAGE_EXTENSIONS.join(", ")
        );
    };

    let data = fs::read(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    info!("Reading {} as {:?}", path.display(), kind);

    let transcript = match kind {
        InputKind::Pdf => {
            let source = source::from_config(config)?;
            source.produce_with_progress(&data, &mut |p| {
                pb.set_length(u64::from(p.total));
                pb.set_position(u64::from(p.page));
                pb.set_message(p.stage.to_string());
            })?
        }
        InputKind::Image => {
            pb.set_length(1);
            pb.set_message("recognizing");
            let image = image::load_from_memory(&data)?;
            let transcript = source::ocr_from_config(config)?.produce_image(&image)?;
            pb.set_position(1);
            transcript
        }
        InputKind::Text => {
            let source = if ocr_text {
                PlainTextSource::from_ocr_output()
            } else {
                PlainTextSource::new()
            };
            source.produce(&data)?
        }
    };

    debug!(
        "Transcript: {} lines over {} pages via {}",
        transcript.lines.len(),
        transcript.page_count,
        transcript.method
    );
    Ok(transcript)
}
