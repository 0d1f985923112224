//! Line-item reconstruction from a flat line transcript.
//!
//! Single pass over the lines: each line is normalized, tested as an anchor,
//! segmented into fields, and enriched with a description and EAN found in
//! a bounded window below it. The scan resumes on the line right after each
//! anchor, so every line is considered as an anchor exactly once.

pub mod anchor;
pub mod lookahead;
pub mod normalize;
pub mod patterns;

use tracing::{debug, info, trace};

use crate::models::config::NormalizationMode;
use crate::models::item::LineItem;
use crate::models::line::{RawLine, Transcript};

pub use crate::models::config::ReconstructConfig;
pub use anchor::{is_anchor_candidate, parse_anchor, AnchorFields};
pub use lookahead::LookaheadMatch;
pub use normalize::normalize_ocr;

/// A trimmed line alongside the form used for matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedLine {
    /// 1-based page the line came from, when known.
    pub page: Option<u32>,
    /// Trimmed text as extracted.
    pub original: String,
    /// Trimmed text after OCR correction (equal to `original` when off).
    pub normalized: String,
}

/// Items plus the bookkeeping needed to explain them.
#[derive(Debug, Clone, Default)]
pub struct Reconstruction {
    /// Items in anchor order.
    pub items: Vec<LineItem>,
    /// Indices of lines with the anchor shape.
    pub candidates: Vec<usize>,
    /// Candidates rejected for lack of a quantity.
    pub dropped: Vec<usize>,
}

/// Rebuilds purchase-order line items from text lines.
#[derive(Debug, Clone, Default)]
pub struct Reconstructor {
    config: ReconstructConfig,
}

impl Reconstructor {
    /// Create a reconstructor with the given tunables.
    pub fn new(config: ReconstructConfig) -> Self {
        Self { config }
    }

    /// Access the tunables.
    pub fn config(&self) -> &ReconstructConfig {
        &self.config
    }

    /// Whether OCR correction applies to `line` of `transcript`.
    pub fn normalizes(&self, transcript: &Transcript, line: &RawLine) -> bool {
        match self.config.ocr_normalization {
            NormalizationMode::Auto => transcript.is_ocr_line(line),
            NormalizationMode::Always => true,
            NormalizationMode::Never => false,
        }
    }

    /// Trim every line of a transcript, correcting those that need it.
    pub fn prepare_transcript(&self, transcript: &Transcript) -> Vec<PreparedLine> {
        transcript
            .lines
            .iter()
            .map(|l| prepare_line(l, self.normalizes(transcript, l)))
            .collect()
    }

    /// Reconstruct items from a transcript.
    pub fn reconstruct(&self, transcript: &Transcript) -> Vec<LineItem> {
        self.reconstruct_with_report(transcript).items
    }

    /// Reconstruct items and report candidate and dropped anchors.
    pub fn reconstruct_with_report(&self, transcript: &Transcript) -> Reconstruction {
        let prepared = self.prepare_transcript(transcript);
        let report = self.reconstruct_prepared(&transcript.lines, &prepared);
        info!(
            "Reconstructed {} items from {} lines ({} candidates, {} dropped)",
            report.items.len(),
            transcript.lines.len(),
            report.candidates.len(),
            report.dropped.len()
        );
        report
    }

    /// Reconstruct items from raw lines.
    pub fn reconstruct_lines(&self, lines: &[RawLine], normalize: bool) -> Reconstruction {
        self.reconstruct_prepared(lines, &prepare(lines, normalize))
    }

    fn reconstruct_prepared(&self, lines: &[RawLine], prepared: &[PreparedLine]) -> Reconstruction {
        let mut report = Reconstruction::default();

        for (i, line) in prepared.iter().enumerate() {
            if !is_anchor_candidate(&line.normalized, self.config.strictness) {
                continue;
            }
            let index = lines[i].index;
            report.candidates.push(index);

            let Some(fields) = parse_anchor(&line.original, &line.normalized, &self.config) else {
                debug!("Dropping anchor candidate at line {}: no quantity", index);
                report.dropped.push(index);
                continue;
            };

            let aux = lookahead::scan(prepared, i, &self.config);
            trace!(
                "Anchor at line {} scanned {:?}: description={:?} ean={:?}",
                index,
                aux.scanned,
                aux.description,
                aux.ean
            );

            report.items.push(LineItem {
                line_number: fields.line_number,
                sku: fields.sku,
                description: aux.description.unwrap_or_default(),
                ean: aux.ean.unwrap_or_default(),
                quantity: fields.quantity,
                unit_cost: fields.unit_cost,
                line_cost: fields.line_cost,
                anchor_index: index,
            });
        }

        report
    }

    /// Indices of lines with the anchor shape, for diagnostics.
    pub fn anchor_candidates(&self, transcript: &Transcript) -> Vec<usize> {
        self.prepare_transcript(transcript)
            .iter()
            .zip(&transcript.lines)
            .filter(|(p, _)| is_anchor_candidate(&p.normalized, self.config.strictness))
            .map(|(_, raw)| raw.index)
            .collect()
    }
}

/// Trim and optionally normalize every line.
pub fn prepare(lines: &[RawLine], normalize: bool) -> Vec<PreparedLine> {
    lines.iter().map(|l| prepare_line(l, normalize)).collect()
}

fn prepare_line(line: &RawLine, normalize: bool) -> PreparedLine {
    let original = line.text.trim().to_string();
    let normalized = if normalize {
        normalize_ocr(&original)
    } else {
        original.clone()
    };
    PreparedLine {
        page: line.page,
        original,
        normalized,
    }
}
