//! Bounded lookahead for description and EAN lines.

use std::ops::Range;

use crate::models::config::ReconstructConfig;

use super::anchor::is_anchor_candidate;
use super::patterns::{COLUMN_HEADER, EAN, EAN_LABEL, NON_CONTENT, PAGE_BREAK};
use super::PreparedLine;

/// Auxiliary fields found below an anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookaheadMatch {
    pub description: Option<String>,
    pub ean: Option<String>,
    /// Line indices that were examined.
    pub scanned: Range<usize>,
}

/// Scan the window after `anchor` for a description and an EAN.
///
/// The scan stops before the first line that itself looks like an anchor.
/// Lines from a later page than the anchor start in a page header: until a
/// repeated column-header line closes it, the header yields no description
/// and only labeled EANs.
pub fn scan(lines: &[PreparedLine], anchor: usize, config: &ReconstructConfig) -> LookaheadMatch {
    let start = anchor + 1;
    let limit = (start + config.lookahead_window).min(lines.len());
    let mut found = LookaheadMatch {
        scanned: start..start,
        ..LookaheadMatch::default()
    };
    let mut page = lines.get(anchor).and_then(|l| l.page);
    let mut in_page_header = false;

    for (offset, line) in lines[start.min(limit)..limit].iter().enumerate() {
        if is_anchor_candidate(&line.normalized, config.strictness) {
            break;
        }
        found.scanned = start..start + offset + 1;

        if line.page != page {
            page = line.page;
            in_page_header = true;
        }
        if in_page_header && COLUMN_HEADER.is_match(&line.original) {
            in_page_header = false;
            continue;
        }

        let labeled = EAN_LABEL.is_match(&line.original);
        let barcode = EAN.captures(&line.normalized).map(|caps| caps[1].to_string());
        let has_barcode = barcode.is_some();
        let accept_barcode = labeled || (!config.require_ean_label && !in_page_header);

        if let Some(code) = barcode.filter(|_| accept_barcode) {
            if found.ean.is_none() {
                found.ean = Some(code);
            }
        } else if found.description.is_none()
            && !in_page_header
            && !labeled
            && !has_barcode
            && is_description(&line.original)
        {
            found.description = Some(line.original.clone());
        }

        if found.ean.is_some() && found.description.is_some() {
            break;
        }
    }

    found
}

fn is_description(original: &str) -> bool {
    !original.is_empty()
        && !PAGE_BREAK.is_match(original)
        && !NON_CONTENT.is_match(original)
        && !COLUMN_HEADER.is_match(original)
}
