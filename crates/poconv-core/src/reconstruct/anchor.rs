//! Anchor detection and field segmentation.
//!
//! An anchor is the line where an item's numeric columns are printed. The
//! two rightmost cost tokens are the unit and line cost; the nearest
//! numeric token to their left is the quantity; what precedes the quantity
//! holds the line number and SKU.

use std::ops::Range;

use tracing::trace;

use crate::models::config::{AnchorStrictness, ReconstructConfig};
use crate::models::item::UNKNOWN_SKU;

use super::patterns::{COST, QUANTITY_TOKEN, STRICT_ROW, TOKEN};

/// Fields recovered from an anchor line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorFields {
    pub line_number: String,
    pub sku: String,
    pub quantity: String,
    pub unit_cost: String,
    pub line_cost: String,
}

/// Byte spans of the cost tokens in a normalized line.
///
/// Tokens that are part of a dotted sequence such as a date (`12.05.2024`)
/// are skipped.
pub fn cost_spans(normalized: &str) -> Vec<Range<usize>> {
    let bytes = normalized.as_bytes();
    COST.find_iter(normalized)
        .filter(|m| {
            let preceded_by_dot = m.start() > 0 && bytes[m.start() - 1] == b'.';
            let continues_dotted = bytes.get(m.end()) == Some(&b'.')
                && bytes.get(m.end() + 1).is_some_and(|b| b.is_ascii_digit());
            !preceded_by_dot && !continues_dotted
        })
        .map(|m| m.range())
        .collect()
}

/// Whether a normalized line has the shape of an item row.
pub fn has_row_shape(normalized: &str, strictness: AnchorStrictness) -> bool {
    match strictness {
        AnchorStrictness::Lenient => normalized
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit()),
        AnchorStrictness::Strict => STRICT_ROW.is_match(normalized),
    }
}

/// Whether a normalized, trimmed line is an anchor candidate.
///
/// This is the shape test only; a candidate can still be rejected during
/// segmentation.
pub fn is_anchor_candidate(normalized: &str, strictness: AnchorStrictness) -> bool {
    has_row_shape(normalized, strictness) && cost_spans(normalized).len() >= 2
}

/// Segment an anchor line into fields.
///
/// `original` and `normalized` are the trimmed line before and after OCR
/// correction and must have equal byte length. Costs and quantity are read
/// from `normalized`; the line number and SKU keep their `original` text.
/// Returns `None` when the line is not a candidate or has no resolvable
/// quantity.
pub fn parse_anchor(
    original: &str,
    normalized: &str,
    config: &ReconstructConfig,
) -> Option<AnchorFields> {
    debug_assert_eq!(original.len(), normalized.len());

    if !has_row_shape(normalized, config.strictness) {
        return None;
    }

    let costs = cost_spans(normalized);
    if costs.len() < 2 {
        return None;
    }
    let unit_span = costs[costs.len() - 2].clone();
    let line_span = costs[costs.len() - 1].clone();

    // Tokens wholly to the left of the unit cost
    let tokens: Vec<Range<usize>> = TOKEN
        .find_iter(normalized)
        .map(|m| m.range())
        .filter(|r| r.end <= unit_span.start)
        .collect();

    let Some((qty_pos, quantity)) = tokens.iter().enumerate().rev().find_map(|(i, r)| {
        QUANTITY_TOKEN
            .captures(&normalized[r.clone()])
            .map(|caps| (i, caps[1].to_string()))
    }) else {
        trace!("No quantity before costs, rejecting: {}", original);
        return None;
    };

    let head = &tokens[..qty_pos];
    let (line_number, sku) = match head.first() {
        None => (String::new(), UNKNOWN_SKU.to_string()),
        Some(first) if is_line_number(&normalized[first.clone()], config.line_number_max_digits) => {
            let sku = head
                .get(1)
                .map(|r| original[r.clone()].to_string())
                .unwrap_or_else(|| UNKNOWN_SKU.to_string());
            (original[first.clone()].to_string(), sku)
        }
        Some(first) => (String::new(), original[first.clone()].to_string()),
    };

    Some(AnchorFields {
        line_number,
        sku,
        quantity,
        unit_cost: normalized[unit_span].to_string(),
        line_cost: normalized[line_span].to_string(),
    })
}

fn is_line_number(token: &str, max_digits: Option<usize>) -> bool {
    !token.is_empty()
        && token.chars().all(|c| c.is_ascii_digit())
        && max_digits.is_none_or(|max| token.len() <= max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconstruct::normalize::normalize_ocr;
    use pretty_assertions::assert_eq;

    fn parse(line: &str) -> Option<AnchorFields> {
        parse_anchor(line, line, &ReconstructConfig::default())
    }

    #[test]
    fn test_parse_full_row() {
        assert_eq!(
            parse("7 SKU-123 EA 1 24 18.44 442.56"),
            Some(AnchorFields {
                line_number: "7".to_string(),
                sku: "SKU-123".to_string(),
                quantity: "24".to_string(),
                unit_cost: "18.44".to_string(),
                line_cost: "442.56".to_string(),
            })
        );
    }

    #[test]
    fn test_rightmost_pair_wins() {
        let fields = parse("3 AB-1 2 9.99 1.50 3.00").unwrap();
        assert_eq!(fields.unit_cost, "1.50");
        assert_eq!(fields.line_cost, "3.00");
        assert_eq!(fields.quantity, "2");
    }

    #[test]
    fn test_single_cost_is_not_anchor() {
        assert!(!is_anchor_candidate("1 Total 442.56", AnchorStrictness::Lenient));
        assert!(parse("1 Total 442.56").is_none());
    }

    #[test]
    fn test_must_start_with_digit() {
        assert!(!is_anchor_candidate("Total 18.44 442.56", AnchorStrictness::Lenient));
    }

    #[test]
    fn test_no_quantity_rejects_candidate() {
        assert!(is_anchor_candidate("1 SUBTOTAL GBP 18.44 442.56", AnchorStrictness::Lenient));
        // The leading "1" is the only numeric token, so it becomes the quantity
        let fields = parse("1 SUBTOTAL GBP 18.44 442.56").unwrap();
        assert_eq!(fields.quantity, "1");
        assert_eq!(fields.sku, UNKNOWN_SKU);

        assert!(parse("1A SUBTOTAL 18.44 442.56").is_none());
    }

    #[test]
    fn test_unit_marker_stripped_from_quantity() {
        let fields = parse("12 ZX-9 24EA 2.00 48.00").unwrap();
        assert_eq!(fields.quantity, "24");
        assert_eq!(fields.sku, "ZX-9");
    }

    #[test]
    fn test_first_token_not_digit_is_sku() {
        let config = ReconstructConfig::default();
        let fields = parse_anchor("9X-100 4 1.00 4.00", "9X-100 4 1.00 4.00", &config).unwrap();
        assert_eq!(fields.line_number, "");
        assert_eq!(fields.sku, "9X-100");
    }

    #[test]
    fn test_missing_sku_uses_sentinel() {
        let fields = parse("5 3 1.00 3.00").unwrap();
        assert_eq!(fields.line_number, "5");
        assert_eq!(fields.sku, UNKNOWN_SKU);
        assert_eq!(fields.quantity, "3");
    }

    #[test]
    fn test_line_number_digit_limit() {
        let config = ReconstructConfig {
            line_number_max_digits: Some(3),
            ..ReconstructConfig::default()
        };
        let line = "50123 4 1.00 4.00";
        let fields = parse_anchor(line, line, &config).unwrap();
        assert_eq!(fields.line_number, "");
        assert_eq!(fields.sku, "50123");
    }

    #[test]
    fn test_ocr_normalized_costs_keep_original_sku() {
        let original = "7 SKO1-123 EA 1 24 l8.44 442.56";
        let normalized = normalize_ocr(original);
        let fields = parse_anchor(original, &normalized, &ReconstructConfig::default()).unwrap();
        assert_eq!(fields.unit_cost, "18.44");
        assert_eq!(fields.line_cost, "442.56");
        assert_eq!(fields.sku, "SKO1-123");
    }

    #[test]
    fn test_grouped_quantity() {
        assert_eq!(
            parse("3 AB-1 1,000 2.00 2,000.00"),
            Some(AnchorFields {
                line_number: "3".to_string(),
                sku: "AB-1".to_string(),
                quantity: "1,000".to_string(),
                unit_cost: "2.00".to_string(),
                line_cost: "2,000.00".to_string(),
            })
        );
    }

    #[test]
    fn test_line_number_keeps_original_text() {
        let original = "OOl2 4 1.00 4.00";
        let normalized = normalize_ocr(original);
        assert_eq!(normalized, "0012 4 1.00 4.00");
        let fields = parse_anchor(original, &normalized, &ReconstructConfig::default()).unwrap();
        assert_eq!(fields.line_number, "OOl2");
        assert_eq!(fields.sku, UNKNOWN_SKU);
        assert_eq!(fields.quantity, "4");
    }

    #[test]
    fn test_dates_are_not_costs() {
        assert!(cost_spans("12.05.2024 13.05.2024").is_empty());
        assert!(!is_anchor_candidate("12.05.2024 13.05.2024", AnchorStrictness::Lenient));
    }

    #[test]
    fn test_strict_requires_line_number_and_sku() {
        let config = ReconstructConfig {
            strictness: AnchorStrictness::Strict,
            ..ReconstructConfig::default()
        };
        assert!(parse_anchor("7 SKU-123 24 18.44 442.56", "7 SKU-123 24 18.44 442.56", &config).is_some());
        assert!(parse_anchor("2024 24 18.44 442.56", "2024 24 18.44 442.56", &config).is_none());
    }
}
