//! Purchase-order line item records.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// SKU value used when no product number could be located.
pub const UNKNOWN_SKU: &str = "UNKNOWN";

/// Export column order.
pub const CSV_COLUMNS: [&str; 7] = [
    "Line",
    "Vendor Product Number",
    "Description",
    "EAN No",
    "Qty",
    "Unit Cost",
    "Line Cost",
];

/// A reconstructed purchase-order line.
///
/// All values are passed through as matched; numeric fields are not parsed
/// for export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Vendor's own line ordinal; empty when absent.
    pub line_number: String,

    /// Vendor product number, or the unknown sentinel.
    pub sku: String,

    /// Free-text product description; empty when not found.
    pub description: String,

    /// 12-14 digit barcode; empty when not found.
    pub ean: String,

    /// Units ordered.
    pub quantity: String,

    /// Price per unit.
    pub unit_cost: String,

    /// Extended price.
    pub line_cost: String,

    /// Index of the anchor line this item was built from.
    #[serde(skip)]
    pub anchor_index: usize,
}

impl LineItem {
    /// Field values in export column order.
    pub fn to_record(&self) -> [&str; 7] {
        [
            self.line_number.as_str(),
            self.sku.as_str(),
            self.description.as_str(),
            self.ean.as_str(),
            self.quantity.as_str(),
            self.unit_cost.as_str(),
            self.line_cost.as_str(),
        ]
    }

    /// Whether the SKU is the unknown sentinel.
    pub fn has_unknown_sku(&self) -> bool {
        self.sku == UNKNOWN_SKU
    }

    /// Line cost as a decimal, ignoring thousands separators.
    pub fn line_cost_value(&self) -> Option<Decimal> {
        parse_cost(&self.line_cost)
    }
}

/// Parse a matched cost token such as `1,234.56`.
pub fn parse_cost(s: &str) -> Option<Decimal> {
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&cleaned).ok()
}

/// Sum of all parseable line costs.
pub fn total_line_cost(items: &[LineItem]) -> Decimal {
    items.iter().filter_map(|i| i.line_cost_value()).sum()
}
