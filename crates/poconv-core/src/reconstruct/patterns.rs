//! Regex patterns for purchase-order line matching.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Cost token: integer part (optionally comma-grouped), '.', exactly two digits
    pub static ref COST: Regex = Regex::new(
        r"\b(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2}\b"
    ).unwrap();

    // Whitespace-separated token
    pub static ref TOKEN: Regex = Regex::new(r"\S+").unwrap();

    // Quantity, optionally comma-grouped or with a unit marker glued on
    // (24, 1,000, 24EA, 12PCS)
    pub static ref QUANTITY_TOKEN: Regex = Regex::new(
        r"^(\d{1,3}(?:,\d{3})+|\d+)(?i:ea|each|pcs?|units?|x)?$"
    ).unwrap();

    // Short line number followed by a SKU-shaped token
    pub static ref STRICT_ROW: Regex = Regex::new(
        r"^\d{1,3}\s+[A-Za-z0-9][A-Za-z0-9-]*\s"
    ).unwrap();

    // EAN barcode: a run of 12-14 digits not embedded in a longer run
    pub static ref EAN: Regex = Regex::new(
        r"(?:^|\D)(\d{12,14})(?:\D|$)"
    ).unwrap();

    pub static ref EAN_LABEL: Regex = Regex::new(r"(?i)\bEAN").unwrap();

    // Continuation banners and page footers ("Page 2", "... - Page 2 of 3")
    pub static ref NON_CONTENT: Regex = Regex::new(
        r"(?i)(?:^(?:continuation|continued|page)\b|\bpage\s+\d+)"
    ).unwrap();

    // A line made only of column-header words
    pub static ref COLUMN_HEADER: Regex = Regex::new(
        r"(?i)^(?:(?:line|vendor|product|number|no\.?|description|ean|qty|quantity|unit|cost|price|sku|total|barcode)\b[\s:./]*)+$"
    ).unwrap();

    // Ruled separators between pages or sections
    pub static ref PAGE_BREAK: Regex = Regex::new(r"^[-=_*]{3,}$").unwrap();
}
