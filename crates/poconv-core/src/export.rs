//! Export of reconstructed line items.
//!
//! Values are written verbatim as matched; nothing is reformatted.

use std::io::Write;

use crate::error::Result;
use crate::models::item::{CSV_COLUMNS, LineItem, total_line_cost};

/// Write items as CSV with the fixed header row.
pub fn write_csv<W: Write>(items: &[LineItem], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_COLUMNS)?;
    for item in items {
        wtr.write_record(item.to_record())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Items as a CSV string.
pub fn to_csv_string(items: &[LineItem]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(items, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Items as a pretty-printed JSON array.
pub fn to_json(items: &[LineItem]) -> Result<String> {
    Ok(serde_json::to_string_pretty(items)?)
}

/// Items as an aligned text table followed by a count and cost total.
pub fn to_text_table(items: &[LineItem]) -> String {
    let rows: Vec<[&str; 7]> = items.iter().map(LineItem::to_record).collect();

    let mut widths = CSV_COLUMNS.map(|c| c.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    push_row(&mut output, &CSV_COLUMNS, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut output, &rule, &widths);
    for row in &rows {
        push_row(&mut output, row, &widths);
    }

    output.push('\n');
    output.push_str(&format!("Items: {}\n", items.len()));
    output.push_str(&format!("Total line cost: {}\n", total_line_cost(items)));
    output
}

fn push_row<S: AsRef<str>>(output: &mut String, cells: &[S], widths: &[usize; 7]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell.as_ref(), width = w))
        .collect();
    output.push_str(line.join("  ").trim_end());
    output.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item() -> LineItem {
        LineItem {
            line_number: "7".to_string(),
            sku: "SKU-123".to_string(),
            description: "Blue Widget, large".to_string(),
            ean: "5012345678901".to_string(),
            quantity: "24".to_string(),
            unit_cost: "18.44".to_string(),
            line_cost: "1,442.56".to_string(),
            anchor_index: 0,
        }
    }

    #[test]
    fn test_csv_header_and_quoting() {
        let csv = to_csv_string(&[item()]).unwrap();
        assert_eq!(
            csv,
            "Line,Vendor Product Number,Description,EAN No,Qty,Unit Cost,Line Cost\n\
             7,SKU-123,\"Blue Widget, large\",5012345678901,24,18.44,\"1,442.56\"\n"
        );
    }

    #[test]
    fn test_csv_empty_has_header_only() {
        let csv = to_csv_string(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_json_omits_anchor_index() {
        let json = to_json(&[item()]).unwrap();
        assert!(json.contains("\"sku\": \"SKU-123\""));
        assert!(!json.contains("anchor_index"));
    }

    #[test]
    fn test_text_table_totals() {
        let mut second = item();
        second.line_cost = "7.44".to_string();
        let table = to_text_table(&[item(), second]);
        assert!(table.starts_with("Line  Vendor Product Number"));
        assert!(table.contains("Items: 2\n"));
        assert!(table.ends_with("Total line cost: 1450.00\n"));
    }
}
