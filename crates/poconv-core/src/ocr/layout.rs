//! Reading-order reconstruction for detected text boxes.
//!
//! Detectors emit one box per word or phrase. Boxes whose vertical centres
//! fall within a tolerance of a row's running centre are merged into one
//! line, left to right. Rows are emitted top to bottom.

use tracing::trace;

use super::TextBox;

/// Group boxes into text lines.
///
/// `row_tolerance` is a fraction of the median box height.
pub fn group_into_lines(mut boxes: Vec<TextBox>, row_tolerance: f32) -> Vec<String> {
    boxes.retain(|b| !b.text.trim().is_empty());
    if boxes.is_empty() {
        return Vec::new();
    }

    let tolerance = median_height(&boxes).max(1.0) * row_tolerance;
    boxes.sort_by(|a, b| a.center().1.total_cmp(&b.center().1));

    let mut rows: Vec<Row> = Vec::new();
    for b in boxes {
        let cy = b.center().1;
        match rows.last_mut() {
            Some(row) if (cy - row.center_y()).abs() <= tolerance => row.push(b),
            _ => rows.push(Row::new(b)),
        }
    }

    trace!("Grouped boxes into {} rows (tolerance {:.1}px)", rows.len(), tolerance);

    rows.into_iter().map(Row::into_line).collect()
}

fn median_height(boxes: &[TextBox]) -> f32 {
    let mut heights: Vec<f32> = boxes.iter().map(TextBox::height).collect();
    heights.sort_by(f32::total_cmp);
    heights[heights.len() / 2]
}

struct Row {
    boxes: Vec<TextBox>,
    sum_y: f32,
}

impl Row {
    fn new(first: TextBox) -> Self {
        let sum_y = first.center().1;
        Self {
            boxes: vec![first],
            sum_y,
        }
    }

    fn center_y(&self) -> f32 {
        self.sum_y / self.boxes.len() as f32
    }

    fn push(&mut self, b: TextBox) {
        self.sum_y += b.center().1;
        self.boxes.push(b);
    }

    fn into_line(mut self) -> String {
        self.boxes.sort_by(|a, b| a.rect().0.total_cmp(&b.rect().0));
        self.boxes
            .iter()
            .map(|b| b.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
