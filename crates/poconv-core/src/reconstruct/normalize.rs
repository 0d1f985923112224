//! OCR character-confusion correction.
//!
//! The corrected string is only ever used for matching. Every substitution
//! maps one ASCII character to another, so byte offsets in the corrected
//! string are valid in the original.

/// Letters OCR commonly reads in place of digits.
pub const OCR_CONFUSIONS: &[(char, char)] = &[('O', '0'), ('o', '0'), ('l', '1')];

/// Apply the confusion table to a line.
pub fn normalize_ocr(line: &str) -> String {
    line.chars()
        .map(|c| {
            OCR_CONFUSIONS
                .iter()
                .find(|(from, _)| *from == c)
                .map(|(_, to)| *to)
                .unwrap_or(c)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitutions() {
        assert_eq!(normalize_ocr("l8.44"), "18.44");
        assert_eq!(normalize_ocr("44O.5o"), "440.50");
        assert_eq!(normalize_ocr("SKU-123"), "SKU-123");
    }

    #[test]
    fn test_preserves_byte_length() {
        let line = "7 SKO1-123 EA l 24 l8.44 442.56 £";
        assert_eq!(normalize_ocr(line).len(), line.len());
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_ocr("lOo1");
        assert_eq!(normalize_ocr(&once), once);
    }
}
