//! Raw text lines produced by a text source.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How the text of a document was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Embedded PDF text layer.
    TextLayer,
    /// Optical character recognition of page images.
    Ocr,
    /// Text supplied directly by the caller.
    Plain,
}

impl ExtractionMethod {
    /// Whether text from this method exhibits OCR character confusions.
    pub fn is_ocr(&self) -> bool {
        matches!(self, ExtractionMethod::Ocr)
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMethod::TextLayer => write!(f, "text-layer extraction"),
            ExtractionMethod::Ocr => write!(f, "OCR"),
            ExtractionMethod::Plain => write!(f, "plain text"),
        }
    }
}

/// A single line of document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLine {
    /// 0-based position in the document-wide sequence.
    pub index: usize,
    /// 1-based page number, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Line text as extracted, untrimmed.
    pub text: String,
}

impl RawLine {
    pub fn new(index: usize, page: Option<u32>, text: impl Into<String>) -> Self {
        Self {
            index,
            page,
            text: text.into(),
        }
    }
}

/// Ordered line sequence for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// How the lines were obtained.
    pub method: ExtractionMethod,
    /// Number of pages visited.
    pub page_count: u32,
    /// Pages (1-based) that produced no text.
    pub empty_pages: Vec<u32>,
    /// Pages recognised by OCR in an otherwise text-layer transcript.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ocr_pages: Vec<u32>,
    /// Non-empty lines in page-ascending, top-to-bottom order.
    pub lines: Vec<RawLine>,
}

impl Transcript {
    /// Build a transcript from per-page text, dropping blank lines.
    ///
    /// Pages must already be in ascending order.
    pub fn from_pages<I, S>(method: ExtractionMethod, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lines = Vec::new();
        let mut empty_pages = Vec::new();
        let mut page_count = 0;

        for (i, page_text) in pages.into_iter().enumerate() {
            let page = i as u32 + 1;
            page_count = page;
            let before = lines.len();
            for line in page_text.as_ref().lines() {
                if line.trim().is_empty() {
                    continue;
                }
                lines.push(RawLine::new(lines.len(), Some(page), line));
            }
            if lines.len() == before {
                empty_pages.push(page);
            }
        }

        Self {
            method,
            page_count,
            empty_pages,
            ocr_pages: Vec::new(),
            lines,
        }
    }

    /// Build a single-page transcript from plain text.
    pub fn from_text(method: ExtractionMethod, text: &str) -> Self {
        let mut transcript = Self::from_pages(method, [text]);
        for line in &mut transcript.lines {
            line.page = None;
        }
        transcript
    }

    /// Whether no page produced any text.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Trimmed raw text joined with newlines.
    pub fn raw_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.trim())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether `line` came from OCR rather than a text layer.
    pub fn is_ocr_line(&self, line: &RawLine) -> bool {
        self.method.is_ocr() || line.page.is_some_and(|p| self.ocr_pages.contains(&p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pages_tags_pages_and_skips_blanks() {
        let transcript = Transcript::from_pages(
            ExtractionMethod::TextLayer,
            ["first\n\n  second  \n", "", "third"],
        );

        assert_eq!(transcript.page_count, 3);
        assert_eq!(transcript.empty_pages, vec![2]);
        assert_eq!(transcript.lines.len(), 3);
        assert_eq!(transcript.lines[1].index, 1);
        assert_eq!(transcript.lines[1].page, Some(1));
        assert_eq!(transcript.lines[2].page, Some(3));
        assert_eq!(transcript.lines[2].index, 2);
    }

    #[test]
    fn test_from_text_has_no_pages() {
        let transcript = Transcript::from_text(ExtractionMethod::Plain, "a\nb");
        assert!(transcript.lines.iter().all(|l| l.page.is_none()));
        assert_eq!(transcript.raw_text(), "a\nb");
    }

    #[test]
    fn test_ocr_lines() {
        let ocr = Transcript::from_text(ExtractionMethod::Ocr, "a");
        assert!(ocr.is_ocr_line(&ocr.lines[0]));

        let mut mixed = Transcript::from_pages(ExtractionMethod::TextLayer, ["a", "b"]);
        mixed.ocr_pages = vec![2];
        assert!(!mixed.is_ocr_line(&mixed.lines[0]));
        assert!(mixed.is_ocr_line(&mixed.lines[1]));
    }
}
