//! Raw extracted pages

use super::fragment::Fragment;
use serde::{Deserialize, Serialize};

/// Text lines of one page, in reading order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPage {
    /// 1-based page number
    pub page_number: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,

    /// Ordered text lines
    #[serde(default)]
    pub lines: Vec<String>,

    /// Line fragments with layout metadata, when extraction recorded them
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fragments: Vec<Fragment>,
}

impl RawPage {
    pub fn new(page_number: u32, lines: Vec<String>) -> Self {
        Self {
            page_number,
            width: None,
            height: None,
            lines,
            fragments: Vec::new(),
        }
    }

    /// Non-empty lines with surrounding whitespace removed
    pub fn text_lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty())
    }
}

/// Persisted `raw_pages.json` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPagesDocument {
    #[serde(default)]
    pub source_file: Option<String>,

    #[serde(default)]
    pub page_count: usize,

    pub pages: Vec<RawPage>,
}

impl RawPagesDocument {
    pub fn new(source_file: Option<String>, pages: Vec<RawPage>) -> Self {
        Self {
            source_file,
            page_count: pages.len(),
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_lines_skip_blanks() {
        let page = RawPage::new(
            1,
            vec!["  PROMOS ".into(), "".into(), "   ".into(), "Enviados".into()],
        );
        let lines: Vec<&str> = page.text_lines().collect();
        assert_eq!(lines, vec!["PROMOS", "Enviados"]);
    }

    #[test]
    fn test_document_counts_pages() {
        let document = RawPagesDocument::new(
            None,
            vec![RawPage::new(1, vec![]), RawPage::new(2, vec!["x".into()])],
        );
        assert_eq!(document.page_count, 2);
        assert_eq!(document.pages[1].lines.len(), 1);
    }
}
