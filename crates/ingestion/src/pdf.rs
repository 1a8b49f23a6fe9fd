//! PDF text extraction module
//!
//! Extracts positioned text from PDF files using lopdf. Each page's content
//! stream is decoded and replayed against a minimal text state:
//! - `Tf` sets the font size, `Tm` the text matrix
//! - `Td`, `TD`, `T*`, `'` and `"` move the line origin
//! - `Tj` and `TJ` emit text runs
//!
//! Runs are grouped into lines by their rounded top coordinate and ordered
//! top to bottom, then left to right.

use crate::errors::IngestionError;
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use reportforge_common::models::{BoundingBox, Fragment, RawPage, RawPagesDocument};
use reportforge_common::text::collapse_whitespace;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// US Letter height, used when a page has no readable MediaBox
const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// Rough glyph advance as a fraction of the font size
const GLYPH_WIDTH_RATIO: f32 = 0.5;

/// TJ adjustments below this (thousandths of an em) are read as a word gap
const TJ_SPACE_THRESHOLD: f32 = -200.0;

/// Extract every page of a PDF file
#[instrument(fields(path = %path.display()))]
pub fn extract_pages(path: &Path) -> Result<RawPagesDocument, IngestionError> {
    if !path.exists() {
        return Err(IngestionError::FileNotFound(path.display().to_string()));
    }

    let doc = Document::load(path).map_err(|e| IngestionError::PdfParseError {
        path: path.display().to_string(),
        message: format!("Failed to load PDF: {}", e),
    })?;

    let page_ids = doc.get_pages();
    debug!(page_count = page_ids.len(), "Extracting text from PDF");

    let mut pages = Vec::with_capacity(page_ids.len());
    for (page_number, page_id) in page_ids {
        match extract_page(&doc, page_number, page_id) {
            Ok(page) => pages.push(page),
            Err(e) => {
                warn!(page = page_number, error = %e, "Failed to extract page, emitting it empty");
                pages.push(RawPage::new(page_number, Vec::new()));
            }
        }
    }

    if pages.iter().all(|p| p.text_lines().next().is_none()) {
        return Err(IngestionError::PdfParseError {
            path: path.display().to_string(),
            message: "No text content extracted from PDF".to_string(),
        });
    }

    info!(
        pages = pages.len(),
        lines = pages.iter().map(|p| p.lines.len()).sum::<usize>(),
        "PDF extraction complete"
    );

    Ok(RawPagesDocument::new(Some(path.display().to_string()), pages))
}

/// Flatten pages into the page-ordered fragment sequence.
///
/// Pages without recorded fragments fall back to their bare lines.
pub fn fragments_from_pages(pages: &[RawPage]) -> Vec<Fragment> {
    let mut fragments = Vec::new();

    for page in pages {
        if page.fragments.is_empty() {
            fragments.extend(
                page.text_lines()
                    .map(|line| Fragment::new(collapse_whitespace(line), page.page_number)),
            );
            continue;
        }

        for fragment in &page.fragments {
            let text = collapse_whitespace(&fragment.text);
            if text.is_empty() {
                continue;
            }
            fragments.push(Fragment {
                text,
                ..fragment.clone()
            });
        }
    }

    fragments
}

fn extract_page(doc: &Document, page_number: u32, page_id: ObjectId) -> Result<RawPage, lopdf::Error> {
    let content = doc.get_page_content(page_id)?;
    let (width, height) = page_size(doc, page_id).unzip();
    page_from_content(page_number, &content, width, height)
}

/// MediaBox width and height, when present on the page itself
fn page_size(doc: &Document, page_id: ObjectId) -> Option<(f32, f32)> {
    let dict = doc.get_object(page_id).ok()?.as_dict().ok()?;
    let media_box = dict.get(b"MediaBox").ok()?.as_array().ok()?;
    let coords: Vec<f32> = media_box.iter().filter_map(|o| o.as_float().ok()).collect();
    match coords.as_slice() {
        [x0, y0, x1, y1] => Some(((x1 - x0).abs(), (y1 - y0).abs())),
        _ => None,
    }
}

/// One shown string at its page position
#[derive(Debug, Clone)]
struct TextRun {
    text: String,
    x: f32,
    y: f32,
    width: f32,
    size: f32,
}

/// Text state tracked while replaying a content stream
#[derive(Debug)]
struct TextState {
    font_size: f32,
    scale: f32,
    leading: f32,
    line_x: f32,
    line_y: f32,
    x: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_size: 0.0,
            scale: 1.0,
            leading: 0.0,
            line_x: 0.0,
            line_y: 0.0,
            x: 0.0,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_x += tx;
        self.line_y += ty;
        self.x = self.line_x;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn effective_size(&self) -> f32 {
        self.font_size * self.scale
    }

    fn show(&mut self, text: String, runs: &mut Vec<TextRun>) {
        let size = self.effective_size();
        let width = text.chars().count() as f32 * size * GLYPH_WIDTH_RATIO;
        if !text.trim().is_empty() {
            runs.push(TextRun {
                text,
                x: self.x,
                y: self.line_y,
                width,
                size,
            });
        }
        self.x += width;
    }
}

/// Replay a decoded content stream into a RawPage
fn page_from_content(
    page_number: u32,
    content: &[u8],
    width: Option<f32>,
    height: Option<f32>,
) -> Result<RawPage, lopdf::Error> {
    let content = Content::decode(content)?;
    let mut state = TextState::default();
    let mut runs = Vec::new();

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                state.line_x = 0.0;
                state.line_y = 0.0;
                state.x = 0.0;
                state.scale = 1.0;
            }
            "Tf" => {
                if let Some(size) = operands.get(1).and_then(number) {
                    state.font_size = size;
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    state.leading = leading;
                }
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (
                    operands.first().and_then(number),
                    operands.get(1).and_then(number),
                ) {
                    if op.operator == "TD" {
                        state.leading = -ty;
                    }
                    state.move_line(tx, ty);
                }
            }
            "Tm" => {
                let m: Vec<f32> = operands.iter().filter_map(number).collect();
                if let [_, _, _, d, e, f] = m.as_slice() {
                    state.scale = if d.abs() > 0.0 { d.abs() } else { 1.0 };
                    state.line_x = *e;
                    state.line_y = *f;
                    state.x = *e;
                }
            }
            "T*" => state.next_line(),
            "Tj" => {
                if let Some(text) = operands.first().and_then(string) {
                    state.show(text, &mut runs);
                }
            }
            "'" => {
                state.next_line();
                if let Some(text) = operands.first().and_then(string) {
                    state.show(text, &mut runs);
                }
            }
            "\"" => {
                state.next_line();
                if let Some(text) = operands.get(2).and_then(string) {
                    state.show(text, &mut runs);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let mut text = String::new();
                    for item in items {
                        match item {
                            Object::String(..) => text.push_str(&string(item).unwrap_or_default()),
                            other => {
                                if number(other).is_some_and(|n| n < TJ_SPACE_THRESHOLD) {
                                    text.push(' ');
                                }
                            }
                        }
                    }
                    state.show(text, &mut runs);
                }
            }
            _ => {}
        }
    }

    let page_height = height.unwrap_or(DEFAULT_PAGE_HEIGHT);
    let fragments = group_runs_into_lines(runs, page_height, page_number);
    let lines = fragments.iter().map(|f| f.text.clone()).collect();

    Ok(RawPage {
        page_number,
        width,
        height,
        lines,
        fragments,
    })
}

/// Group runs by rounded top, top to bottom; runs in a line are ordered by x
fn group_runs_into_lines(runs: Vec<TextRun>, page_height: f32, page_number: u32) -> Vec<Fragment> {
    let mut line_map: BTreeMap<i64, Vec<TextRun>> = BTreeMap::new();
    for run in runs {
        let top = page_height - run.y - run.size;
        line_map.entry(top.round() as i64).or_default().push(run);
    }

    let mut fragments = Vec::with_capacity(line_map.len());
    for (_, mut line_runs) in line_map {
        line_runs.sort_by(|a, b| a.x.total_cmp(&b.x));

        let mut text = String::new();
        let mut previous_end: Option<f32> = None;
        for run in &line_runs {
            if let Some(end) = previous_end {
                if run.x - end > run.size * 0.15 && !text.ends_with(' ') {
                    text.push(' ');
                }
            }
            text.push_str(&run.text);
            previous_end = Some(run.x + run.width);
        }

        let text = collapse_whitespace(&text);
        if text.is_empty() {
            continue;
        }

        let sizes: Vec<f32> = line_runs.iter().map(|r| r.size).filter(|s| *s > 0.0).collect();
        let avg_size = (!sizes.is_empty()).then(|| sizes.iter().sum::<f32>() / sizes.len() as f32);

        let x0 = line_runs.iter().map(|r| r.x).fold(f32::INFINITY, f32::min);
        let x1 = line_runs.iter().map(|r| r.x + r.width).fold(f32::NEG_INFINITY, f32::max);
        let top = line_runs
            .iter()
            .map(|r| page_height - r.y - r.size)
            .fold(f32::INFINITY, f32::min);
        let bottom = line_runs
            .iter()
            .map(|r| page_height - r.y)
            .fold(f32::NEG_INFINITY, f32::max);

        let mut fragment =
            Fragment::new(text, page_number).with_bbox(BoundingBox::new(x0, top, x1, bottom));
        fragment.font_size = avg_size;
        fragments.push(fragment);
    }

    fragments
}

fn number(object: &Object) -> Option<f32> {
    object.as_float().ok()
}

/// Decode a PDF string operand: UTF-16BE with BOM, otherwise Latin-1
fn string(object: &Object) -> Option<String> {
    let Object::String(bytes, _) = object else {
        return None;
    };

    if let [0xFE, 0xFF, rest @ ..] = bytes.as_slice() {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&units));
    }

    Some(bytes.iter().map(|&b| b as char).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &[u8] = b"BT
/F1 18 Tf
72 700 Td
(PROMOS) Tj
/F1 10 Tf
0 -30 Td
[(Campa) -50 (\\361a 1)] TJ
0 -14 Td
(Enviados) Tj
200 0 Td
(1,455,341) Tj
ET";

    #[test]
    fn test_page_lines_ordered_top_to_bottom() {
        let page = page_from_content(1, CONTENT, Some(612.0), Some(792.0)).unwrap();

        assert_eq!(page.lines, vec!["PROMOS", "Campaña 1", "Enviados 1,455,341"]);
        assert_eq!(page.fragments.len(), 3);
        assert_eq!(page.fragments[0].font_size, Some(18.0));
        assert_eq!(page.fragments[1].font_size, Some(10.0));
        assert!(page.fragments.iter().all(|f| f.has_valid_layout()));
        assert_eq!(page.width, Some(612.0));
    }

    #[test]
    fn test_tj_gap_inserts_space() {
        let content = b"BT /F1 12 Tf 10 500 Td [(M\\311TRICAS) -400 (GENERALES)] TJ ET";
        let page = page_from_content(2, content, None, None).unwrap();
        assert_eq!(page.lines, vec!["MÉTRICAS GENERALES"]);
    }

    #[test]
    fn test_text_matrix_scales_font_size() {
        let content = b"BT /F1 1 Tf 20 0 0 20 50 600 Tm (RESUMEN) Tj ET";
        let page = page_from_content(1, content, None, None).unwrap();
        assert_eq!(page.fragments[0].font_size, Some(20.0));
    }

    #[test]
    fn test_utf16_strings() {
        let object = Object::String(vec![0xFE, 0xFF, 0x00, 0x41, 0x00, 0xD1], lopdf::StringFormat::Hexadecimal);
        assert_eq!(string(&object).as_deref(), Some("AÑ"));
    }

    #[test]
    fn test_fragments_fall_back_to_lines() {
        let mut with_layout = RawPage::new(1, vec!["PROMOS".into()]);
        with_layout.fragments = vec![Fragment::new("  PROMOS  extra ", 1).with_font_size(18.0)];
        let bare = RawPage::new(2, vec!["Enviados".into(), "  ".into(), "1,455,341".into()]);

        let fragments = fragments_from_pages(&[with_layout, bare]);
        let texts: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["PROMOS extra", "Enviados", "1,455,341"]);
        assert_eq!(fragments[0].font_size, Some(18.0));
        assert_eq!(fragments[2].page_number, 2);
    }

    #[test]
    fn test_missing_file() {
        let err = extract_pages(Path::new("/nonexistent/report.pdf")).unwrap_err();
        assert!(matches!(err, IngestionError::FileNotFound(_)));
    }

    #[test]
    fn test_invalid_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();
        assert!(matches!(
            extract_pages(&path),
            Err(IngestionError::PdfParseError { .. })
        ));
    }
}
