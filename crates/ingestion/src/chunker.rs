//! Section chunking module
//!
//! Splits each page's lines into paragraph and table chunks owned by the
//! section whose heading precedes them. Chunks over the configured size are
//! split further with text-splitter.

use crate::errors::IngestionError;
use reportforge_common::config::ChunkingConfig;
use reportforge_common::metrics::record_chunking;
use reportforge_common::models::{Chunk, ChunkKind, RawPage, Section};
use reportforge_common::text::match_key;
use reportforge_common::{sequence_id, CHUNK_ID_PREFIX};
use reportforge_search::SectionIndex;
use std::collections::HashMap;
use text_splitter::{Characters, ChunkConfig, TextSplitter};
use tracing::{debug, instrument};

/// Whether a page line is the printed heading of a section
pub fn line_matches_title(line: &str, title: &str) -> bool {
    let line = match_key(line);
    let title = match_key(title);
    if line.is_empty() || title.is_empty() {
        return false;
    }
    if line.contains(&title) {
        return true;
    }

    let mut tokens = title.split_whitespace().filter(|t| t.chars().count() > 2).peekable();
    tokens.peek().is_some() && tokens.all(|t| line.contains(t))
}

/// Only digits, `%`, `.`, `,` and spaces, or mostly digits
fn is_numeric_like(text: &str) -> bool {
    if !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '%' | '.' | ',') || c.is_whitespace())
    {
        return true;
    }
    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
    digits >= 2 && letters <= 2.max(digits / 3)
}

/// Classify one line as table or paragraph content
pub fn line_kind(text: &str) -> ChunkKind {
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
    if is_numeric_like(text) || digits >= 6 || (text.contains('%') && digits >= 2) {
        ChunkKind::Table
    } else {
        ChunkKind::Paragraph
    }
}

/// Accumulates lines of one kind for the current section
struct ChunkWriter<'a> {
    splitter: TextSplitter<Characters>,
    max_chars: usize,
    paths: HashMap<&'a str, Vec<String>>,
    chunks: Vec<Chunk>,
}

impl<'a> ChunkWriter<'a> {
    fn flush(&mut self, section_id: &'a str, page_number: u32, kind: ChunkKind, lines: &mut Vec<String>) {
        if lines.is_empty() {
            return;
        }

        let text = lines.join("\n");
        let pieces: Vec<String> = if text.chars().count() > self.max_chars {
            self.splitter.chunks(&text).map(str::to_string).collect()
        } else {
            vec![text]
        };

        for piece in pieces {
            let line_count = piece.lines().count();
            self.chunks.push(Chunk {
                id: sequence_id(CHUNK_ID_PREFIX, self.chunks.len() + 1),
                section_id: Some(section_id.to_string()),
                section_path: self.paths.get(section_id).cloned().unwrap_or_default(),
                page_number: Some(page_number),
                kind,
                text: piece,
                line_count,
            });
        }
        lines.clear();
    }
}

/// Split pages into paragraph/table chunks within each section.
///
/// Lines before the first recognized heading are dropped.
#[instrument(skip_all, fields(pages = pages.len(), sections = sections.len()))]
pub fn chunk_sections(
    pages: &[RawPage],
    sections: &[Section],
    config: &ChunkingConfig,
) -> Result<Vec<Chunk>, IngestionError> {
    if config.max_chunk_chars == 0 {
        return Err(IngestionError::ChunkingError(
            "max_chunk_chars must be greater than zero".to_string(),
        ));
    }

    let index = SectionIndex::build(sections)?;
    let mut paths = HashMap::with_capacity(sections.len());
    let mut by_page: HashMap<u32, Vec<&Section>> = HashMap::new();
    for section in sections {
        let mut path: Vec<String> = index
            .parent_chain(&section.id)?
            .iter()
            .map(|s| s.title.clone())
            .collect();
        path.push(section.title.clone());
        paths.insert(section.id.as_str(), path);
        by_page.entry(section.page_number).or_default().push(section);
    }

    let mut writer = ChunkWriter {
        splitter: TextSplitter::new(ChunkConfig::new(config.max_chunk_chars)),
        max_chars: config.max_chunk_chars,
        paths,
        chunks: Vec::new(),
    };
    let mut current: Option<&str> = None;

    for page in pages {
        let on_page = by_page.get(&page.page_number).map(Vec::as_slice).unwrap_or(&[]);
        let mut cursor = 0;
        let mut buffer: Vec<String> = Vec::new();
        let mut kind = ChunkKind::Paragraph;

        for line in page.text_lines() {
            if let Some(next) = on_page.get(cursor) {
                if line_matches_title(line, &next.title) {
                    if let Some(section_id) = current {
                        writer.flush(section_id, page.page_number, kind, &mut buffer);
                    }
                    buffer.clear();
                    kind = ChunkKind::Paragraph;
                    current = Some(next.id.as_str());
                    cursor += 1;
                    continue;
                }
            }

            let Some(section_id) = current else {
                continue;
            };

            let line_kind = line_kind(line);
            if line_kind != kind && !buffer.is_empty() {
                writer.flush(section_id, page.page_number, kind, &mut buffer);
            }
            kind = line_kind;
            buffer.push(line.to_string());
        }

        if let Some(section_id) = current {
            writer.flush(section_id, page.page_number, kind, &mut buffer);
        }
    }

    debug!(chunks = writer.chunks.len(), "Sections chunked");
    record_chunking(writer.chunks.len());
    Ok(writer.chunks)
}
