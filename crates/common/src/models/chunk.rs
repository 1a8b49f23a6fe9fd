//! Content chunks attached to sections

use serde::{Deserialize, Serialize};

/// Kind of content a chunk holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Paragraph,
    Table,
    /// Kinds produced by other chunkers
    #[serde(other)]
    Other,
}

/// A paragraph or table unit belonging to at most one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier (`chunk_001`, ...)
    pub id: String,

    /// Owning section, if any
    #[serde(default)]
    pub section_id: Option<String>,

    /// Titles from the root section down to the owning section
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub section_path: Vec<String>,

    /// Page the chunk was read from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,

    pub kind: ChunkKind,

    pub text: String,

    /// Number of source lines in `text`
    #[serde(default)]
    pub line_count: usize,
}

impl Chunk {
    /// Whether this chunk belongs to the given section
    pub fn belongs_to(&self, section_id: &str) -> bool {
        self.section_id.as_deref() == Some(section_id)
    }
}

/// Persisted `chunks.json` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkDocument {
    #[serde(default)]
    pub source_file: Option<String>,

    #[serde(default)]
    pub chunk_count: usize,

    pub chunks: Vec<Chunk>,
}

impl ChunkDocument {
    pub fn new(source_file: Option<String>, chunks: Vec<Chunk>) -> Self {
        Self {
            source_file,
            chunk_count: chunks.len(),
            chunks,
        }
    }
}
