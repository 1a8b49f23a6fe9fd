//! Section tree node and its persisted document form

use serde::{Deserialize, Serialize};

/// Depth tag of a section: 0 for main headings, 1+ for sub headings
pub type SectionLevel = u8;

/// A node in the hierarchical document tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Stable identifier assigned in creation order (`sec_001`, ...)
    pub id: String,

    /// Heading text, trimmed
    pub title: String,

    /// Classifier level (main = 0, sub = 1+)
    pub level: SectionLevel,

    /// Parent section id, `None` for roots
    #[serde(default)]
    pub parent_id: Option<String>,

    /// Page on which the heading appeared
    pub page_number: u32,

    /// Cached ids of direct children in encounter order.
    /// `parent_id` is authoritative; indexes rebuild this from parent links.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

impl Section {
    /// Level assigned to main headings
    pub const MAIN_LEVEL: SectionLevel = 0;

    /// Level assigned to first-order sub headings
    pub const SUB_LEVEL: SectionLevel = 1;

    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        level: SectionLevel,
        parent_id: Option<String>,
        page_number: u32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into().trim().to_string(),
            level,
            parent_id,
            page_number,
            children: Vec::new(),
        }
    }

    /// Whether this section starts a top-level branch
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Persisted `sections.json` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDocument {
    /// Source document the tree was built from
    #[serde(default)]
    pub source_file: Option<String>,

    /// Number of sections in the tree
    #[serde(default)]
    pub section_count: usize,

    /// Sections in creation order
    pub sections: Vec<Section>,
}

/// Accepted on-disk shapes: the envelope, or a bare list of sections
#[derive(Deserialize)]
#[serde(untagged)]
enum SectionsPayload {
    Document(SectionDocument),
    List(Vec<Section>),
}

impl SectionDocument {
    pub fn new(source_file: Option<String>, sections: Vec<Section>) -> Self {
        Self {
            source_file,
            section_count: sections.len(),
            sections,
        }
    }

    /// Decode either payload shape from a JSON string
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        let payload: SectionsPayload = serde_json::from_str(raw)?;
        Ok(match payload {
            SectionsPayload::Document(document) => document,
            SectionsPayload::List(sections) => Self::new(None, sections),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_is_trimmed() {
        let section = Section::new("sec_001", "  Enviados \n", Section::SUB_LEVEL, None, 2);
        assert_eq!(section.title, "Enviados");
        assert!(section.is_root());
    }

    #[test]
    fn test_children_cache_not_persisted_when_empty() {
        let section = Section::new("sec_001", "PROMOS", Section::MAIN_LEVEL, None, 1);
        let json = serde_json::to_value(&section).unwrap();
        assert!(json.get("children").is_none());
        assert!(json["parent_id"].is_null());
    }

    #[test]
    fn test_from_json_accepts_bare_list() {
        let raw = r#"[{"id": "sec_001", "title": "PROMOS", "level": 0, "parent_id": null, "page_number": 3}]"#;
        let document = SectionDocument::from_json_str(raw).unwrap();
        assert_eq!(document.section_count, 1);
        assert_eq!(document.sections[0].page_number, 3);
    }

    #[test]
    fn test_from_json_accepts_envelope() {
        let raw = r#"{"source_file": "a.pdf", "section_count": 1,
            "sections": [{"id": "sec_001", "title": "PROMOS", "level": 0, "page_number": 1}]}"#;
        let document = SectionDocument::from_json_str(raw).unwrap();
        assert_eq!(document.source_file.as_deref(), Some("a.pdf"));
        assert_eq!(document.sections[0].parent_id, None);
    }
}
