//! Relation queries over a section tree
//!
//! Two read-only modes:
//! - title search: every section whose normalized title contains (or equals)
//!   the query, with its parent chain and optionally its children
//! - id lookup: one section with grouped relations in the fixed order
//!   parent, child, sibling, descendant
//!
//! Both modes can attach the first raw lines of the match's page and the
//! chunks assigned to the match.

use crate::index::SectionIndex;
use reportforge_common::config::QueryConfig;
use reportforge_common::errors::Result;
use reportforge_common::metrics::{record_query, StageTimer};
use reportforge_common::models::{Chunk, RawPage, Section};
use reportforge_common::text::search_key;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Per-request toggles and caps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Full-title equality instead of substring matching
    pub exact: bool,
    pub include_children: bool,
    pub include_siblings: bool,
    pub include_descendants: bool,
    pub include_chunks: bool,
    pub include_data: bool,
    pub max_chunks: usize,
    pub max_raw_lines: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from(&QueryConfig::default())
    }
}

impl From<&QueryConfig> for QueryOptions {
    fn from(config: &QueryConfig) -> Self {
        Self {
            exact: config.exact,
            include_children: config.include_children,
            include_siblings: config.include_siblings,
            include_descendants: config.include_descendants,
            include_chunks: config.include_chunks,
            include_data: config.include_data,
            max_chunks: config.max_chunks,
            max_raw_lines: config.max_raw_lines,
        }
    }
}

/// Optional collections joined into query results
#[derive(Debug, Clone, Copy, Default)]
pub struct QuerySources<'a> {
    pub chunks: Option<&'a [Chunk]>,
    pub pages: Option<&'a [RawPage]>,
}

impl<'a> QuerySources<'a> {
    pub fn new(chunks: Option<&'a [Chunk]>, pages: Option<&'a [RawPage]>) -> Self {
        Self { chunks, pages }
    }
}

/// One title-search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchContext {
    #[serde(rename = "match")]
    pub matched: Section,

    /// Root first, direct parent last
    pub parents: Vec<Section>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Section>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<Chunk>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Parent,
    Child,
    Sibling,
    Descendant,
}

/// A group of related sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub kind: RelationKind,
    pub sections: Vec<Section>,
}

/// Id-lookup hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationContext {
    #[serde(rename = "match")]
    pub matched: Section,

    pub relations: Vec<Relation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<Chunk>>,
}

impl RelationContext {
    pub fn relation(&self, kind: RelationKind) -> Option<&Relation> {
        self.relations.iter().find(|r| r.kind == kind)
    }
}

/// Outcome of an id lookup; a missing id is a result, not an error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IdLookup {
    Found(Box<RelationContext>),
    NotFound { section_id: String },
}

impl IdLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, IdLookup::Found(_))
    }

    pub fn context(&self) -> Option<&RelationContext> {
        match self {
            IdLookup::Found(context) => Some(context),
            IdLookup::NotFound { .. } => None,
        }
    }
}

/// Find sections by title, in tree order.
///
/// Matching lowercases and collapses whitespace on both sides. A blank
/// substring query matches every section.
#[instrument(skip(sections, options, sources), fields(sections = sections.len(), exact = options.exact))]
pub fn search(
    sections: &[Section],
    query: &str,
    options: &QueryOptions,
    sources: QuerySources<'_>,
) -> Result<Vec<SearchContext>> {
    let timer = StageTimer::start("query");
    let index = SectionIndex::build(sections)?;
    let needle = search_key(query);

    let mut contexts = Vec::new();
    for section in sections {
        let title = search_key(&section.title);
        let hit = if options.exact {
            title == needle
        } else {
            title.contains(&needle)
        };
        if !hit {
            continue;
        }

        contexts.push(SearchContext {
            matched: detached(section),
            parents: detached_all(&index.parent_chain(&section.id)?),
            children: options
                .include_children
                .then(|| detached_all(&index.children(&section.id))),
            data: options
                .include_data
                .then(|| page_data(section, sources.pages, options.max_raw_lines)),
            chunks: options
                .include_chunks
                .then(|| section_chunks(section, sources.chunks, options.max_chunks)),
        });
    }

    debug!(query, matches = contexts.len(), "Title search finished");
    record_query(timer, "title", !contexts.is_empty());
    Ok(contexts)
}

/// Look up one section and its grouped relations
#[instrument(skip(sections, options, sources), fields(sections = sections.len()))]
pub fn lookup_by_id(
    sections: &[Section],
    section_id: &str,
    options: &QueryOptions,
    sources: QuerySources<'_>,
) -> Result<IdLookup> {
    let timer = StageTimer::start("query");
    let index = SectionIndex::build(sections)?;

    let Some(section) = index.get(section_id) else {
        debug!(section_id, "Section not found");
        record_query(timer, "id", false);
        return Ok(IdLookup::NotFound {
            section_id: section_id.to_string(),
        });
    };

    let mut relations = vec![Relation {
        kind: RelationKind::Parent,
        sections: detached_all(&index.parent_chain(section_id)?),
    }];
    if options.include_children {
        relations.push(Relation {
            kind: RelationKind::Child,
            sections: detached_all(&index.children(section_id)),
        });
    }
    if options.include_siblings {
        relations.push(Relation {
            kind: RelationKind::Sibling,
            sections: detached_all(&index.siblings(section_id)?),
        });
    }
    if options.include_descendants {
        relations.push(Relation {
            kind: RelationKind::Descendant,
            sections: detached_all(&index.descendants(section_id)?),
        });
    }

    let context = RelationContext {
        matched: detached(section),
        relations,
        data: options
            .include_data
            .then(|| page_data(section, sources.pages, options.max_raw_lines)),
        chunks: options
            .include_chunks
            .then(|| section_chunks(section, sources.chunks, options.max_chunks)),
    };

    record_query(timer, "id", true);
    Ok(IdLookup::Found(Box::new(context)))
}

/// Copy without the derived children cache
fn detached(section: &Section) -> Section {
    Section {
        children: Vec::new(),
        ..section.clone()
    }
}

fn detached_all(sections: &[&Section]) -> Vec<Section> {
    sections.iter().map(|s| detached(s)).collect()
}

/// Lines following the heading on the match's page, or the page's first lines
fn page_data(section: &Section, pages: Option<&[RawPage]>, limit: usize) -> Vec<String> {
    let Some(page) = pages
        .unwrap_or(&[])
        .iter()
        .find(|p| p.page_number == section.page_number)
    else {
        return Vec::new();
    };

    let lines: Vec<&str> = page.text_lines().collect();
    let title = search_key(&section.title);
    let start = lines
        .iter()
        .position(|line| search_key(line).contains(&title))
        .map(|heading| heading + 1)
        .unwrap_or(0);

    lines
        .iter()
        .skip(start)
        .take(limit)
        .map(|line| line.to_string())
        .collect()
}

fn section_chunks(section: &Section, chunks: Option<&[Chunk]>, limit: usize) -> Vec<Chunk> {
    chunks
        .unwrap_or(&[])
        .iter()
        .filter(|chunk| chunk.belongs_to(&section.id))
        .take(limit)
        .cloned()
        .collect()
}
