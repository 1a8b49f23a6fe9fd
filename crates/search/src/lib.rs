//! ReportForge Search
//!
//! Read-only queries over a built section tree:
//! - [`index::SectionIndex`] for id, child and parent-chain lookups
//! - [`query`] for title search and id lookup with relation groups,
//!   optionally enriched with chunks and raw page lines

pub mod index;
pub mod query;

pub use index::SectionIndex;
pub use query::{
    lookup_by_id, search, IdLookup, QueryOptions, QuerySources, Relation, RelationContext,
    RelationKind, SearchContext,
};
