//! ReportForge Common Library
//!
//! Shared code for all ReportForge crates including:
//! - Document models (fragments, sections, chunks, raw pages)
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability
//! - Text normalization helpers

pub mod config;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod text;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, ErrorCategory, Result};
pub use models::{
    BoundingBox, CasePattern, Chunk, ChunkDocument, ChunkKind, Fragment, RawPage,
    RawPagesDocument, Section, SectionDocument, SectionLevel,
};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix used for generated section ids (`sec_001`, `sec_002`, ...)
pub const SECTION_ID_PREFIX: &str = "sec";

/// Prefix used for generated chunk ids
pub const CHUNK_ID_PREFIX: &str = "chunk";

/// Format a sequence number into a stable, zero-padded identifier.
pub fn sequence_id(prefix: &str, sequence: usize) -> String {
    format!("{}_{:03}", prefix, sequence)
}
