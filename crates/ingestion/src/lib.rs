//! ReportForge Ingestion
//!
//! Everything around the section tree that touches files:
//! - PDF extraction into raw pages with per-line layout fragments
//! - Section chunking into paragraph and table chunks
//! - Heading rule file maintenance
//! - The end-to-end pipeline that writes every artifact

pub mod chunker;
pub mod errors;
pub mod keywords;
pub mod pdf;
pub mod processor;

pub use chunker::chunk_sections;
pub use errors::IngestionError;
pub use keywords::{discover_headings, update_keywords_file};
pub use pdf::{extract_pages, fragments_from_pages};
pub use processor::{PageSource, Pipeline, PipelineOutputs, PipelineRequest};
