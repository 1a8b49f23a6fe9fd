//! Document models
//!
//! Records exchanged between pipeline stages and persisted as JSON artifacts:
//! - `Fragment`: one extracted text unit with layout metadata
//! - `Section`: a node of the section tree
//! - `Chunk`: paragraph/table content attached to a section
//! - `RawPage`: page-ordered text lines used for query enrichment

mod chunk;
mod fragment;
mod page;
mod section;

pub use chunk::{Chunk, ChunkDocument, ChunkKind};
pub use fragment::{BoundingBox, CasePattern, Fragment};
pub use page::{RawPage, RawPagesDocument};
pub use section::{Section, SectionDocument, SectionLevel};

use crate::errors::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Read and decode a JSON artifact from disk
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(AppError::file_not_found(path.display().to_string()));
    }

    let contents = fs::read_to_string(path)?;
    let value = serde_json::from_str(&contents).map_err(|e| AppError::InvalidFormat {
        message: format!("{}: {}", path.display(), e),
    })?;

    debug!(path = %path.display(), bytes = contents.len(), "Loaded JSON artifact");
    Ok(value)
}

/// Encode a value as pretty JSON and write it to disk
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');
    fs::write(path, &body)?;

    debug!(path = %path.display(), bytes = body.len(), "Wrote JSON artifact");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sections.json");

        let document = SectionDocument::new(
            Some("report.pdf".to_string()),
            vec![Section::new("sec_001", "MÉTRICAS GENERALES", 0, None, 1)],
        );
        write_json_file(&path, &document).unwrap();

        let loaded: SectionDocument = read_json_file(&path).unwrap();
        assert_eq!(loaded, document);

        // Non-ASCII titles are written verbatim
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("MÉTRICAS GENERALES"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = read_json_file::<SectionDocument>(Path::new("/nonexistent/sections.json"))
            .unwrap_err();
        assert_eq!(err.category(), crate::errors::ErrorCategory::NotFound);
    }

    #[test]
    fn test_malformed_file_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = read_json_file::<SectionDocument>(&path).unwrap_err();
        assert_eq!(err.category(), crate::errors::ErrorCategory::Input);
    }
}
