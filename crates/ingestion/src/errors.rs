//! Ingestion error types

use reportforge_common::errors::{AppError, ErrorCategory};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("PDF parse error for {path}: {message}")]
    PdfParseError { path: String, message: String },

    #[error("Chunking error: {0}")]
    ChunkingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    App(#[from] AppError),
}

impl IngestionError {
    /// Category shared with core errors, reported when a command fails
    pub fn category(&self) -> ErrorCategory {
        match self {
            IngestionError::PdfParseError { .. } => ErrorCategory::Input,
            IngestionError::ChunkingError(_) => ErrorCategory::Internal,
            IngestionError::ConfigError(_) => ErrorCategory::Configuration,
            IngestionError::FileNotFound(_) => ErrorCategory::NotFound,
            IngestionError::IoError(_) => ErrorCategory::Internal,
            IngestionError::App(e) => e.category(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_keeps_category() {
        let err: IngestionError = AppError::InvalidRegex {
            line: 3,
            pattern: "(".to_string(),
            message: "unclosed group".to_string(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_missing_keywords_file_is_configuration() {
        let err = IngestionError::ConfigError("keywords file required".to_string());
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
