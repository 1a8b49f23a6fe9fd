//! Error types for ReportForge
//!
//! Provides the error taxonomy shared by every crate:
//! - Configuration errors (malformed rule files, bad regex, unreadable config)
//! - Data-integrity errors (duplicate section ids, cycles, dangling parents)
//! - Not-found errors for missing files and resources
//! - Error codes for machine-readable handling

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration errors (1xxx)
    ConfigurationError,
    InvalidRule,
    InvalidRegex,

    // Data-integrity errors (2xxx)
    DuplicateSectionId,
    CycleDetected,
    DanglingParent,

    // Resource errors (4xxx)
    NotFound,
    SectionNotFound,

    // Input errors (5xxx)
    InvalidFormat,
    SerializationError,

    // Internal errors (9xxx)
    IoError,
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Configuration (1xxx)
            ErrorCode::ConfigurationError => 1001,
            ErrorCode::InvalidRule => 1002,
            ErrorCode::InvalidRegex => 1003,

            // Data integrity (2xxx)
            ErrorCode::DuplicateSectionId => 2001,
            ErrorCode::CycleDetected => 2002,
            ErrorCode::DanglingParent => 2003,

            // Resources (4xxx)
            ErrorCode::NotFound => 4001,
            ErrorCode::SectionNotFound => 4002,

            // Input (5xxx)
            ErrorCode::InvalidFormat => 5001,
            ErrorCode::SerializationError => 5002,

            // Internal (9xxx)
            ErrorCode::IoError => 9001,
            ErrorCode::InternalError => 9002,
        }
    }
}

/// Coarse error taxonomy used by callers to decide how to react
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad rule file or settings; aborts before any section is created
    Configuration,
    /// Corrupted tree data; never repaired silently
    DataIntegrity,
    /// Requested resource does not exist
    NotFound,
    /// Input file could not be decoded
    Input,
    /// I/O and everything else
    Internal,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid rule at line {line}: {message} ({content:?})")]
    InvalidRule {
        line: usize,
        content: String,
        message: String,
    },

    #[error("Invalid regex at line {line} ({pattern:?}): {message}")]
    InvalidRegex {
        line: usize,
        pattern: String,
        message: String,
    },

    // Data-integrity errors
    #[error("Duplicate section id: {id}")]
    DuplicateSectionId { id: String },

    #[error("Cycle detected in parent links at section {section_id}")]
    CycleDetected { section_id: String },

    #[error("Section {section_id} references missing parent {parent_id}")]
    DanglingParent {
        section_id: String,
        parent_id: String,
    },

    // Resource errors
    #[error("Resource not found: {resource_type} {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Section not found: {id}")]
    SectionNotFound { id: String },

    // Input errors
    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Internal errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::InvalidRule { .. } => ErrorCode::InvalidRule,
            AppError::InvalidRegex { .. } => ErrorCode::InvalidRegex,
            AppError::DuplicateSectionId { .. } => ErrorCode::DuplicateSectionId,
            AppError::CycleDetected { .. } => ErrorCode::CycleDetected,
            AppError::DanglingParent { .. } => ErrorCode::DanglingParent,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::SectionNotFound { .. } => ErrorCode::SectionNotFound,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Io(_) => ErrorCode::IoError,
            AppError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Get the taxonomy category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Configuration { .. }
            | AppError::InvalidRule { .. }
            | AppError::InvalidRegex { .. } => ErrorCategory::Configuration,

            AppError::DuplicateSectionId { .. }
            | AppError::CycleDetected { .. }
            | AppError::DanglingParent { .. } => ErrorCategory::DataIntegrity,

            AppError::NotFound { .. } | AppError::SectionNotFound { .. } => {
                ErrorCategory::NotFound
            }

            AppError::InvalidFormat { .. } | AppError::Serialization(_) => ErrorCategory::Input,

            AppError::Io(_) | AppError::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Check if this error reports corrupted tree data
    pub fn is_data_integrity(&self) -> bool {
        self.category() == ErrorCategory::DataIntegrity
    }

    /// Check if this error comes from bad configuration
    pub fn is_configuration(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    /// Shorthand for a file-level not-found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        AppError::NotFound {
            resource_type: "file".to_string(),
            id: path.into(),
        }
    }
}

impl From<::config::ConfigError> for AppError {
    fn from(err: ::config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}

/// Structured error payload for JSON output
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub category: ErrorCategory,
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        ErrorResponse {
            error: ErrorDetails {
                code: err.code(),
                category: err.category(),
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::DuplicateSectionId { id: "sec_001".into() };
        assert_eq!(err.code(), ErrorCode::DuplicateSectionId);
        assert_eq!(err.code().as_code(), 2001);
        assert!(err.is_data_integrity());
    }

    #[test]
    fn test_rule_errors_are_configuration() {
        let err = AppError::InvalidRegex {
            line: 4,
            pattern: "([a-z".into(),
            message: "unclosed group".into(),
        };
        assert!(err.is_configuration());
        assert!(err.to_string().contains("line 4"));
        assert!(err.to_string().contains("([a-z"));
    }

    #[test]
    fn test_io_error_is_internal() {
        let err: AppError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert_eq!(err.category(), ErrorCategory::Internal);
    }

    #[test]
    fn test_error_response_serialization() {
        let err = AppError::CycleDetected { section_id: "sec_002".into() };
        let body = serde_json::to_value(ErrorResponse::from(&err)).unwrap();
        assert_eq!(body["error"]["code"], "CYCLE_DETECTED");
        assert_eq!(body["error"]["category"], "data_integrity");
    }
}
