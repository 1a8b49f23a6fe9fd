//! Configuration management for ReportForge
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local, or an explicit path)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// Pipeline artifact locations and modes
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Heading classification thresholds
    #[serde(default)]
    pub heading: HeadingConfig,

    /// Section chunking settings
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Query defaults
    #[serde(default)]
    pub query: QueryConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Directory receiving every artifact
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    #[serde(default = "default_raw_output")]
    pub raw_output_filename: String,

    #[serde(default = "default_sections_output")]
    pub sections_output_filename: String,

    #[serde(default = "default_chunks_output")]
    pub chunks_output_filename: String,

    #[serde(default = "default_candidates_output")]
    pub candidates_output_filename: String,

    /// Heading rule file; built-in keywords are used when unset
    #[serde(default)]
    pub keywords_file: Option<PathBuf>,

    /// Append discovered headings to the rule file before building
    #[serde(default)]
    pub update_keywords: bool,

    /// Append discovered texts accepted by an existing sub rule as `sub:`;
    /// when off every addition is `main:`
    #[serde(default = "default_enabled")]
    pub auto_classify_subsections: bool,

    /// Record per-line layout fragments during PDF extraction
    #[serde(default = "default_enabled")]
    pub extract_fragments: bool,

    /// Run the section chunker after building the tree
    #[serde(default = "default_enabled")]
    pub chunk: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HeadingConfig {
    /// Points above the document median that count as a large font
    #[serde(default = "default_font_size_delta")]
    pub font_size_delta: f32,

    /// Shorter texts are never layout headings
    #[serde(default = "default_min_heading_chars")]
    pub min_heading_chars: usize,

    /// Longer texts are never layout headings
    #[serde(default = "default_max_heading_chars")]
    pub max_heading_chars: usize,

    /// Maximum word count for the short-length signal
    #[serde(default = "default_max_heading_words")]
    pub max_heading_words: usize,

    /// Minimum layout score for a heading verdict
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkingConfig {
    /// Chunks longer than this many characters are split further
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Require full-title equality in title search
    #[serde(default)]
    pub exact: bool,

    #[serde(default = "default_enabled")]
    pub include_children: bool,

    #[serde(default = "default_enabled")]
    pub include_siblings: bool,

    #[serde(default)]
    pub include_descendants: bool,

    /// Attach chunks owned by each match
    #[serde(default = "default_enabled")]
    pub include_chunks: bool,

    /// Attach raw page lines near each match
    #[serde(default = "default_enabled")]
    pub include_data: bool,

    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,

    #[serde(default = "default_max_raw_lines")]
    pub max_raw_lines: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logging: bool,

    /// Write a Prometheus text snapshot next to the artifacts
    #[serde(default)]
    pub metrics_snapshot: bool,

    #[serde(default = "default_metrics_output")]
    pub metrics_output_filename: String,
}

// Default value functions
fn default_out_dir() -> PathBuf { PathBuf::from("out") }
fn default_raw_output() -> String { "raw_pages.json".to_string() }
fn default_sections_output() -> String { "sections.json".to_string() }
fn default_chunks_output() -> String { "chunks.json".to_string() }
fn default_candidates_output() -> String { "heading_candidates.json".to_string() }
fn default_enabled() -> bool { true }
fn default_font_size_delta() -> f32 { 2.0 }
fn default_min_heading_chars() -> usize { 3 }
fn default_max_heading_chars() -> usize { 120 }
fn default_max_heading_words() -> usize { 12 }
fn default_acceptance_threshold() -> f32 { 0.4 }
fn default_max_chunk_chars() -> usize { 1500 }
fn default_max_chunks() -> usize { 5 }
fn default_max_raw_lines() -> usize { 3 }
fn default_log_level() -> String { "info".to_string() }
fn default_metrics_output() -> String { "metrics.prom".to_string() }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
            raw_output_filename: default_raw_output(),
            sections_output_filename: default_sections_output(),
            chunks_output_filename: default_chunks_output(),
            candidates_output_filename: default_candidates_output(),
            keywords_file: None,
            update_keywords: false,
            auto_classify_subsections: default_enabled(),
            extract_fragments: default_enabled(),
            chunk: default_enabled(),
        }
    }
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            font_size_delta: default_font_size_delta(),
            min_heading_chars: default_min_heading_chars(),
            max_heading_chars: default_max_heading_chars(),
            max_heading_words: default_max_heading_words(),
            acceptance_threshold: default_acceptance_threshold(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            exact: false,
            include_children: default_enabled(),
            include_siblings: default_enabled(),
            include_descendants: false,
            include_chunks: default_enabled(),
            include_data: default_enabled(),
            max_chunks: default_max_chunks(),
            max_raw_lines: default_max_raw_lines(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
            metrics_snapshot: false,
            metrics_output_filename: default_metrics_output(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Load configuration, layering an explicit file over the standard sources
    pub fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let mut builder = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            // Load from environment variables with APP__ prefix
            // e.g., APP__QUERY__MAX_CHUNKS=10
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific configuration file only
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path))
            .build()?;

        config.try_deserialize()
    }

    /// Full path of an artifact inside the output directory
    pub fn artifact_path(&self, filename: &str) -> PathBuf {
        self.pipeline.out_dir.join(filename)
    }
}
