//! Subcommand implementations

use crate::args::{QueryArgs, RunArgs};
use anyhow::{bail, Context};
use reportforge_common::config::{AppConfig, QueryConfig};
use reportforge_common::errors::{AppError, ErrorCategory};
use reportforge_common::models::{read_json_file, ChunkDocument, RawPagesDocument, SectionDocument};
use reportforge_ingestion::{IngestionError, PageSource, Pipeline, PipelineOutputs, PipelineRequest};
use reportforge_search::{lookup_by_id, search, QueryOptions, QuerySources};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info};

/// Run the document pipeline
pub fn run(config: &AppConfig, args: &RunArgs) -> anyhow::Result<PipelineOutputs> {
    let source = match (&args.input, &args.raw_pages) {
        (_, Some(raw)) => PageSource::RawPages(raw.clone()),
        (Some(input), None) => PageSource::Pdf(input.clone()),
        (None, None) => bail!("either --input or --raw-pages is required"),
    };

    let mut request = PipelineRequest::from_config(source, config);
    if let Some(rules) = &args.rules {
        request.keywords_file = Some(rules.clone());
    }
    request.update_keywords |= args.update_keywords;
    request.auto_classify_subsections &= !args.no_auto_classify_subsections;
    request.chunk &= !args.no_chunks;

    info!(source = ?request.source, "Running pipeline");
    Ok(Pipeline::new(config.clone()).run(&request)?)
}

/// Query options: configuration defaults, then command line overrides
pub fn query_options(config: &QueryConfig, args: &QueryArgs) -> QueryOptions {
    let mut options = QueryOptions::from(config);
    options.exact |= args.exact;
    options.include_children &= !args.no_children;
    options.include_siblings &= !args.no_siblings;
    options.include_descendants |= args.descendants;
    options.include_chunks &= !args.no_chunks;
    options.include_data &= !args.no_data;
    if let Some(max) = args.max_chunks {
        options.max_chunks = max;
    }
    if let Some(max) = args.max_lines {
        options.max_raw_lines = max;
    }
    options
}

/// Run a title search or id lookup and return the JSON response
pub fn query(config: &AppConfig, args: &QueryArgs) -> anyhow::Result<Value> {
    let options = query_options(&config.query, args);
    let pipeline = &config.pipeline;

    let sections_path = args
        .sections
        .clone()
        .unwrap_or_else(|| config.artifact_path(&pipeline.sections_output_filename));
    if !sections_path.exists() {
        bail!("sections file not found: {}", sections_path.display());
    }
    let raw = std::fs::read_to_string(&sections_path)
        .with_context(|| format!("failed to read {}", sections_path.display()))?;
    let sections = SectionDocument::from_json_str(&raw)
        .with_context(|| format!("invalid sections file {}", sections_path.display()))?
        .sections;

    let chunks = if options.include_chunks {
        optional_artifact(&args.chunks, config.artifact_path(&pipeline.chunks_output_filename))
            .map(|path| read_json_file::<ChunkDocument>(&path))
            .transpose()?
            .map(|document| document.chunks)
    } else {
        None
    };
    let pages = if options.include_data {
        optional_artifact(&args.raw_pages, config.artifact_path(&pipeline.raw_output_filename))
            .map(|path| read_json_file::<RawPagesDocument>(&path))
            .transpose()?
            .map(|document| document.pages)
    } else {
        None
    };
    let sources = QuerySources::new(chunks.as_deref(), pages.as_deref());

    let response = match (&args.title, &args.id) {
        (_, Some(id)) => serde_json::to_value(lookup_by_id(&sections, id, &options, sources)?)?,
        (Some(title), None) => serde_json::to_value(search(&sections, title, &options, sources)?)?,
        (None, None) => bail!("either --title or --id is required"),
    };
    Ok(response)
}

/// Explicit path, or the default artifact when it exists
fn optional_artifact(explicit: &Option<PathBuf>, default: PathBuf) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.clone()),
        None if default.exists() => {
            debug!(path = %default.display(), "Using default artifact");
            Some(default)
        }
        None => None,
    }
}

/// Taxonomy category of a failed command, when the failure carries one
pub fn error_category(error: &anyhow::Error) -> Option<ErrorCategory> {
    if let Some(ingestion) = error.downcast_ref::<IngestionError>() {
        return Some(ingestion.category());
    }
    error.downcast_ref::<AppError>().map(AppError::category)
}

/// Human-readable summary of pipeline outputs
pub fn describe_outputs(outputs: &PipelineOutputs) -> Vec<String> {
    if outputs.is_empty() {
        return vec!["No outputs generated.".to_string()];
    }
    outputs
        .iter()
        .map(|(name, path)| format!("Wrote {}: {}", name, path.display()))
        .collect()
}
