//! Metrics and observability utilities
//!
//! Records pipeline and query metrics through the `metrics` facade.
//! Without an installed recorder every call is a no-op; the CLI can install
//! a Prometheus recorder and write its text snapshot next to the artifacts.

use crate::errors::{AppError, Result};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;
use std::time::Instant;

/// Metrics prefix for all ReportForge metrics
pub const METRICS_PREFIX: &str = "reportforge";

/// Register all metric descriptions
pub fn register_metrics() {
    // Tree build metrics
    describe_counter!(
        format!("{}_sections_built_total", METRICS_PREFIX),
        Unit::Count,
        "Total sections created by tree builds"
    );

    describe_counter!(
        format!("{}_heading_candidates_total", METRICS_PREFIX),
        Unit::Count,
        "Fragments with a sub-threshold heading score"
    );

    describe_counter!(
        format!("{}_degraded_fragments_total", METRICS_PREFIX),
        Unit::Count,
        "Fragments treated as body text because of malformed layout metadata"
    );

    describe_histogram!(
        format!("{}_build_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Section tree build latency in seconds"
    );

    // Chunking metrics
    describe_counter!(
        format!("{}_chunks_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total chunks created"
    );

    // Query metrics
    describe_counter!(
        format!("{}_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total section queries"
    );

    describe_histogram!(
        format!("{}_query_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Section query latency in seconds"
    );

    tracing::debug!("Metrics registered");
}

/// Helper to time one pipeline stage
pub struct StageTimer {
    start: Instant,
    stage: &'static str,
}

impl StageTimer {
    /// Start timing a stage
    pub fn start(stage: &'static str) -> Self {
        Self {
            start: Instant::now(),
            stage,
        }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// Seconds elapsed since the timer started
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Helper to record tree build metrics
pub fn record_build(timer: StageTimer, sections: usize, candidates: usize, degraded: usize) {
    counter!(format!("{}_sections_built_total", METRICS_PREFIX)).increment(sections as u64);

    counter!(format!("{}_heading_candidates_total", METRICS_PREFIX)).increment(candidates as u64);

    counter!(format!("{}_degraded_fragments_total", METRICS_PREFIX)).increment(degraded as u64);

    histogram!(
        format!("{}_build_duration_seconds", METRICS_PREFIX),
        "stage" => timer.stage()
    )
    .record(timer.elapsed_secs());
}

/// Helper to record chunking metrics
pub fn record_chunking(chunks_created: usize) {
    counter!(format!("{}_chunks_created_total", METRICS_PREFIX)).increment(chunks_created as u64);
}

/// Helper to record query metrics
pub fn record_query(timer: StageTimer, mode: &str, found: bool) {
    let outcome = if found { "match" } else { "no_match" };

    counter!(
        format!("{}_queries_total", METRICS_PREFIX),
        "mode" => mode.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(
        format!("{}_query_duration_seconds", METRICS_PREFIX),
        "mode" => mode.to_string()
    )
    .record(timer.elapsed_secs());
}

/// Install a process-wide Prometheus recorder and return its render handle
pub fn install_snapshot_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| AppError::Internal {
            message: format!("failed to install metrics recorder: {}", e),
        })?;
    register_metrics();
    Ok(handle)
}

/// Render the recorder's current state to a Prometheus text file
pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    std::fs::write(path, handle.render())?;
    tracing::info!(path = %path.display(), "Metrics snapshot written");
    Ok(())
}
