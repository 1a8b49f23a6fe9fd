//! ReportForge CLI
//!
//! Two subcommands:
//! - `run`: extract a PDF (or reuse raw pages), build the section tree,
//!   write sections, heading candidates and chunks
//! - `query`: title search or id lookup against a built tree, printed as JSON

mod args;
mod commands;
mod telemetry;

use args::{Cli, Command};
use clap::Parser;
use reportforge_common::errors::ErrorResponse;
use reportforge_common::{config::AppConfig, metrics, AppError, VERSION};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = AppConfig::load_with(cli.config.as_deref()).map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    if let Some(out) = &cli.out {
        config.pipeline.out_dir = out.clone();
    }

    telemetry::init_tracing(&config.observability, cli.json_logs);
    info!("Starting ReportForge v{}", VERSION);

    let metrics_handle = if cli.metrics || config.observability.metrics_snapshot {
        Some(metrics::install_snapshot_recorder()?)
    } else {
        None
    };

    let result = match &cli.command {
        Command::Run(args) => commands::run(&config, args).map(|outputs| {
            for line in commands::describe_outputs(&outputs) {
                println!("{}", line);
            }
        }),
        Command::Query(args) => commands::query(&config, args)
            .and_then(|response| {
                println!("{}", serde_json::to_string_pretty(&response)?);
                Ok(())
            })
            .inspect_err(|e| {
                // Data-integrity and configuration failures are reported as JSON too
                if let Some(app_error) = e.downcast_ref::<AppError>() {
                    if let Ok(body) = serde_json::to_string_pretty(&ErrorResponse::from(app_error)) {
                        println!("{}", body);
                    }
                }
            }),
    };

    if let Some(handle) = metrics_handle {
        std::fs::create_dir_all(&config.pipeline.out_dir)?;
        let path = config.artifact_path(&config.observability.metrics_output_filename);
        metrics::write_snapshot(&handle, &path)?;
    }

    result.map_err(|e| {
        error!(error = %e, category = ?commands::error_category(&e), "Command failed");
        e
    })
}
