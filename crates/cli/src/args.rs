//! Command line arguments

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "reportforge", version)]
#[command(about = "Section trees and relation queries for semi-structured PDF reports", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file layered over config/default and config/{APP_ENV}
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output directory for artifacts
    #[arg(long, global = true, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Write a Prometheus metrics snapshot into the output directory
    #[arg(long, global = true)]
    pub metrics: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract a PDF, build the section tree, and chunk it
    Run(RunArgs),
    /// Query a built section tree by title or id
    Query(QueryArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// PDF report to process
    #[arg(long, alias = "file", value_name = "PDF", required_unless_present = "raw_pages")]
    pub input: Option<PathBuf>,

    /// Reuse an existing raw_pages.json instead of extracting
    #[arg(long, value_name = "FILE", conflicts_with = "input")]
    pub raw_pages: Option<PathBuf>,

    /// Heading rule file
    #[arg(long, alias = "keywords-file", value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Append discovered headings to the rule file before building
    #[arg(long)]
    pub update_keywords: bool,

    /// Append every discovered heading as `main:`, even when a sub rule accepts it
    #[arg(long, requires = "update_keywords")]
    pub no_auto_classify_subsections: bool,

    /// Skip chunking
    #[arg(long)]
    pub no_chunks: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct QueryArgs {
    /// Find sections whose title contains this text
    #[arg(long, required_unless_present = "id", conflicts_with = "id")]
    pub title: Option<String>,

    /// Look up one section and its relations
    #[arg(long, value_name = "SECTION_ID")]
    pub id: Option<String>,

    /// Match the full title instead of a substring
    #[arg(long)]
    pub exact: bool,

    /// Sections file (defaults to the output directory's sections file)
    #[arg(long, value_name = "FILE")]
    pub sections: Option<PathBuf>,

    /// Chunks file for enrichment
    #[arg(long, value_name = "FILE")]
    pub chunks: Option<PathBuf>,

    /// Raw pages file for enrichment
    #[arg(long, value_name = "FILE")]
    pub raw_pages: Option<PathBuf>,

    #[arg(long)]
    pub no_children: bool,

    /// Omit siblings from id lookups
    #[arg(long)]
    pub no_siblings: bool,

    /// Include descendants in id lookups
    #[arg(long)]
    pub descendants: bool,

    #[arg(long)]
    pub no_chunks: bool,

    /// Omit raw page lines
    #[arg(long)]
    pub no_data: bool,

    #[arg(long, value_name = "N")]
    pub max_chunks: Option<usize>,

    /// Raw lines per match
    #[arg(long, value_name = "N")]
    pub max_lines: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_query_requires_title_or_id() {
        assert!(Cli::try_parse_from(["reportforge", "query"]).is_err());
        assert!(Cli::try_parse_from(["reportforge", "query", "--title", "a", "--id", "sec_001"]).is_err());

        let cli = Cli::try_parse_from(["reportforge", "query", "--id", "sec_002", "--descendants"]).unwrap();
        match cli.command {
            Command::Query(args) => {
                assert_eq!(args.id.as_deref(), Some("sec_002"));
                assert!(args.descendants);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_run_accepts_raw_pages_instead_of_input() {
        let cli = Cli::try_parse_from([
            "reportforge",
            "run",
            "--raw-pages",
            "out/raw_pages.json",
            "--out",
            "build",
        ])
        .unwrap();
        assert_eq!(cli.out, Some(PathBuf::from("build")));
        assert!(matches!(cli.command, Command::Run(RunArgs { input: None, .. })));

        assert!(Cli::try_parse_from(["reportforge", "run"]).is_err());
    }

    #[test]
    fn test_subsection_toggle_needs_keyword_update() {
        assert!(Cli::try_parse_from([
            "reportforge",
            "run",
            "--input",
            "report.pdf",
            "--no-auto-classify-subsections",
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "reportforge",
            "run",
            "--input",
            "report.pdf",
            "--update-keywords",
            "--no-auto-classify-subsections",
        ])
        .unwrap();
        match cli.command {
            Command::Run(args) => assert!(args.no_auto_classify_subsections),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
