//! Pipeline processor
//!
//! Runs one document start to finish:
//! 1. Obtain raw pages (extract the PDF, or reuse a raw pages file)
//! 2. Load heading rules once, optionally updating the rule file first
//! 3. Build the section tree and write sections and heading candidates
//! 4. Chunk the pages per section

use crate::chunker::chunk_sections;
use crate::errors::IngestionError;
use crate::keywords::update_keywords_file;
use crate::pdf::{extract_pages, fragments_from_pages};
use reportforge_common::config::AppConfig;
use reportforge_common::models::{read_json_file, write_json_file, ChunkDocument, RawPagesDocument};
use reportforge_segment::{RuleSet, SectionTreeBuilder};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// Where the raw pages come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    /// Extract from a PDF and write the raw pages artifact
    Pdf(PathBuf),
    /// Reuse a previously written raw pages file
    RawPages(PathBuf),
}

/// One pipeline invocation
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub source: PageSource,
    pub out_dir: PathBuf,
    pub keywords_file: Option<PathBuf>,
    pub update_keywords: bool,
    pub auto_classify_subsections: bool,
    pub chunk: bool,
}

impl PipelineRequest {
    /// Request seeded from the pipeline configuration
    pub fn from_config(source: PageSource, config: &AppConfig) -> Self {
        Self {
            source,
            out_dir: config.pipeline.out_dir.clone(),
            keywords_file: config.pipeline.keywords_file.clone(),
            update_keywords: config.pipeline.update_keywords,
            auto_classify_subsections: config.pipeline.auto_classify_subsections,
            chunk: config.pipeline.chunk,
        }
    }
}

/// Generated artifact name -> path
pub type PipelineOutputs = BTreeMap<String, PathBuf>;

/// Document pipeline
pub struct Pipeline {
    config: AppConfig,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[instrument(skip(self, request), fields(out_dir = %request.out_dir.display()))]
    pub fn run(&self, request: &PipelineRequest) -> Result<PipelineOutputs, IngestionError> {
        let pipeline = &self.config.pipeline;
        let mut outputs = PipelineOutputs::new();

        if request.update_keywords && request.keywords_file.is_none() {
            return Err(IngestionError::ConfigError(
                "a keywords file is required when updating keywords".to_string(),
            ));
        }
        if let Some(path) = &request.keywords_file {
            if !path.exists() {
                return Err(IngestionError::ConfigError(format!(
                    "keywords file not found: {}",
                    path.display()
                )));
            }
        }

        std::fs::create_dir_all(&request.out_dir)?;

        let mut raw = match &request.source {
            PageSource::Pdf(input) => {
                let document = extract_pages(input)?;
                let path = request.out_dir.join(&pipeline.raw_output_filename);
                write_json_file(&path, &document)?;
                outputs.insert("raw_pages".to_string(), path);
                document
            }
            PageSource::RawPages(path) => {
                info!(path = %path.display(), "Reusing raw pages");
                read_json_file::<RawPagesDocument>(path)?
            }
        };
        if !pipeline.extract_fragments {
            for page in &mut raw.pages {
                page.fragments.clear();
            }
        }

        let fragments = fragments_from_pages(&raw.pages);
        let rules = match &request.keywords_file {
            Some(path) if request.update_keywords => {
                update_keywords_file(
                    path,
                    &fragments,
                    &self.config.heading,
                    request.auto_classify_subsections,
                )?
            }
            Some(path) => RuleSet::load(path)?,
            None => {
                info!("No keywords file configured, using built-in keywords");
                RuleSet::default_keywords()
            }
        };

        let built = SectionTreeBuilder::new(&rules, &self.config.heading).build(&fragments);
        if built.sections.is_empty() {
            warn!(fragments = fragments.len(), "No headings recognized");
        }

        let sections_path = request.out_dir.join(&pipeline.sections_output_filename);
        write_json_file(&sections_path, &built.to_document(raw.source_file.clone()))?;
        outputs.insert("sections".to_string(), sections_path);

        let candidates_path = request.out_dir.join(&pipeline.candidates_output_filename);
        write_json_file(&candidates_path, &built.candidate_document())?;
        outputs.insert("heading_candidates".to_string(), candidates_path);

        if request.chunk {
            let chunks = chunk_sections(&raw.pages, &built.sections, &self.config.chunking)?;
            let chunks_path = request.out_dir.join(&pipeline.chunks_output_filename);
            write_json_file(&chunks_path, &ChunkDocument::new(raw.source_file.clone(), chunks))?;
            outputs.insert("chunks".to_string(), chunks_path);
        }

        info!(
            sections = built.sections.len(),
            outputs = outputs.len(),
            "Pipeline complete"
        );
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportforge_common::models::{Fragment, RawPage, SectionDocument};
    use std::path::Path;

    fn raw_pages(dir: &Path) -> PathBuf {
        let mut first = RawPage::new(
            1,
            vec![
                "MÉTRICAS GENERALES".into(),
                "Enviados".into(),
                "1,455,341".into(),
            ],
        );
        first.fragments = vec![
            Fragment::new("MÉTRICAS GENERALES", 1).with_font_size(18.0),
            Fragment::new("Enviados", 1).with_font_size(10.0),
            Fragment::new("1,455,341", 1).with_font_size(10.0),
        ];
        let second = RawPage::new(2, vec!["PROMOS".into(), "Promo de verano.".into()]);

        let path = dir.join("input_raw.json");
        write_json_file(
            &path,
            &RawPagesDocument::new(Some("report.pdf".to_string()), vec![first, second]),
        )
        .unwrap();
        path
    }

    fn request(dir: &Path, keywords: Option<PathBuf>) -> PipelineRequest {
        PipelineRequest {
            source: PageSource::RawPages(raw_pages(dir)),
            out_dir: dir.join("out"),
            keywords_file: keywords,
            update_keywords: false,
            auto_classify_subsections: true,
            chunk: true,
        }
    }

    #[test]
    fn test_run_from_raw_pages_with_rules() {
        let dir = tempfile::tempdir().unwrap();
        let keywords = dir.path().join("keywords.txt");
        std::fs::write(&keywords, "main:MÉTRICAS GENERALES\nmain:PROMOS\nsub:Enviados\n").unwrap();

        let pipeline = Pipeline::new(AppConfig::default());
        let outputs = pipeline.run(&request(dir.path(), Some(keywords))).unwrap();

        let names: Vec<&str> = outputs.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["chunks", "heading_candidates", "sections"]);

        let sections: SectionDocument = read_json_file(&outputs["sections"]).unwrap();
        assert_eq!(sections.source_file.as_deref(), Some("report.pdf"));
        let parents: Vec<Option<&str>> = sections
            .sections
            .iter()
            .map(|s| s.parent_id.as_deref())
            .collect();
        assert_eq!(parents, vec![None, Some("sec_001"), None]);

        let chunks: ChunkDocument = read_json_file(&outputs["chunks"]).unwrap();
        assert_eq!(chunks.chunk_count, 2);
        assert_eq!(chunks.chunks[0].section_id.as_deref(), Some("sec_002"));
        assert_eq!(chunks.chunks[1].section_id.as_deref(), Some("sec_003"));
    }

    #[test]
    fn test_run_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(AppConfig::default());
        let request = request(dir.path(), None);

        let first = pipeline.run(&request).unwrap();
        let before = std::fs::read(&first["sections"]).unwrap();
        let second = pipeline.run(&request).unwrap();
        assert_eq!(before, std::fs::read(&second["sections"]).unwrap());
    }

    #[test]
    fn test_update_keywords_requires_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut request = request(dir.path(), None);
        request.update_keywords = true;

        let err = Pipeline::new(AppConfig::default()).run(&request).unwrap_err();
        assert!(matches!(err, IngestionError::ConfigError(_)));
    }

    #[test]
    fn test_invalid_rule_file_aborts_before_writing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let keywords = dir.path().join("keywords.txt");
        std::fs::write(&keywords, "main:PROMOS\nsub_regex:[unclosed\n").unwrap();

        let request = request(dir.path(), Some(keywords));
        let err = Pipeline::new(AppConfig::default()).run(&request).unwrap_err();

        assert!(matches!(err, IngestionError::App(_)));
        assert!(!request.out_dir.join("sections.json").exists());
    }

    #[test]
    fn test_run_updates_keywords_then_builds() {
        let dir = tempfile::tempdir().unwrap();
        let keywords = dir.path().join("keywords.txt");
        std::fs::write(&keywords, "sub:Enviados\n").unwrap();

        let mut request = request(dir.path(), Some(keywords.clone()));
        request.update_keywords = true;
        request.chunk = false;
        let outputs = Pipeline::new(AppConfig::default()).run(&request).unwrap();

        let contents = std::fs::read_to_string(&keywords).unwrap();
        assert!(contents.contains("main:MÉTRICAS GENERALES"));
        assert!(!outputs.contains_key("chunks"));

        let sections: SectionDocument = read_json_file(&outputs["sections"]).unwrap();
        assert_eq!(sections.sections[0].title, "MÉTRICAS GENERALES");
        assert_eq!(sections.sections[1].parent_id.as_deref(), Some("sec_001"));
    }

    #[test]
    fn test_update_without_subsection_classification_appends_main() {
        let dir = tempfile::tempdir().unwrap();
        let keywords = dir.path().join("keywords.txt");
        std::fs::write(&keywords, "sub_regex:^MÉTRICAS\n").unwrap();

        let mut request = request(dir.path(), Some(keywords.clone()));
        request.update_keywords = true;
        request.auto_classify_subsections = false;
        request.chunk = false;
        Pipeline::new(AppConfig::default()).run(&request).unwrap();

        let contents = std::fs::read_to_string(&keywords).unwrap();
        assert!(contents.contains("main:MÉTRICAS GENERALES"));
        assert!(!contents.contains("sub:MÉTRICAS GENERALES"));
    }
}
