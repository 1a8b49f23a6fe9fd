//! Section tree construction
//!
//! Walks the page-ordered fragments once, keeping an explicit stack of open
//! sections:
//! - a `main` heading clears the stack and starts a new root
//! - a `sub` heading pops every open section at its level or deeper, then
//!   attaches to whatever remains on top (or becomes a root)
//! - everything else is body text
//!
//! Ids are assigned in creation order, so every parent precedes its children.

use crate::classifier::{Classification, Classifier, DocumentProfile};
use crate::rules::RuleSet;
use reportforge_common::config::HeadingConfig;
use reportforge_common::metrics::{record_build, StageTimer};
use reportforge_common::models::{Fragment, Section, SectionDocument, SectionLevel};
use reportforge_common::{sequence_id, SECTION_ID_PREFIX};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Fragment whose layout score was non-zero but below the acceptance threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingCandidate {
    pub text: String,
    pub page_number: u32,
    pub confidence: f32,
}

/// Persisted `heading_candidates.json` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingCandidateDocument {
    pub candidate_count: usize,
    pub candidates: Vec<HeadingCandidate>,
}

/// Result of one tree build
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    /// Sections in creation order, with `children` caches filled in
    pub sections: Vec<Section>,
    pub candidates: Vec<HeadingCandidate>,
    /// Fragments dropped to body text because of malformed layout
    pub degraded: usize,
}

impl BuildOutput {
    pub fn roots(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.is_root())
    }

    /// Persisted form; `parent_id` links are kept, children caches are not
    pub fn to_document(&self, source_file: Option<String>) -> SectionDocument {
        let sections = self
            .sections
            .iter()
            .cloned()
            .map(|mut section| {
                section.children.clear();
                section
            })
            .collect();
        SectionDocument::new(source_file, sections)
    }

    pub fn candidate_document(&self) -> HeadingCandidateDocument {
        HeadingCandidateDocument {
            candidate_count: self.candidates.len(),
            candidates: self.candidates.clone(),
        }
    }
}

/// Builds a section forest from classified fragments
pub struct SectionTreeBuilder<'a> {
    rules: &'a RuleSet,
    settings: &'a HeadingConfig,
}

impl<'a> SectionTreeBuilder<'a> {
    pub fn new(rules: &'a RuleSet, settings: &'a HeadingConfig) -> Self {
        Self { rules, settings }
    }

    /// Build the tree; a fresh build never depends on previous ones
    #[instrument(skip(self, fragments), fields(fragments = fragments.len(), rules = self.rules.len()))]
    pub fn build(&self, fragments: &[Fragment]) -> BuildOutput {
        let timer = StageTimer::start("build");
        let profile = DocumentProfile::from_fragments(fragments);
        let classifier = Classifier::new(self.rules, self.settings, profile);

        let mut output = BuildOutput::default();
        // (index into output.sections, level)
        let mut open: Vec<(usize, SectionLevel)> = Vec::new();

        for fragment in fragments {
            let verdict = match classifier.classify(fragment) {
                Classification::Heading(verdict) => verdict,
                Classification::Candidate { confidence } => {
                    output.candidates.push(HeadingCandidate {
                        text: fragment.trimmed().to_string(),
                        page_number: fragment.page_number,
                        confidence,
                    });
                    continue;
                }
                Classification::Degraded => {
                    debug!(
                        page = fragment.page_number,
                        text = %fragment.trimmed(),
                        "Malformed layout metadata, treating fragment as body text"
                    );
                    output.degraded += 1;
                    continue;
                }
                Classification::Body => continue,
            };

            let level = verdict.level.depth();
            if level == Section::MAIN_LEVEL {
                open.clear();
            } else {
                while open.last().is_some_and(|&(_, top)| top >= level) {
                    open.pop();
                }
            }

            let parent = open.last().map(|&(index, _)| index);
            let id = sequence_id(SECTION_ID_PREFIX, output.sections.len() + 1);
            let parent_id = parent.map(|index| output.sections[index].id.clone());

            debug!(
                section_id = %id,
                title = %fragment.trimmed(),
                level,
                parent_id = ?parent_id,
                source = ?verdict.source,
                confidence = verdict.confidence,
                "Section created"
            );

            let section = Section::new(
                id.clone(),
                fragment.trimmed(),
                level,
                parent_id,
                fragment.page_number,
            );
            if let Some(index) = parent {
                output.sections[index].children.push(id);
            }

            output.sections.push(section);
            open.push((output.sections.len() - 1, level));
        }

        info!(
            sections = output.sections.len(),
            roots = output.roots().count(),
            candidates = output.candidates.len(),
            degraded = output.degraded,
            "Section tree built"
        );
        record_build(
            timer,
            output.sections.len(),
            output.candidates.len(),
            output.degraded,
        );

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportforge_common::models::write_json_file;
    use std::collections::{HashMap, HashSet};

    fn report_rules() -> RuleSet {
        RuleSet::parse(
            "main: MÉTRICAS GENERALES\nmain: PROMOS\nsub: Enviados\nsub: Tasa apertura\nsub_regex:^Campaña\\s+\\d+$\n",
        )
        .unwrap()
    }

    fn fragments(texts: &[(&str, u32)]) -> Vec<Fragment> {
        texts
            .iter()
            .map(|(text, page)| Fragment::new(*text, *page))
            .collect()
    }

    #[test]
    fn test_main_with_sub_child() {
        let rules = report_rules();
        let settings = HeadingConfig::default();
        let output = SectionTreeBuilder::new(&rules, &settings).build(&fragments(&[
            ("MÉTRICAS GENERALES", 1),
            ("Enviados", 1),
            ("1,455,341", 1),
        ]));

        assert_eq!(output.sections.len(), 2);
        let root = &output.sections[0];
        assert_eq!(root.id, "sec_001");
        assert_eq!(root.title, "MÉTRICAS GENERALES");
        assert!(root.parent_id.is_none());
        assert_eq!(root.children, vec!["sec_002".to_string()]);

        let child = &output.sections[1];
        assert_eq!(child.title, "Enviados");
        assert_eq!(child.parent_id.as_deref(), Some("sec_001"));
        assert_eq!(child.level, Section::SUB_LEVEL);
    }

    #[test]
    fn test_sub_before_any_main_is_root() {
        let rules = report_rules();
        let settings = HeadingConfig::default();
        let output = SectionTreeBuilder::new(&rules, &settings)
            .build(&fragments(&[("Tasa apertura", 1), ("PROMOS", 2)]));

        assert_eq!(output.sections.len(), 2);
        assert!(output.sections[0].parent_id.is_none());
        assert_eq!(output.sections[0].level, Section::SUB_LEVEL);
        assert!(output.sections[1].parent_id.is_none());
    }

    #[test]
    fn test_sub_siblings_and_main_closes_branch() {
        let rules = report_rules();
        let settings = HeadingConfig::default();
        let output = SectionTreeBuilder::new(&rules, &settings).build(&fragments(&[
            ("PROMOS", 1),
            ("Campaña 1", 1),
            ("Enviados", 1),
            ("Campaña 2", 2),
            ("MÉTRICAS GENERALES", 3),
            ("Enviados", 3),
        ]));

        let parents: Vec<Option<&str>> = output
            .sections
            .iter()
            .map(|s| s.parent_id.as_deref())
            .collect();
        assert_eq!(
            parents,
            vec![
                None,
                Some("sec_001"),
                Some("sec_001"),
                Some("sec_001"),
                None,
                Some("sec_005"),
            ]
        );
        assert_eq!(output.sections[0].children.len(), 3);
    }

    #[test]
    fn test_duplicate_titles_get_distinct_ids() {
        let rules = report_rules();
        let settings = HeadingConfig::default();
        let output = SectionTreeBuilder::new(&rules, &settings).build(&fragments(&[
            ("PROMOS", 1),
            ("Enviados", 1),
            ("PROMOS", 4),
            ("Enviados", 4),
        ]));

        let ids: HashSet<&str> = output.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(output.sections[3].parent_id.as_deref(), Some("sec_003"));
    }

    #[test]
    fn test_parent_precedes_child_in_creation_order() {
        let rules = report_rules();
        let settings = HeadingConfig::default();
        let output = SectionTreeBuilder::new(&rules, &settings).build(&fragments(&[
            ("Enviados", 1),
            ("PROMOS", 1),
            ("Campaña 3", 2),
            ("Tasa apertura", 2),
            ("MÉTRICAS GENERALES", 1),
            ("Campaña 4", 5),
        ]));

        let position: HashMap<&str, usize> = output
            .sections
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.as_str(), i))
            .collect();
        for (i, section) in output.sections.iter().enumerate() {
            if let Some(parent) = &section.parent_id {
                assert!(position[parent.as_str()] < i);
            }
        }
    }

    #[test]
    fn test_rebuild_is_byte_identical() {
        let rules = report_rules();
        let settings = HeadingConfig::default();
        let input = fragments(&[
            ("MÉTRICAS GENERALES", 1),
            ("Enviados", 1),
            ("RESUMEN", 2),
            ("Campaña 7", 2),
        ]);

        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");

        let builder = SectionTreeBuilder::new(&rules, &settings);
        write_json_file(&first, &builder.build(&input).to_document(None)).unwrap();
        write_json_file(&second, &builder.build(&input).to_document(None)).unwrap();

        assert_eq!(
            std::fs::read(&first).unwrap(),
            std::fs::read(&second).unwrap()
        );
    }

    #[test]
    fn test_document_drops_children_cache() {
        let rules = report_rules();
        let settings = HeadingConfig::default();
        let output = SectionTreeBuilder::new(&rules, &settings)
            .build(&fragments(&[("PROMOS", 1), ("Enviados", 1)]));

        let document = output.to_document(Some("report.pdf".to_string()));
        assert_eq!(document.section_count, 2);
        assert!(document.sections.iter().all(|s| s.children.is_empty()));
        assert_eq!(document.sections[1].parent_id.as_deref(), Some("sec_001"));
    }

    #[test]
    fn test_candidates_and_degraded_are_body() {
        let rules = report_rules();
        let settings = HeadingConfig {
            acceptance_threshold: 0.6,
            ..HeadingConfig::default()
        };
        let input = vec![
            Fragment::new("PROMOS", 1),
            Fragment::new("NOTAS", 1).with_font_size(10.0),
            Fragment::new("Enviados", 1).with_font_size(-3.0),
            Fragment::new("texto normal", 1).with_font_size(10.0),
        ];
        let output = SectionTreeBuilder::new(&rules, &settings).build(&input);

        assert_eq!(output.sections.len(), 1);
        assert_eq!(output.degraded, 1);
        assert_eq!(output.candidates.len(), 1);
        assert_eq!(output.candidates[0].text, "NOTAS");
        assert_eq!(output.candidate_document().candidate_count, 1);
    }

    #[test]
    fn test_invalid_rules_fail_before_build() {
        let err = RuleSet::parse("main:PROMOS\nmain_regex:(unclosed\n").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_empty_input() {
        let rules = RuleSet::empty();
        let settings = HeadingConfig::default();
        let output = SectionTreeBuilder::new(&rules, &settings).build(&[]);
        assert!(output.sections.is_empty());
        assert!(output.candidates.is_empty());
    }
}
