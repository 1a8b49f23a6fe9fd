//! Heading classification
//!
//! Evaluation order is fixed and first-match-wins:
//! 1. Literal `main:`/`sub:` rules
//! 2. `main_regex:`/`sub_regex:` rules, in file order
//! 3. Layout heuristics relative to the document's median font size
//!
//! Fragments with malformed layout metadata are body text regardless of rules.

use crate::rules::RuleSet;
use reportforge_common::config::HeadingConfig;
use reportforge_common::models::{CasePattern, Fragment, Section, SectionLevel};
use reportforge_common::text::collapse_whitespace;
use serde::{Deserialize, Serialize};

/// Confidence of a literal rule match
pub const LITERAL_CONFIDENCE: f32 = 1.0;

/// Confidence of a regex rule match
pub const REGEX_CONFIDENCE: f32 = 0.95;

/// Upper bound of any layout-derived confidence
pub const LAYOUT_CONFIDENCE_CAP: f32 = 0.85;

const LARGE_FONT_WEIGHT: f32 = 0.45;
const ALL_CAPS_WEIGHT: f32 = 0.35;
const SHORT_WEIGHT: f32 = 0.1;
const SEPARATOR_WEIGHT: f32 = 0.1;

/// Heading level decided by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingLevel {
    Main,
    Sub,
}

impl HeadingLevel {
    /// Section level stored on the tree node
    pub fn depth(self) -> SectionLevel {
        match self {
            HeadingLevel::Main => Section::MAIN_LEVEL,
            HeadingLevel::Sub => Section::SUB_LEVEL,
        }
    }
}

/// Which rule family produced a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictSource {
    Literal,
    Regex,
    Layout,
}

/// A positive heading decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingVerdict {
    pub level: HeadingLevel,
    pub confidence: f32,
    pub source: VerdictSource,
    /// Index of the matching rule; `None` for layout verdicts
    pub rule_index: Option<usize>,
}

/// Full outcome for one fragment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification {
    Heading(HeadingVerdict),
    /// Layout score above zero but below the acceptance threshold
    Candidate { confidence: f32 },
    Body,
    /// Malformed layout metadata; treated as body text
    Degraded,
}

impl Classification {
    pub fn verdict(&self) -> Option<HeadingVerdict> {
        match self {
            Classification::Heading(verdict) => Some(*verdict),
            _ => None,
        }
    }
}

/// Per-document statistics the layout heuristics compare against
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DocumentProfile {
    pub median_font_size: Option<f32>,
}

impl DocumentProfile {
    /// Median font size over fragments with well-formed layout
    pub fn from_fragments(fragments: &[Fragment]) -> Self {
        let mut sizes: Vec<f32> = fragments
            .iter()
            .filter(|f| f.has_valid_layout())
            .filter_map(|f| f.font_size)
            .collect();

        if sizes.is_empty() {
            return Self::default();
        }

        sizes.sort_by(|a, b| a.total_cmp(b));
        let mid = sizes.len() / 2;
        let median = if sizes.len() % 2 == 0 {
            (sizes[mid - 1] + sizes[mid]) / 2.0
        } else {
            sizes[mid]
        };

        Self {
            median_font_size: Some(median),
        }
    }
}

/// Layout signals observed on one fragment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutSignals {
    pub large_font: bool,
    pub all_caps: bool,
    pub short: bool,
    pub separator: bool,
}

impl LayoutSignals {
    /// Detect signals; text outside the configured length bounds has none
    pub fn detect(
        fragment: &Fragment,
        profile: &DocumentProfile,
        settings: &HeadingConfig,
    ) -> Self {
        let text = collapse_whitespace(fragment.trimmed());
        let chars = text.chars().count();
        if chars < settings.min_heading_chars || chars > settings.max_heading_chars {
            return Self::default();
        }

        let large_font = match (fragment.font_size, profile.median_font_size) {
            (Some(size), Some(median)) => size >= median + settings.font_size_delta,
            _ => false,
        };

        Self {
            large_font,
            all_caps: fragment.case_pattern() == CasePattern::Upper,
            short: text.split_whitespace().count() <= settings.max_heading_words,
            separator: has_separator(&text),
        }
    }

    /// Weighted score; zero unless a primary signal fired
    pub fn score(&self) -> f32 {
        if !(self.large_font || self.all_caps || self.separator) {
            return 0.0;
        }

        let mut score = 0.0;
        if self.large_font {
            score += LARGE_FONT_WEIGHT;
        }
        if self.all_caps {
            score += ALL_CAPS_WEIGHT;
        }
        if self.short {
            score += SHORT_WEIGHT;
        }
        if self.separator {
            score += SEPARATOR_WEIGHT;
        }
        score.min(LAYOUT_CONFIDENCE_CAP)
    }
}

/// Trailing colon, or a leading outline number such as `1.` or `2.3`
fn has_separator(text: &str) -> bool {
    if text.ends_with(':') {
        return true;
    }

    let mut chars = text.chars().peekable();
    let mut saw_digit = false;
    let mut saw_dot = false;
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            saw_digit = true;
        } else if c == '.' && saw_digit {
            saw_dot = true;
        } else {
            break;
        }
        chars.next();
    }

    // "1. Intro" and "2.3 Resultados" qualify; "1,455,341" does not
    saw_digit
        && chars.next().is_some_and(|c| c.is_whitespace() || (saw_dot && c.is_alphabetic()))
        && chars.any(|c| c.is_alphabetic())
}

/// Classifies fragments against one rule set and document profile
#[derive(Debug, Clone)]
pub struct Classifier<'a> {
    rules: &'a RuleSet,
    settings: &'a HeadingConfig,
    profile: DocumentProfile,
}

impl<'a> Classifier<'a> {
    pub fn new(rules: &'a RuleSet, settings: &'a HeadingConfig, profile: DocumentProfile) -> Self {
        Self {
            rules,
            settings,
            profile,
        }
    }

    /// Heading verdict only
    pub fn evaluate(&self, fragment: &Fragment) -> Option<HeadingVerdict> {
        self.classify(fragment).verdict()
    }

    pub fn classify(&self, fragment: &Fragment) -> Classification {
        let text = fragment.trimmed();
        if text.is_empty() {
            return Classification::Body;
        }
        if !fragment.has_valid_layout() {
            return Classification::Degraded;
        }

        if let Some(matched) = self.rules.match_literal(text) {
            return Classification::Heading(HeadingVerdict {
                level: matched.level,
                confidence: LITERAL_CONFIDENCE,
                source: VerdictSource::Literal,
                rule_index: Some(matched.rule_index),
            });
        }

        let collapsed = collapse_whitespace(text);
        if let Some(matched) = self.rules.match_regex(&collapsed) {
            return Classification::Heading(HeadingVerdict {
                level: matched.level,
                confidence: REGEX_CONFIDENCE,
                source: VerdictSource::Regex,
                rule_index: Some(matched.rule_index),
            });
        }

        self.classify_layout(fragment)
    }

    /// Layout heuristics alone, ignoring every rule
    pub fn classify_layout(&self, fragment: &Fragment) -> Classification {
        if fragment.trimmed().is_empty() {
            return Classification::Body;
        }
        if !fragment.has_valid_layout() {
            return Classification::Degraded;
        }

        let signals = LayoutSignals::detect(fragment, &self.profile, self.settings);
        let score = signals.score();

        // A zero score is body text whatever the threshold
        if score > 0.0 && score >= self.settings.acceptance_threshold {
            let level = if signals.large_font {
                HeadingLevel::Main
            } else {
                HeadingLevel::Sub
            };
            Classification::Heading(HeadingVerdict {
                level,
                confidence: score,
                source: VerdictSource::Layout,
                rule_index: None,
            })
        } else if score > 0.0 {
            Classification::Candidate { confidence: score }
        } else {
            Classification::Body
        }
    }
}

/// Classify one fragment with default heading settings.
///
/// Without a document profile the large-font signal never fires; use
/// [`Classifier`] with [`DocumentProfile::from_fragments`] for whole documents.
pub fn classify(fragment: &Fragment, rules: &RuleSet) -> Option<HeadingVerdict> {
    let settings = HeadingConfig::default();
    Classifier::new(rules, &settings, DocumentProfile::default()).evaluate(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportforge_common::models::BoundingBox;

    fn rules() -> RuleSet {
        RuleSet::parse("main:MÉTRICAS GENERALES\nsub:Enviados\nsub_regex:^Tasa\\s+de\\s+\\w+$\n")
            .unwrap()
    }

    fn body(text: &str) -> Fragment {
        Fragment::new(text, 1).with_font_size(10.0)
    }

    #[test]
    fn test_literal_rules_win() {
        let rules = rules();
        let verdict = classify(&Fragment::new("Metricas Generales", 1), &rules).unwrap();
        assert_eq!(verdict.level, HeadingLevel::Main);
        assert_eq!(verdict.source, VerdictSource::Literal);
        assert_eq!(verdict.confidence, LITERAL_CONFIDENCE);
    }

    #[test]
    fn test_regex_rule_matches_collapsed_text() {
        let rules = rules();
        let verdict = classify(&Fragment::new("  Tasa   de apertura ", 2), &rules).unwrap();
        assert_eq!(verdict.level, HeadingLevel::Sub);
        assert_eq!(verdict.source, VerdictSource::Regex);
        assert_eq!(verdict.rule_index, Some(2));
    }

    #[test]
    fn test_no_match_is_none() {
        let rules = rules();
        assert!(classify(&Fragment::new("1,455,341", 1), &rules).is_none());
        assert!(classify(&Fragment::new("   ", 1), &rules).is_none());
    }

    #[test]
    fn test_layout_verdicts_below_rule_confidence() {
        let rules = RuleSet::empty();
        let settings = HeadingConfig::default();
        let fragments = vec![
            body("regular paragraph text"),
            body("more regular text"),
            body("yet more text"),
            Fragment::new("RESUMEN EJECUTIVO", 1).with_font_size(16.0),
        ];
        let classifier = Classifier::new(
            &rules,
            &settings,
            DocumentProfile::from_fragments(&fragments),
        );

        let verdict = classifier.evaluate(&fragments[3]).unwrap();
        assert_eq!(verdict.level, HeadingLevel::Main);
        assert_eq!(verdict.source, VerdictSource::Layout);
        assert!(verdict.confidence <= LAYOUT_CONFIDENCE_CAP);
        assert!(verdict.confidence < REGEX_CONFIDENCE);

        // All caps at body size is a sub heading
        let sub = classifier.evaluate(&body("DETALLE SEMANAL")).unwrap();
        assert_eq!(sub.level, HeadingLevel::Sub);
    }

    #[test]
    fn test_sub_threshold_score_is_candidate() {
        let rules = RuleSet::empty();
        let settings = HeadingConfig {
            acceptance_threshold: 0.6,
            ..HeadingConfig::default()
        };
        let classifier = Classifier::new(&rules, &settings, DocumentProfile::default());

        match classifier.classify(&body("NOTAS")) {
            Classification::Candidate { confidence } => assert!(confidence > 0.0 && confidence < 0.6),
            other => panic!("unexpected classification: {other:?}"),
        }
        assert_eq!(classifier.classify(&body("plain words here")), Classification::Body);
    }

    #[test]
    fn test_zero_threshold_keeps_plain_text_as_body() {
        let rules = RuleSet::empty();
        let settings = HeadingConfig {
            acceptance_threshold: 0.0,
            ..HeadingConfig::default()
        };
        let classifier = Classifier::new(&rules, &settings, DocumentProfile::default());

        assert_eq!(classifier.classify(&body("texto del reporte")), Classification::Body);
        assert!(classifier.evaluate(&body("Resumen:")).is_some());
    }

    #[test]
    fn test_length_bounds() {
        let rules = RuleSet::empty();
        let settings = HeadingConfig::default();
        let classifier = Classifier::new(&rules, &settings, DocumentProfile::default());

        assert_eq!(classifier.classify(&body("AB")), Classification::Body);
        let long = "A".repeat(121);
        assert_eq!(classifier.classify(&body(&long)), Classification::Body);
    }

    #[test]
    fn test_malformed_layout_is_degraded_even_with_rule() {
        let rules = rules();
        let settings = HeadingConfig::default();
        let classifier = Classifier::new(&rules, &settings, DocumentProfile::default());

        let bad_size = Fragment::new("Enviados", 1).with_font_size(f32::NAN);
        assert_eq!(classifier.classify(&bad_size), Classification::Degraded);

        let inverted = Fragment::new("Enviados", 1).with_bbox(BoundingBox::new(50.0, 20.0, 10.0, 30.0));
        assert_eq!(classifier.classify(&inverted), Classification::Degraded);

        let zero = Fragment::new("Enviados", 1).with_font_size(0.0);
        assert_eq!(classifier.classify(&zero), Classification::Degraded);
    }

    #[test]
    fn test_separator_detection() {
        assert!(has_separator("Resultados:"));
        assert!(has_separator("1. Introducción"));
        assert!(has_separator("2.3 Resultados"));
        assert!(!has_separator("1,455,341"));
        assert!(!has_separator("2024"));
        assert!(!has_separator("Open rate 12%"));
    }

    #[test]
    fn test_median_ignores_malformed_fragments() {
        let fragments = vec![
            body("a"),
            Fragment::new("b", 1).with_font_size(12.0),
            Fragment::new("c", 1).with_font_size(f32::NAN),
            Fragment::new("d", 1),
        ];
        let profile = DocumentProfile::from_fragments(&fragments);
        assert_eq!(profile.median_font_size, Some(11.0));
        assert_eq!(DocumentProfile::from_fragments(&[]).median_font_size, None);
    }

    #[test]
    fn test_level_depth() {
        assert_eq!(HeadingLevel::Main.depth(), 0);
        assert_eq!(HeadingLevel::Sub.depth(), 1);
    }
}
