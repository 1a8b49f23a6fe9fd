//! ReportForge Segmentation
//!
//! Turns a page-ordered fragment sequence into a section forest:
//! 1. Heading rules are loaded once per build and passed explicitly
//! 2. The classifier evaluates each fragment (literal, regex, then layout)
//! 3. The tree builder links headings with an explicit open-section stack

pub mod builder;
pub mod classifier;
pub mod rules;

pub use builder::{BuildOutput, HeadingCandidate, HeadingCandidateDocument, SectionTreeBuilder};
pub use classifier::{
    classify, Classification, Classifier, DocumentProfile, HeadingLevel, HeadingVerdict,
    LayoutSignals, VerdictSource,
};
pub use rules::{HeadingRule, RuleMatch, RuleSet, DEFAULT_KEYWORDS};
