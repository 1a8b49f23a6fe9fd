//! Heading rule file maintenance
//!
//! Discovers headings from layout alone and appends the new ones to an
//! existing rule file. A discovered text is appended as `sub:` only when
//! subsection classification is on and an existing `sub` or `sub_regex` rule
//! already accepts it; everything else is appended as `main:`.

use crate::errors::IngestionError;
use reportforge_common::config::HeadingConfig;
use reportforge_common::models::Fragment;
use reportforge_common::text::{collapse_whitespace, match_key};
use reportforge_segment::{Classifier, DocumentProfile, HeadingLevel, HeadingRule, RuleSet};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use tracing::{info, instrument};

/// Heading texts the layout heuristics accept, first occurrence order, deduplicated
pub fn discover_headings(fragments: &[Fragment], settings: &HeadingConfig) -> Vec<String> {
    let no_rules = RuleSet::empty();
    let classifier = Classifier::new(&no_rules, settings, DocumentProfile::from_fragments(fragments));

    let mut seen = HashSet::new();
    fragments
        .iter()
        .filter(|fragment| classifier.classify_layout(fragment).verdict().is_some())
        .map(|fragment| collapse_whitespace(fragment.trimmed()))
        .filter(|text| seen.insert(match_key(text)))
        .collect()
}

/// Rules to append for the discovered texts; texts already present as literals are skipped
pub fn plan_additions(
    rules: &RuleSet,
    discovered: &[String],
    classify_subsections: bool,
) -> Vec<HeadingRule> {
    let mut planned = RuleSet::empty();
    for text in discovered {
        if rules.has_literal(text) || planned.has_literal(text) {
            continue;
        }
        let level = if classify_subsections && rules.satisfies_sub(text) {
            HeadingLevel::Sub
        } else {
            HeadingLevel::Main
        };
        planned.push(HeadingRule::literal(level, text));
    }
    planned.rules().to_vec()
}

/// Append discovered headings to the rule file and return the updated rule set
#[instrument(skip(fragments, settings), fields(path = %path.display(), fragments = fragments.len()))]
pub fn update_keywords_file(
    path: &Path,
    fragments: &[Fragment],
    settings: &HeadingConfig,
    classify_subsections: bool,
) -> Result<RuleSet, IngestionError> {
    if !path.exists() {
        return Err(IngestionError::FileNotFound(path.display().to_string()));
    }

    let mut rules = RuleSet::load(path)?;
    let discovered = discover_headings(fragments, settings);
    let additions = plan_additions(&rules, &discovered, classify_subsections);

    if !additions.is_empty() {
        let existing = std::fs::read_to_string(path)?;
        let mut file = std::fs::OpenOptions::new().append(true).open(path)?;
        if !existing.is_empty() && !existing.ends_with('\n') {
            writeln!(file)?;
        }
        for rule in &additions {
            writeln!(file, "{}", rule)?;
        }
    }

    let added_sub = additions
        .iter()
        .filter(|r| r.level() == HeadingLevel::Sub)
        .count();
    info!(
        discovered = discovered.len(),
        added_main = additions.len() - added_sub,
        added_sub,
        "Keyword file updated"
    );

    for rule in additions {
        rules.push(rule);
    }
    Ok(rules)
}
