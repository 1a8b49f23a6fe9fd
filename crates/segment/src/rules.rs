//! Heading rule sets
//!
//! Rule file format, one rule per line:
//! - `main:<text>` / `sub:<text>` literal headings (case- and accent-insensitive)
//! - `main_regex:<pattern>` / `sub_regex:<pattern>` regex headings
//! - blank lines and lines starting with `#` are ignored
//!
//! Any other line is a configuration error that names the line number.

use crate::classifier::HeadingLevel;
use regex_lite::Regex;
use reportforge_common::errors::{AppError, Result};
use reportforge_common::text::match_key;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Keywords used when no rule file is configured
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "INTRODUCCION",
    "NEWSLETTER",
    "PROMOS",
    "METRICAS GENERALES",
    "MÉTRICAS GENERALES",
    "EVOLUTIVOS",
    "CAMPAÑAS",
    "CAMPANAS",
];

/// One heading rule; the variant set is closed
#[derive(Debug, Clone)]
pub enum HeadingRule {
    LiteralMain { text: String, key: String },
    LiteralSub { text: String, key: String },
    RegexMain { pattern: Regex },
    RegexSub { pattern: Regex },
}

impl HeadingRule {
    /// Build a literal rule for the given level
    pub fn literal(level: HeadingLevel, text: &str) -> Self {
        let text = text.trim().to_string();
        let key = match_key(&text);
        match level {
            HeadingLevel::Main => HeadingRule::LiteralMain { text, key },
            HeadingLevel::Sub => HeadingRule::LiteralSub { text, key },
        }
    }

    /// Compile a regex rule; `line` is reported on failure
    pub fn regex(level: HeadingLevel, pattern: &str, line: usize) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| AppError::InvalidRegex {
            line,
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(match level {
            HeadingLevel::Main => HeadingRule::RegexMain { pattern },
            HeadingLevel::Sub => HeadingRule::RegexSub { pattern },
        })
    }

    pub fn level(&self) -> HeadingLevel {
        match self {
            HeadingRule::LiteralMain { .. } | HeadingRule::RegexMain { .. } => HeadingLevel::Main,
            HeadingRule::LiteralSub { .. } | HeadingRule::RegexSub { .. } => HeadingLevel::Sub,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            HeadingRule::LiteralMain { .. } | HeadingRule::LiteralSub { .. }
        )
    }

    /// Literal rules compare normalized keys; regex rules search the trimmed text
    fn matches(&self, text: &str, key: &str) -> bool {
        match self {
            HeadingRule::LiteralMain { key: rule_key, .. }
            | HeadingRule::LiteralSub { key: rule_key, .. } => rule_key == key,
            HeadingRule::RegexMain { pattern } | HeadingRule::RegexSub { pattern } => {
                pattern.is_match(text)
            }
        }
    }
}

impl fmt::Display for HeadingRule {
    /// Renders the rule as a rule-file line
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadingRule::LiteralMain { text, .. } => write!(f, "main:{}", text),
            HeadingRule::LiteralSub { text, .. } => write!(f, "sub:{}", text),
            HeadingRule::RegexMain { pattern } => write!(f, "main_regex:{}", pattern.as_str()),
            HeadingRule::RegexSub { pattern } => write!(f, "sub_regex:{}", pattern.as_str()),
        }
    }
}

/// A successful rule match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch {
    pub level: HeadingLevel,
    /// Position of the rule in file order
    pub rule_index: usize,
}

/// Ordered heading rules, loaded once per build
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<HeadingRule>,
}

impl RuleSet {
    /// Create an empty rule set (layout heuristics only)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Built-in main-heading keywords
    pub fn default_keywords() -> Self {
        Self {
            rules: DEFAULT_KEYWORDS
                .iter()
                .map(|k| HeadingRule::literal(HeadingLevel::Main, k))
                .collect(),
        }
    }

    /// Parse rule-file contents
    pub fn parse(contents: &str) -> Result<Self> {
        let mut rules = Vec::new();

        for (index, raw_line) in contents.lines().enumerate() {
            let line_number = index + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((prefix, value)) = line.split_once(':') else {
                return Err(AppError::InvalidRule {
                    line: line_number,
                    content: line.to_string(),
                    message: "expected `<kind>:<value>`".to_string(),
                });
            };

            let value = value.trim();
            if value.is_empty() {
                return Err(AppError::InvalidRule {
                    line: line_number,
                    content: line.to_string(),
                    message: "empty rule value".to_string(),
                });
            }

            let rule = match prefix.trim() {
                "main" => HeadingRule::literal(HeadingLevel::Main, value),
                "sub" => HeadingRule::literal(HeadingLevel::Sub, value),
                "main_regex" => HeadingRule::regex(HeadingLevel::Main, value, line_number)?,
                "sub_regex" => HeadingRule::regex(HeadingLevel::Sub, value, line_number)?,
                other => {
                    return Err(AppError::InvalidRule {
                        line: line_number,
                        content: line.to_string(),
                        message: format!("unknown rule kind `{}`", other),
                    })
                }
            };
            rules.push(rule);
        }

        debug!(rule_count = rules.len(), "Heading rules parsed");
        Ok(Self { rules })
    }

    /// Load and parse a rule file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::Configuration {
                message: format!("keywords file not found: {}", path.display()),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let rule_set = Self::parse(&contents)?;
        info!(
            path = %path.display(),
            rule_count = rule_set.len(),
            "Loaded heading rules"
        );
        Ok(rule_set)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[HeadingRule] {
        &self.rules
    }

    /// Append a rule after every existing rule
    pub fn push(&mut self, rule: HeadingRule) {
        self.rules.push(rule);
    }

    /// First literal rule equal to the text, in file order
    pub fn match_literal(&self, text: &str) -> Option<RuleMatch> {
        let key = match_key(text);
        self.first_match(text, &key, true)
    }

    /// First regex rule matching the text, in file order
    pub fn match_regex(&self, text: &str) -> Option<RuleMatch> {
        let text = text.trim();
        self.first_match(text, "", false)
    }

    /// Whether any literal rule (of either level) covers this text
    pub fn has_literal(&self, text: &str) -> bool {
        self.match_literal(text).is_some()
    }

    /// Whether a `sub` or `sub_regex` rule accepts the text
    pub fn satisfies_sub(&self, text: &str) -> bool {
        let key = match_key(text);
        let trimmed = text.trim();
        self.rules
            .iter()
            .filter(|rule| rule.level() == HeadingLevel::Sub)
            .any(|rule| rule.matches(trimmed, &key))
    }

    fn first_match(&self, text: &str, key: &str, literal: bool) -> Option<RuleMatch> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.is_literal() == literal)
            .find(|(_, rule)| rule.matches(text, key))
            .map(|(rule_index, rule)| RuleMatch {
                level: rule.level(),
                rule_index,
            })
    }
}
