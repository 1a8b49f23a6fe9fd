//! Extracted text fragments and their layout signals

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Page-space rectangle of a fragment (origin at the top-left of the page)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self { x0, top, x1, bottom }
    }

    /// Placeholder for metadata that could not be decoded
    fn malformed() -> Self {
        Self::new(f32::NAN, f32::NAN, f32::NAN, f32::NAN)
    }

    /// Finite coordinates with non-negative extent
    pub fn is_valid(&self) -> bool {
        [self.x0, self.top, self.x1, self.bottom]
            .iter()
            .all(|v| v.is_finite())
            && self.x1 >= self.x0
            && self.bottom >= self.top
    }
}

/// Letter casing of a fragment's text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasePattern {
    /// Every letter is uppercase
    Upper,
    /// Every letter is lowercase
    Lower,
    /// Every word starts with an uppercase letter
    Title,
    /// Anything else
    Mixed,
    /// No letters at all (numbers, punctuation)
    NoLetters,
}

impl CasePattern {
    pub fn of(text: &str) -> Self {
        let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
        if letters.is_empty() {
            return CasePattern::NoLetters;
        }
        if letters.iter().all(|c| !c.is_lowercase()) {
            return CasePattern::Upper;
        }
        if letters.iter().all(|c| !c.is_uppercase()) {
            return CasePattern::Lower;
        }

        let title_case = text
            .split_whitespace()
            .filter_map(|word| word.chars().find(|c| c.is_alphabetic()))
            .all(|first| first.is_uppercase());
        if title_case {
            CasePattern::Title
        } else {
            CasePattern::Mixed
        }
    }
}

/// One unit of extracted text with page and layout metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Text content as extracted
    pub text: String,

    /// Originating page (1-based)
    pub page_number: u32,

    /// Average font size in points, when known
    #[serde(
        default,
        deserialize_with = "lenient_font_size",
        skip_serializing_if = "Option::is_none"
    )]
    pub font_size: Option<f32>,

    /// Position on the page, when known
    #[serde(
        default,
        deserialize_with = "lenient_bbox",
        skip_serializing_if = "Option::is_none"
    )]
    pub bbox: Option<BoundingBox>,
}

impl Fragment {
    pub fn new(text: impl Into<String>, page_number: u32) -> Self {
        Self {
            text: text.into(),
            page_number,
            font_size: None,
            bbox: None,
        }
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = Some(font_size);
        self
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Text with surrounding whitespace removed
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }

    pub fn case_pattern(&self) -> CasePattern {
        CasePattern::of(self.trimmed())
    }

    /// Missing metadata is fine; present metadata must be well formed
    pub fn has_valid_layout(&self) -> bool {
        let size_ok = self.font_size.map_or(true, |s| s.is_finite() && s > 0.0);
        let bbox_ok = self.bbox.map_or(true, |b| b.is_valid());
        size_ok && bbox_ok
    }
}

/// Accepts numbers or numeric strings; anything else becomes NaN (malformed)
fn lenient_font_size<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(n.as_f64().map_or(f32::NAN, |v| v as f32)),
        Some(Value::String(s)) => Some(s.trim().parse::<f32>().unwrap_or(f32::NAN)),
        Some(_) => Some(f32::NAN),
    })
}

fn lenient_bbox<'de, D>(deserializer: D) -> Result<Option<BoundingBox>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(other) => {
            Some(serde_json::from_value::<BoundingBox>(other).unwrap_or_else(|_| BoundingBox::malformed()))
        }
    })
}
