//! Emotion tags and enrichment results.
//!
//! # Responsibility
//! - Define the closed set of emotion tags a note can carry.
//! - Define the `{sentiment, color_hex}` pair returned by classification.
//! - Own the deterministic neutral fallback.
//!
//! # Invariants
//! - `color_hex` of a validated result is a `#`-prefixed hex color with 3, 4,
//!   6 or 8 digits, kept exactly as the classifier spelled it (minus padding).
//! - The fallback pair is constant across the process lifetime.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Pastel color used whenever classification is unavailable.
pub const FALLBACK_COLOR_HEX: &str = "#fef3c7";

static COLOR_HEX_RE: Lazy<Regex> =
    Lazy::new(|| {
        Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
            .expect("valid color regex")
    });

/// Coarse emotion tag attached to a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Happy,
    Sad,
    Angry,
    Neutral,
    Love,
}

impl Sentiment {
    /// All supported tags, in declaration order.
    pub const ALL: [Sentiment; 5] = [
        Sentiment::Happy,
        Sentiment::Sad,
        Sentiment::Angry,
        Sentiment::Neutral,
        Sentiment::Love,
    ];

    /// Stable string id used in storage and classifier payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Neutral => "neutral",
            Self::Love => "love",
        }
    }

    /// Parses one tag, case-insensitive and whitespace tolerant.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "happy" => Some(Self::Happy),
            "sad" => Some(Self::Sad),
            "angry" => Some(Self::Angry),
            "neutral" => Some(Self::Neutral),
            "love" => Some(Self::Love),
            _ => None,
        }
    }
}

/// Enrichment output: an emotion tag plus its display color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentResult {
    pub sentiment: Sentiment,
    pub color_hex: String,
}

impl SentimentResult {
    /// Returns the fixed neutral fallback pair.
    pub fn fallback() -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            color_hex: FALLBACK_COLOR_HEX.to_string(),
        }
    }

    /// Builds a result from raw classifier fields.
    ///
    /// Returns `None` when either field is missing or malformed, so callers
    /// substitute the fallback for the whole pair and never mix halves.
    pub fn from_raw(sentiment: Option<&str>, color_hex: Option<&str>) -> Option<Self> {
        let sentiment = Sentiment::parse(sentiment?)?;
        let color_hex = normalize_color_hex(color_hex?)?;
        Some(Self {
            sentiment,
            color_hex,
        })
    }
}

/// Returns whether `value` is a `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` color.
pub fn is_valid_color_hex(value: &str) -> bool {
    COLOR_HEX_RE.is_match(value)
}

/// Trims surrounding whitespace from a hex color; case is preserved.
pub fn normalize_color_hex(value: &str) -> Option<String> {
    let trimmed = value.trim();
    is_valid_color_hex(trimmed).then(|| trimmed.to_string())
}
