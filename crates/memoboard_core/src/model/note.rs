//! Note domain model.
//!
//! # Responsibility
//! - Define the canonical note record and its persisted shape.
//! - Own input validation for note text and image payloads.
//!
//! # Invariants
//! - `id` is stable and never reused for another note.
//! - `text` is trimmed, non-empty and at most `MAX_TEXT_CHARS` characters.
//! - `timestamp`, `rotation` and `sway_speed` are fixed at creation.
//! - `color` is always a `#`-prefixed 3, 4, 6 or 8 digit hex color.

use crate::model::sentiment::{is_valid_color_hex, Sentiment, SentimentResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Maximum note length in characters, counted after trimming.
pub const MAX_TEXT_CHARS: usize = 250;
/// Rotation bound in degrees; cosmetic rotation lies in `[-MAX, MAX]`.
pub const MAX_ROTATION_DEGREES: f64 = 3.0;

static IMAGE_DATA_URI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:image/[A-Za-z0-9.+-]+;base64,[A-Za-z0-9+/=\s]+$")
        .expect("valid image data uri regex")
});

/// Stable identifier for one note.
pub type NoteId = Uuid;

/// Provenance of a note. The store only creates `User` notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    User,
    Community,
    Ai,
}

impl Author {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Community => "community",
            Self::Ai => "ai",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "community" => Some(Self::Community),
            "ai" => Some(Self::Ai),
            _ => None,
        }
    }
}

/// Cosmetic sway category chosen once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwaySpeed {
    Slow,
    Medium,
    Fast,
}

impl SwaySpeed {
    pub const ALL: [SwaySpeed; 3] = [SwaySpeed::Slow, SwaySpeed::Medium, SwaySpeed::Fast];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Slow => "slow",
            Self::Medium => "medium",
            Self::Fast => "fast",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "slow" => Some(Self::Slow),
            "medium" => Some(Self::Medium),
            "fast" => Some(Self::Fast),
            _ => None,
        }
    }
}

/// Canonical memory-board note.
///
/// Serialized with camelCase keys so the record keeps the
/// `{id, text, timestamp, author, sentiment?, color, image?, rotation, swaySpeed}`
/// shape expected by existing stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub text: String,
    /// Creation instant in epoch milliseconds.
    pub timestamp: i64,
    pub author: Author,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    pub color: String,
    /// Embedded image as a `data:image/...;base64,` URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Degrees, presentation only.
    pub rotation: f64,
    pub sway_speed: SwaySpeed,
}

impl Note {
    /// Builds a fresh user note with a generated id.
    ///
    /// Callers are expected to pass text already accepted by
    /// [`validate_note_text`].
    pub fn new_user(
        text: impl Into<String>,
        image: Option<String>,
        enrichment: SentimentResult,
        timestamp: i64,
        rotation: f64,
        sway_speed: SwaySpeed,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            timestamp,
            author: Author::User,
            sentiment: Some(enrichment.sentiment),
            color: enrichment.color_hex,
            image,
            rotation,
            sway_speed,
        }
    }

    /// Replaces the mutable content, keeping identity and cosmetics.
    pub fn apply_edit(&mut self, text: String, image: Option<String>, enrichment: SentimentResult) {
        self.text = text;
        self.image = image;
        self.sentiment = Some(enrichment.sentiment);
        self.color = enrichment.color_hex;
    }

    /// Checks record-level invariants before persistence and after read-back.
    pub fn validate(&self) -> Result<(), NoteValidationError> {
        if self.text.trim() != self.text {
            return Err(NoteValidationError::UntrimmedText);
        }
        validate_note_text(&self.text)?;
        if !is_valid_color_hex(&self.color) {
            return Err(NoteValidationError::InvalidColor(self.color.clone()));
        }
        if !self.rotation.is_finite() || self.rotation.abs() > MAX_ROTATION_DEGREES {
            return Err(NoteValidationError::RotationOutOfRange(self.rotation));
        }
        validate_image(self.image.as_deref())?;
        Ok(())
    }
}

/// Validation failures for note input and reorder requests.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteValidationError {
    /// Text is empty or whitespace only.
    EmptyText,
    /// Text exceeds `MAX_TEXT_CHARS` after trimming.
    TextTooLong { max: usize, actual: usize },
    /// Stored text carries leading/trailing whitespace.
    UntrimmedText,
    /// Image payload is not an image data URI.
    InvalidImage,
    /// Color is not a supported hex form.
    InvalidColor(String),
    /// Rotation is not finite or outside the cosmetic bound.
    RotationOutOfRange(f64),
    /// Reorder request length differs from the collection length.
    ReorderLengthMismatch { expected: usize, actual: usize },
    /// Reorder request lists the same id twice.
    ReorderDuplicateId(NoteId),
    /// Reorder request names an id absent from the collection.
    ReorderUnknownId(NoteId),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "note text must not be empty"),
            Self::TextTooLong { max, actual } => {
                write!(f, "note text is {actual} characters; maximum is {max}")
            }
            Self::UntrimmedText => write!(f, "note text must be stored trimmed"),
            Self::InvalidImage => write!(f, "note image must be an image data URI"),
            Self::InvalidColor(value) => write!(f, "invalid note color `{value}`"),
            Self::RotationOutOfRange(value) => {
                write!(f, "note rotation {value} is outside ±{MAX_ROTATION_DEGREES}")
            }
            Self::ReorderLengthMismatch { expected, actual } => write!(
                f,
                "reorder must list {expected} note ids, got {actual}"
            ),
            Self::ReorderDuplicateId(id) => write!(f, "reorder lists note {id} more than once"),
            Self::ReorderUnknownId(id) => write!(f, "reorder lists unknown note {id}"),
        }
    }
}

impl Error for NoteValidationError {}

/// Validates raw user text and returns the trimmed value to store.
pub fn validate_note_text(raw: &str) -> Result<String, NoteValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NoteValidationError::EmptyText);
    }
    let actual = trimmed.chars().count();
    if actual > MAX_TEXT_CHARS {
        return Err(NoteValidationError::TextTooLong {
            max: MAX_TEXT_CHARS,
            actual,
        });
    }
    Ok(trimmed.to_string())
}

/// Validates an optional image payload.
pub fn validate_image(image: Option<&str>) -> Result<(), NoteValidationError> {
    match image {
        Some(value) if !IMAGE_DATA_URI_RE.is_match(value) => Err(NoteValidationError::InvalidImage),
        _ => Ok(()),
    }
}
