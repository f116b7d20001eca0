//! Sentiment classification seam.
//!
//! # Responsibility
//! - Define the async contract mapping note text to `{sentiment, color_hex}`.
//! - Classify failures so callers can log them before falling back.
//!
//! # Invariants
//! - A classifier reporting `is_configured() == false` must not be called.
//! - One attempt per call; implementations never retry.

use crate::model::sentiment::SentimentResult;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub mod gemini;

pub use gemini::GeminiClassifier;

/// Reasons a classification attempt produced no usable result.
#[derive(Debug)]
pub enum ClassifierError {
    /// No credential or endpoint configured.
    NotConfigured,
    /// Request could not be sent or the body could not be read.
    Http(reqwest::Error),
    /// Service answered with a non-success status.
    Status { code: u16, body: String },
    /// Response arrived but lacks a valid sentiment/color pair.
    Malformed(String),
    /// No answer within the configured bound.
    TimedOut(Duration),
}

impl ClassifierError {
    /// Stable short code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::Http(_) => "http",
            Self::Status { .. } => "status",
            Self::Malformed(_) => "malformed",
            Self::TimedOut(_) => "timeout",
        }
    }
}

impl Display for ClassifierError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "sentiment classifier is not configured"),
            Self::Http(err) => write!(f, "sentiment request failed: {err}"),
            Self::Status { code, body } => {
                write!(f, "sentiment service returned HTTP {code}: {body}")
            }
            Self::Malformed(details) => write!(f, "malformed sentiment response: {details}"),
            Self::TimedOut(after) => {
                write!(f, "sentiment request timed out after {} ms", after.as_millis())
            }
        }
    }
}

impl Error for ClassifierError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClassifierError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

/// Maps free text to an emotion tag and display color.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Whether a network call can be attempted at all.
    fn is_configured(&self) -> bool;

    /// Classifies `text`. Any error is treated by callers as "unavailable".
    async fn classify(&self, text: &str) -> Result<SentimentResult, ClassifierError>;
}
