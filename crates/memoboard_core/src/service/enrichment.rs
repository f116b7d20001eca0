//! Enrichment orchestration around a sentiment classifier.
//!
//! # Responsibility
//! - Skip the classifier entirely when it is not configured.
//! - Bound each call with a timeout.
//! - Collapse every failure into the neutral fallback.
//!
//! # Invariants
//! - `enrich` never fails and never returns a half-valid pair.
//! - At most one classifier call per `enrich`.

use crate::classifier::{ClassifierError, SentimentClassifier};
use crate::logging::sanitize_message;
use crate::model::sentiment::{normalize_color_hex, SentimentResult};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

const MAX_LOGGED_ERROR_CHARS: usize = 200;

/// Wraps a classifier with the timeout and fallback policy.
#[derive(Clone)]
pub struct Enricher {
    classifier: Arc<dyn SentimentClassifier>,
    timeout: Duration,
}

impl Enricher {
    pub fn new(classifier: Arc<dyn SentimentClassifier>, timeout: Duration) -> Self {
        Self {
            classifier,
            timeout,
        }
    }

    /// Returns the classifier result, or the fallback on any failure.
    pub async fn enrich(&self, text: &str) -> SentimentResult {
        let started_at = Instant::now();
        match self.try_enrich(text).await {
            Ok(result) => {
                info!(
                    "event=note_enrich module=enrichment status=ok sentiment={} duration_ms={}",
                    result.sentiment.as_str(),
                    started_at.elapsed().as_millis()
                );
                result
            }
            Err(ClassifierError::NotConfigured) => {
                debug!("event=note_enrich module=enrichment status=skipped reason=not_configured");
                SentimentResult::fallback()
            }
            Err(err) => {
                warn!(
                    "event=note_enrich module=enrichment status=fallback error_code={} duration_ms={} error={}",
                    err.code(),
                    started_at.elapsed().as_millis(),
                    sanitize_message(&err.to_string(), MAX_LOGGED_ERROR_CHARS)
                );
                SentimentResult::fallback()
            }
        }
    }

    /// Runs one bounded classification attempt without applying the fallback.
    pub async fn try_enrich(&self, text: &str) -> Result<SentimentResult, ClassifierError> {
        if !self.classifier.is_configured() {
            return Err(ClassifierError::NotConfigured);
        }

        let result = tokio::time::timeout(self.timeout, self.classifier.classify(text))
            .await
            .map_err(|_| ClassifierError::TimedOut(self.timeout))??;

        // Third-party classifiers may skip validation; re-check the color.
        let color_hex = normalize_color_hex(&result.color_hex).ok_or_else(|| {
            ClassifierError::Malformed(format!("invalid color `{}`", result.color_hex))
        })?;
        Ok(SentimentResult {
            sentiment: result.sentiment,
            color_hex,
        })
    }
}
