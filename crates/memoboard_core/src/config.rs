//! Runtime configuration resolved from the process environment.
//!
//! # Responsibility
//! - Resolve database location, logging and classifier settings.
//! - Start file logging from the resolved settings.
//! - Reject malformed numeric settings instead of silently defaulting.
//!
//! # Invariants
//! - A blank API key is treated as "not configured".
//! - The classifier timeout is always greater than zero.

use crate::logging::{default_log_level, init_logging, LoggingError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "MEMOBOARD_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "MEMOBOARD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "MEMOBOARD_LOG_DIR";
pub const ENV_GEMINI_API_KEY: &str = "MEMOBOARD_GEMINI_API_KEY";
pub const ENV_GEMINI_MODEL: &str = "MEMOBOARD_GEMINI_MODEL";
pub const ENV_GEMINI_ENDPOINT: &str = "MEMOBOARD_GEMINI_ENDPOINT";
pub const ENV_CLASSIFIER_TIMEOUT_MS: &str = "MEMOBOARD_CLASSIFIER_TIMEOUT_MS";

/// Generic key names honoured when the namespaced key is unset.
const FALLBACK_API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

const DEFAULT_DB_FILE_NAME: &str = "memoboard.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "memoboard-logs";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration error for environment-provided settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Value is present but cannot be parsed.
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {}

/// Sentiment classifier settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// `None` disables network classification entirely.
    pub api_key: Option<String>,
    pub model: String,
    /// Base URL without trailing path.
    pub endpoint: String,
    /// Upper bound for one classification call.
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            timeout: DEFAULT_CLASSIFIER_TIMEOUT,
        }
    }
}

/// Top-level configuration for an embedding application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoboardConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
    pub classifier: ClassifierConfig,
}

impl MemoboardConfig {
    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = non_blank(ENV_DB_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME));

        let log_level =
            non_blank(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string());
        let log_dir = non_blank(ENV_LOG_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME));

        let api_key = std::iter::once(ENV_GEMINI_API_KEY)
            .chain(FALLBACK_API_KEY_VARS.iter().copied())
            .find_map(|key| non_blank(key));

        let defaults = ClassifierConfig::default();
        let timeout = match non_blank(ENV_CLASSIFIER_TIMEOUT_MS) {
            Some(raw) => parse_timeout_ms(&raw)?,
            None => defaults.timeout,
        };

        Ok(Self {
            db_path,
            log_level,
            log_dir,
            classifier: ClassifierConfig {
                api_key,
                model: non_blank(ENV_GEMINI_MODEL).unwrap_or(defaults.model),
                endpoint: non_blank(ENV_GEMINI_ENDPOINT).unwrap_or(defaults.endpoint),
                timeout,
            },
        })
    }

    /// Starts core file logging with the resolved level and directory.
    ///
    /// Repeated calls with the same settings are no-ops; see
    /// [`crate::logging::init_logging`] for the failure cases.
    pub fn init_logging(&self) -> Result<(), LoggingError> {
        init_logging(&self.log_level, &self.log_dir.to_string_lossy())
    }
}

fn parse_timeout_ms(raw: &str) -> Result<Duration, ConfigError> {
    match raw.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidValue {
            key: ENV_CLASSIFIER_TIMEOUT_MS,
            value: raw.to_string(),
        }),
    }
}
