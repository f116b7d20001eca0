//! Core domain logic for the memory board.
//! This crate is the single source of truth for note invariants.

pub mod classifier;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use classifier::{ClassifierError, GeminiClassifier, SentimentClassifier};
pub use config::{ClassifierConfig, ConfigError, MemoboardConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{Author, Note, NoteId, NoteValidationError, SwaySpeed, MAX_TEXT_CHARS};
pub use model::sentiment::{Sentiment, SentimentResult, FALLBACK_COLOR_HEX};
pub use repo::note_gateway::{GatewayError, GatewayResult, NoteGateway, SqliteNoteGateway};
pub use service::cosmetics::{CosmeticGenerator, FixedCosmetics, RandomCosmetics};
pub use service::enrichment::Enricher;
pub use service::note_store::{InitReport, NoteStore, NoteStoreError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
