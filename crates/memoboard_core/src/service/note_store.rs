//! Note lifecycle and ordering store.
//!
//! # Responsibility
//! - Own the canonical, user-ordered note collection.
//! - Validate intents, enrich text, persist through the gateway, then apply.
//! - Publish a fresh snapshot after every successful change.
//!
//! # Invariants
//! - Note ids are unique within the collection.
//! - Every mutation holds the state lock from validation to publication, so
//!   concurrent intents are applied one at a time.
//! - Memory changes only after the gateway call settles successfully; a
//!   failed write leaves the collection exactly as it was.
//! - New notes are prepended (newest first); edits keep position.

use crate::classifier::GeminiClassifier;
use crate::config::MemoboardConfig;
use crate::model::note::{
    validate_image, validate_note_text, Note, NoteId, NoteValidationError,
};
use crate::model::sentiment::SentimentResult;
use crate::repo::note_gateway::{GatewayError, NoteGateway, SqliteNoteGateway};
use crate::service::cosmetics::{CosmeticGenerator, RandomCosmetics};
use crate::service::enrichment::Enricher;
use log::{error, info, warn};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

/// Failure of a note store intent.
#[derive(Debug)]
pub enum NoteStoreError {
    /// Input rejected before any side effect.
    Validation(NoteValidationError),
    /// Target note is not in the collection.
    NoteNotFound(NoteId),
    /// Gateway write/delete failed; the collection is unchanged.
    Persistence(GatewayError),
}

impl Display for NoteStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid note input: {err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::Persistence(err) => write!(f, "note persistence failed: {err}"),
        }
    }
}

impl Error for NoteStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NoteNotFound(_) => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<NoteValidationError> for NoteStoreError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<GatewayError> for NoteStoreError {
    fn from(value: GatewayError) -> Self {
        Self::Persistence(value)
    }
}

/// Outcome of loading persisted notes.
#[derive(Debug)]
pub struct InitReport {
    /// Loaded collection; empty when loading failed.
    pub notes: Vec<Note>,
    /// Non-fatal load failure, if any.
    pub load_error: Option<GatewayError>,
}

/// Single authority over the ordered note collection.
pub struct NoteStore {
    gateway: Arc<dyn NoteGateway>,
    enricher: Enricher,
    cosmetics: Arc<dyn CosmeticGenerator>,
    notes: Mutex<Vec<Note>>,
    snapshots: watch::Sender<Vec<Note>>,
}

impl NoteStore {
    /// Creates an empty store. Call [`NoteStore::initialize`] to load notes.
    pub fn new(gateway: Arc<dyn NoteGateway>, enricher: Enricher) -> Self {
        let (snapshots, _) = watch::channel(Vec::new());
        Self {
            gateway,
            enricher,
            cosmetics: Arc::new(RandomCosmetics),
            notes: Mutex::new(Vec::new()),
            snapshots,
        }
    }

    /// Builds a store over the configured SQLite file and Gemini classifier.
    pub fn from_config(config: &MemoboardConfig) -> Result<Self, GatewayError> {
        let gateway = SqliteNoteGateway::open(&config.db_path)?;
        let classifier = GeminiClassifier::new(&config.classifier);
        Ok(Self::new(
            Arc::new(gateway),
            Enricher::new(Arc::new(classifier), config.classifier.timeout),
        ))
    }

    /// Replaces the cosmetic value source (deterministic tests).
    pub fn with_cosmetics(mut self, cosmetics: Arc<dyn CosmeticGenerator>) -> Self {
        self.cosmetics = cosmetics;
        self
    }

    /// Loads all persisted notes, preserving persisted order.
    ///
    /// A gateway failure yields an empty collection and a `load_error`; it is
    /// never fatal and never replaced by sample content.
    pub async fn initialize(&self) -> InitReport {
        let mut notes = self.notes.lock().await;
        match self.gateway.get_all_notes().await {
            Ok(loaded) => {
                *notes = dedupe_by_id(loaded);
                info!(
                    "event=store_init module=store status=ok note_count={}",
                    notes.len()
                );
                self.publish(&notes);
                InitReport {
                    notes: notes.clone(),
                    load_error: None,
                }
            }
            Err(err) => {
                error!(
                    "event=store_init module=store status=error error_code=load_failed error={}",
                    err
                );
                notes.clear();
                self.publish(&notes);
                InitReport {
                    notes: Vec::new(),
                    load_error: Some(err),
                }
            }
        }
    }

    /// Creates a note, enriches it, persists it and prepends it.
    ///
    /// # Errors
    /// - `Validation` for empty/oversized text or a non data-URI image.
    /// - `Persistence` when the gateway write fails.
    pub async fn add_note(
        &self,
        text: &str,
        image: Option<String>,
    ) -> Result<Vec<Note>, NoteStoreError> {
        let text = validate_note_text(text)?;
        validate_image(image.as_deref())?;

        let mut notes = self.notes.lock().await;
        let enrichment = self.enricher.enrich(&text).await;
        let mut note = Note::new_user(
            text,
            image,
            enrichment,
            now_epoch_ms(),
            self.cosmetics.rotation(),
            self.cosmetics.sway_speed(),
        );
        while notes.iter().any(|existing| existing.id == note.id) {
            note.id = Uuid::new_v4();
        }

        if let Err(err) = self.gateway.save_note(&note).await {
            error!(
                "event=note_add module=store status=error error_code=persist_failed note_id={} error={}",
                note.id, err
            );
            return Err(err.into());
        }

        info!(
            "event=note_add module=store status=ok note_id={} has_image={}",
            note.id,
            note.image.is_some()
        );
        notes.insert(0, note);
        self.publish(&notes);
        Ok(notes.clone())
    }

    /// Replaces text, image and enrichment of one note in place.
    ///
    /// `image = None` removes any existing image. Identity, timestamp and
    /// cosmetics are preserved. When the trimmed text equals the stored
    /// text, the stored sentiment and color are reused without a
    /// classifier call.
    pub async fn edit_note(
        &self,
        id: NoteId,
        text: &str,
        image: Option<String>,
    ) -> Result<Vec<Note>, NoteStoreError> {
        let text = validate_note_text(text)?;
        validate_image(image.as_deref())?;

        let mut notes = self.notes.lock().await;
        let index = notes
            .iter()
            .position(|note| note.id == id)
            .ok_or(NoteStoreError::NoteNotFound(id))?;

        let current = &notes[index];
        let enrichment = match (current.text == text, current.sentiment) {
            (true, Some(sentiment)) => SentimentResult {
                sentiment,
                color_hex: current.color.clone(),
            },
            _ => self.enricher.enrich(&text).await,
        };

        let mut updated = current.clone();
        updated.apply_edit(text, image, enrichment);

        if let Err(err) = self.gateway.save_note(&updated).await {
            error!(
                "event=note_edit module=store status=error error_code=persist_failed note_id={} error={}",
                id, err
            );
            return Err(err.into());
        }

        info!(
            "event=note_edit module=store status=ok note_id={} has_image={}",
            id,
            updated.image.is_some()
        );
        notes[index] = updated;
        self.publish(&notes);
        Ok(notes.clone())
    }

    /// Deletes one note from storage, then from the collection.
    ///
    /// `skip_confirm` records that the caller bypassed interactive
    /// confirmation (drag-to-trash); the store itself never prompts.
    /// Unknown ids fail with `NoteNotFound`.
    pub async fn delete_note(
        &self,
        id: NoteId,
        skip_confirm: bool,
    ) -> Result<Vec<Note>, NoteStoreError> {
        let mut notes = self.notes.lock().await;
        let index = notes
            .iter()
            .position(|note| note.id == id)
            .ok_or(NoteStoreError::NoteNotFound(id))?;

        match self.gateway.delete_note(id).await {
            Ok(()) => {}
            Err(GatewayError::NotFound(_)) => {
                // Already gone from storage: dropping it here restores convergence.
                warn!(
                    "event=note_delete module=store status=drift note_id={} reason=missing_in_storage",
                    id
                );
            }
            Err(err) => {
                error!(
                    "event=note_delete module=store status=error error_code=persist_failed note_id={} error={}",
                    id, err
                );
                return Err(err.into());
            }
        }

        info!(
            "event=note_delete module=store status=ok note_id={} skip_confirm={}",
            id, skip_confirm
        );
        notes.remove(index);
        self.publish(&notes);
        Ok(notes.clone())
    }

    /// Replaces the display order with `ids`, which must be a permutation of
    /// the current ids. The order is persisted before it is applied.
    pub async fn reorder(&self, ids: &[NoteId]) -> Result<Vec<Note>, NoteStoreError> {
        let mut notes = self.notes.lock().await;
        validate_permutation(&notes, ids)?;

        if let Err(err) = self.gateway.save_order(ids).await {
            error!(
                "event=note_reorder module=store status=error error_code=persist_failed note_count={} error={}",
                ids.len(),
                err
            );
            return Err(err.into());
        }

        let mut by_id = notes
            .drain(..)
            .map(|note| (note.id, note))
            .collect::<HashMap<_, _>>();
        *notes = ids.iter().filter_map(|id| by_id.remove(id)).collect();

        info!(
            "event=note_reorder module=store status=ok note_count={}",
            notes.len()
        );
        self.publish(&notes);
        Ok(notes.clone())
    }

    /// Returns a snapshot of the ordered collection.
    pub async fn notes(&self) -> Vec<Note> {
        self.notes.lock().await.clone()
    }

    /// Returns one note by id.
    pub async fn get_note(&self, id: NoteId) -> Option<Note> {
        self.notes
            .lock()
            .await
            .iter()
            .find(|note| note.id == id)
            .cloned()
    }

    /// Subscribes to published snapshots; the current one is seen first.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Note>> {
        self.snapshots.subscribe()
    }

    fn publish(&self, notes: &[Note]) {
        self.snapshots.send_replace(notes.to_vec());
    }
}

fn validate_permutation(notes: &[Note], ids: &[NoteId]) -> Result<(), NoteValidationError> {
    if ids.len() != notes.len() {
        return Err(NoteValidationError::ReorderLengthMismatch {
            expected: notes.len(),
            actual: ids.len(),
        });
    }

    let known = notes.iter().map(|note| note.id).collect::<HashSet<_>>();
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !known.contains(id) {
            return Err(NoteValidationError::ReorderUnknownId(*id));
        }
        if !seen.insert(*id) {
            return Err(NoteValidationError::ReorderDuplicateId(*id));
        }
    }
    Ok(())
}

fn dedupe_by_id(loaded: Vec<Note>) -> Vec<Note> {
    let mut seen = HashSet::with_capacity(loaded.len());
    loaded
        .into_iter()
        .filter(|note| {
            let fresh = seen.insert(note.id);
            if !fresh {
                warn!(
                    "event=store_init module=store status=skip reason=duplicate_id note_id={}",
                    note.id
                );
            }
            fresh
        })
        .collect()
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}
