use async_trait::async_trait;
use memoboard_core::{
    ClassifierError, Enricher, FixedCosmetics, GatewayError, GatewayResult, Note, NoteGateway,
    NoteId, NoteStore, SentimentClassifier, SentimentResult, SwaySpeed,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TEST_TIMEOUT: Duration = Duration::from_millis(200);

/// What a stub classifier does when called.
#[derive(Clone)]
pub enum Script {
    Answer(SentimentResult),
    Fail,
    Hang,
}

/// Scripted classifier that counts calls.
pub struct StubClassifier {
    configured: bool,
    script: Mutex<Script>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl StubClassifier {
    pub fn answering(sentiment: memoboard_core::Sentiment, color_hex: &str) -> Arc<Self> {
        Self::scripted(Script::Answer(SentimentResult {
            sentiment,
            color_hex: color_hex.to_string(),
        }))
    }

    pub fn scripted(script: Script) -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            configured: false,
            script: Mutex::new(Script::Fail),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock().expect("lock should not be poisoned") = script;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SentimentClassifier for StubClassifier {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn classify(&self, _text: &str) -> Result<SentimentResult, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self.script.lock().expect("lock should not be poisoned").clone();
        match script {
            Script::Answer(result) => Ok(result),
            Script::Fail => Err(ClassifierError::Status {
                code: 503,
                body: "unavailable".to_string(),
            }),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(ClassifierError::Malformed("unreachable".to_string()))
            }
        }
    }
}

/// In-memory gateway with switchable failures.
#[derive(Default)]
pub struct MemoryGateway {
    notes: Mutex<Vec<Note>>,
    fail_loads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

#[allow(dead_code)]
impl MemoryGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_notes(notes: Vec<Note>) -> Arc<Self> {
        let gateway = Self::default();
        *gateway.notes.lock().expect("lock should not be poisoned") = notes;
        Arc::new(gateway)
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Vec<Note> {
        self.notes.lock().expect("lock should not be poisoned").clone()
    }

    pub fn remove_silently(&self, id: NoteId) {
        self.notes.lock().expect("lock should not be poisoned").retain(|note| note.id != id);
    }

    /// Number of durable operations attempted (successful or not).
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_write(&self) -> GatewayResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("disk full".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NoteGateway for MemoryGateway {
    async fn get_all_notes(&self) -> GatewayResult<Vec<Note>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("store locked".to_string()));
        }
        Ok(self.stored())
    }

    async fn save_note(&self, note: &Note) -> GatewayResult<()> {
        self.check_write()?;
        let mut notes = self.notes.lock().expect("lock should not be poisoned");
        match notes.iter_mut().find(|existing| existing.id == note.id) {
            Some(existing) => *existing = note.clone(),
            None => notes.insert(0, note.clone()),
        }
        Ok(())
    }

    async fn delete_note(&self, id: NoteId) -> GatewayResult<()> {
        self.check_write()?;
        let mut notes = self.notes.lock().expect("lock should not be poisoned");
        let before = notes.len();
        notes.retain(|note| note.id != id);
        if notes.len() == before {
            return Err(GatewayError::NotFound(id));
        }
        Ok(())
    }

    async fn save_order(&self, ids: &[NoteId]) -> GatewayResult<()> {
        self.check_write()?;
        let mut notes = self.notes.lock().expect("lock should not be poisoned");
        let mut reordered = Vec::with_capacity(ids.len());
        for id in ids {
            let index = notes
                .iter()
                .position(|note| note.id == *id)
                .ok_or(GatewayError::NotFound(*id))?;
            reordered.push(notes.remove(index));
        }
        reordered.append(&mut notes);
        *notes = reordered;
        Ok(())
    }
}

#[allow(dead_code)]
pub fn fixed_cosmetics() -> Arc<FixedCosmetics> {
    Arc::new(FixedCosmetics {
        rotation: 1.25,
        sway_speed: SwaySpeed::Medium,
    })
}

#[allow(dead_code)]
pub fn store_with(
    gateway: Arc<dyn NoteGateway>,
    classifier: Arc<dyn SentimentClassifier>,
) -> NoteStore {
    NoteStore::new(gateway, Enricher::new(classifier, TEST_TIMEOUT)).with_cosmetics(fixed_cosmetics())
}
