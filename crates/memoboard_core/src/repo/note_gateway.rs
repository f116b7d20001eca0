//! Persistence gateway contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the async durable-storage contract the note store depends on.
//! - Keep SQL details inside the persistence boundary.
//! - Run blocking SQLite work off the async executor.
//!
//! # Invariants
//! - Write paths call `Note::validate()` before SQL mutations.
//! - Read paths never return an invalid note; rows failing validation are
//!   skipped with a warning and the remaining notes still load.
//! - `get_all_notes` returns rows ordered by `position ASC, timestamp DESC`.
//! - A freshly inserted note takes the lowest position (front of the board).

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::note::{Author, Note, NoteId, NoteValidationError, SwaySpeed};
use crate::model::sentiment::Sentiment;
use async_trait::async_trait;
use log::warn;
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    text,
    timestamp,
    author,
    sentiment,
    color,
    image,
    rotation,
    sway_speed
FROM notes";

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Persistence gateway failure.
#[derive(Debug)]
pub enum GatewayError {
    /// Record rejected before reaching storage.
    Validation(NoteValidationError),
    /// SQLite or bootstrap failure.
    Db(DbError),
    /// Target note does not exist in storage.
    NotFound(NoteId),
    /// Persisted row cannot be converted into a valid note.
    InvalidData(String),
    /// Connection schema lacks a required table.
    MissingRequiredTable(&'static str),
    /// Connection schema lacks a required column.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Blocking worker panicked or the connection lock was poisoned.
    Worker(String),
    /// Backend unavailable (non-SQLite gateways).
    Unavailable(String),
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found in storage: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted note data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "note gateway requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "note gateway requires column `{column}` in table `{table}`"
            ),
            Self::Worker(message) => write!(f, "storage worker failed: {message}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for GatewayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NoteValidationError> for GatewayError {
    fn from(value: NoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for GatewayError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for GatewayError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable storage of note records. No business logic lives here.
#[async_trait]
pub trait NoteGateway: Send + Sync {
    /// Loads every note in persisted display order.
    async fn get_all_notes(&self) -> GatewayResult<Vec<Note>>;
    /// Upserts one note by id. New ids land at the front of the order.
    async fn save_note(&self, note: &Note) -> GatewayResult<()>;
    /// Removes one note; `NotFound` when absent.
    async fn delete_note(&self, id: NoteId) -> GatewayResult<()>;
    /// Persists the full display order, first id first.
    async fn save_order(&self, ids: &[NoteId]) -> GatewayResult<()>;
}

/// SQLite-backed note gateway.
///
/// Cloning shares the same connection.
#[derive(Clone)]
pub struct SqliteNoteGateway {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteNoteGateway {
    /// Wraps a migrated connection after checking its schema.
    pub fn try_new(conn: Connection) -> GatewayResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> GatewayResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> GatewayResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    async fn run<T, F>(&self, op: &'static str, work: F) -> GatewayResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> GatewayResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| GatewayError::Worker(format!("{op}: connection lock poisoned")))?;
            work(&mut *guard)
        })
        .await
        .map_err(|err| GatewayError::Worker(format!("{op}: {err}")))?
    }
}

#[async_trait]
impl NoteGateway for SqliteNoteGateway {
    async fn get_all_notes(&self) -> GatewayResult<Vec<Note>> {
        self.run("get_all_notes", |conn| {
            let mut stmt = conn.prepare(&format!(
                "{NOTE_SELECT_SQL} ORDER BY position ASC, timestamp DESC, id ASC;"
            ))?;
            let mut rows = stmt.query([])?;
            let mut notes = Vec::new();
            let mut skipped = 0usize;
            while let Some(row) = rows.next()? {
                match parse_note_row(row) {
                    Ok(note) => notes.push(note),
                    Err(GatewayError::InvalidData(message)) => {
                        skipped += 1;
                        warn!(
                            "event=notes_load module=repo status=skip reason=invalid_row error={}",
                            message
                        );
                    }
                    Err(err) => return Err(err),
                }
            }
            if skipped > 0 {
                warn!(
                    "event=notes_load module=repo status=partial loaded={} skipped={}",
                    notes.len(),
                    skipped
                );
            }
            Ok(notes)
        })
        .await
    }

    async fn save_note(&self, note: &Note) -> GatewayResult<()> {
        note.validate()?;
        let note = note.clone();
        self.run("save_note", move |conn| {
            conn.execute(
                "INSERT INTO notes (
                    id,
                    text,
                    timestamp,
                    author,
                    sentiment,
                    color,
                    image,
                    rotation,
                    sway_speed,
                    position
                ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
                    (SELECT COALESCE(MIN(position), 1) - 1 FROM notes)
                )
                ON CONFLICT(id) DO UPDATE SET
                    text = excluded.text,
                    timestamp = excluded.timestamp,
                    author = excluded.author,
                    sentiment = excluded.sentiment,
                    color = excluded.color,
                    image = excluded.image,
                    rotation = excluded.rotation,
                    sway_speed = excluded.sway_speed;",
                params![
                    note.id.to_string(),
                    note.text.as_str(),
                    note.timestamp,
                    note.author.as_str(),
                    note.sentiment.map(Sentiment::as_str),
                    note.color.as_str(),
                    note.image.as_deref(),
                    note.rotation,
                    note.sway_speed.as_str(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_note(&self, id: NoteId) -> GatewayResult<()> {
        self.run("delete_note", move |conn| {
            let changed = conn.execute("DELETE FROM notes WHERE id = ?1;", [id.to_string()])?;
            if changed == 0 {
                return Err(GatewayError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn save_order(&self, ids: &[NoteId]) -> GatewayResult<()> {
        let ids = ids.to_vec();
        self.run("save_order", move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            for (position, id) in ids.iter().enumerate() {
                let changed = tx.execute(
                    "UPDATE notes SET position = ?2 WHERE id = ?1;",
                    params![id.to_string(), position as i64],
                )?;
                if changed == 0 {
                    // Dropping `tx` rolls back the partial reorder.
                    return Err(GatewayError::NotFound(*id));
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

fn parse_note_row(row: &Row<'_>) -> GatewayResult<Note> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| GatewayError::InvalidData(format!("invalid uuid `{id_text}` in notes.id")))?;

    let author_text: String = row.get("author")?;
    let author = Author::parse(&author_text).ok_or_else(|| {
        GatewayError::InvalidData(format!("invalid author `{author_text}` in notes.author"))
    })?;

    let sentiment = match row.get::<_, Option<String>>("sentiment")? {
        Some(value) => Some(Sentiment::parse(&value).ok_or_else(|| {
            GatewayError::InvalidData(format!("invalid sentiment `{value}` in notes.sentiment"))
        })?),
        None => None,
    };

    let sway_text: String = row.get("sway_speed")?;
    let sway_speed = SwaySpeed::parse(&sway_text).ok_or_else(|| {
        GatewayError::InvalidData(format!("invalid sway speed `{sway_text}` in notes.sway_speed"))
    })?;

    let note = Note {
        id,
        text: row.get("text")?,
        timestamp: row.get("timestamp")?,
        author,
        sentiment,
        color: row.get("color")?,
        image: row.get("image")?,
        rotation: row.get("rotation")?,
        sway_speed,
    };
    note.validate()
        .map_err(|err| GatewayError::InvalidData(format!("note {id}: {err}")))?;
    Ok(note)
}

fn ensure_connection_ready(conn: &Connection) -> GatewayResult<()> {
    if !table_exists(conn, "notes")? {
        return Err(GatewayError::MissingRequiredTable("notes"));
    }

    for column in [
        "id",
        "text",
        "timestamp",
        "author",
        "sentiment",
        "color",
        "image",
        "rotation",
        "sway_speed",
        "position",
    ] {
        if !table_has_column(conn, "notes", column)? {
            return Err(GatewayError::MissingRequiredColumn {
                table: "notes",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> GatewayResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> GatewayResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
