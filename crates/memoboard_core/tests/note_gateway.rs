use memoboard_core::db::open_db_in_memory;
use memoboard_core::{
    GatewayError, Note, NoteGateway, NoteValidationError, Sentiment, SentimentResult,
    SqliteNoteGateway, SwaySpeed,
};
use rusqlite::Connection;
use uuid::Uuid;

fn note(text: &str, timestamp: i64) -> Note {
    Note::new_user(
        text,
        None,
        SentimentResult {
            sentiment: Sentiment::Happy,
            color_hex: "#fde68a".to_string(),
        },
        timestamp,
        -1.5,
        SwaySpeed::Fast,
    )
}

fn texts(notes: &[Note]) -> Vec<&str> {
    notes.iter().map(|note| note.text.as_str()).collect()
}

#[tokio::test]
async fn save_and_load_roundtrip_preserves_every_field() {
    let gateway = SqliteNoteGateway::open_in_memory().expect("in-memory gateway should open");
    let mut saved = note("with image", 1_700_000_000_123);
    saved.image = Some("data:image/jpeg;base64,/9j/4AAQ".to_string());

    gateway.save_note(&saved).await.expect("note should save");
    let loaded = gateway.get_all_notes().await.expect("notes should load");

    assert_eq!(loaded, vec![saved]);
}

#[tokio::test]
async fn new_notes_land_at_the_front() {
    let gateway = SqliteNoteGateway::open_in_memory().expect("in-memory gateway should open");
    gateway.save_note(&note("first", 1)).await.expect("note should save");
    gateway.save_note(&note("second", 2)).await.expect("note should save");
    gateway.save_note(&note("third", 3)).await.expect("note should save");

    let loaded = gateway.get_all_notes().await.expect("notes should load");
    assert_eq!(texts(&loaded), vec!["third", "second", "first"]);
}

#[tokio::test]
async fn upsert_updates_content_without_moving_the_note() {
    let gateway = SqliteNoteGateway::open_in_memory().expect("in-memory gateway should open");
    let mut older = note("older", 1);
    gateway.save_note(&older).await.expect("note should save");
    gateway.save_note(&note("newer", 2)).await.expect("note should save");

    older.text = "older, edited".to_string();
    older.sentiment = Some(Sentiment::Sad);
    older.color = "#dbeafe".to_string();
    gateway.save_note(&older).await.expect("note should save");

    let loaded = gateway.get_all_notes().await.expect("notes should load");
    assert_eq!(texts(&loaded), vec!["newer", "older, edited"]);
    assert_eq!(loaded[1].sentiment, Some(Sentiment::Sad));
}

#[tokio::test]
async fn save_order_persists_explicit_positions() {
    let gateway = SqliteNoteGateway::open_in_memory().expect("in-memory gateway should open");
    let a = note("a", 1);
    let b = note("b", 2);
    let c = note("c", 3);
    for n in [&a, &b, &c] {
        gateway.save_note(n).await.expect("note should save");
    }

    gateway.save_order(&[a.id, c.id, b.id]).await.expect("order should save");
    let loaded = gateway.get_all_notes().await.expect("notes should load");
    assert_eq!(texts(&loaded), vec!["a", "c", "b"]);

    let d = note("d", 4);
    gateway.save_note(&d).await.expect("note should save");
    let loaded = gateway.get_all_notes().await.expect("notes should load");
    assert_eq!(texts(&loaded), vec!["d", "a", "c", "b"]);
}

#[tokio::test]
async fn save_order_with_unknown_id_rolls_back() {
    let gateway = SqliteNoteGateway::open_in_memory().expect("in-memory gateway should open");
    let a = note("a", 1);
    let b = note("b", 2);
    gateway.save_note(&a).await.expect("note should save");
    gateway.save_note(&b).await.expect("note should save");

    let stranger = Uuid::new_v4();
    let err = gateway.save_order(&[a.id, stranger]).await.expect_err("save order should fail");
    assert!(matches!(err, GatewayError::NotFound(id) if id == stranger));

    let loaded = gateway.get_all_notes().await.expect("notes should load");
    assert_eq!(texts(&loaded), vec!["b", "a"]);
}

#[tokio::test]
async fn delete_missing_note_is_not_found() {
    let gateway = SqliteNoteGateway::open_in_memory().expect("in-memory gateway should open");
    let kept = note("kept", 1);
    gateway.save_note(&kept).await.expect("note should save");

    let missing = Uuid::new_v4();
    let err = gateway.delete_note(missing).await.expect_err("delete should be rejected");
    assert!(matches!(err, GatewayError::NotFound(id) if id == missing));

    gateway.delete_note(kept.id).await.expect("note should be deleted");
    assert!(gateway.get_all_notes().await.expect("notes should load").is_empty());
}

#[tokio::test]
async fn save_rejects_invalid_records() {
    let gateway = SqliteNoteGateway::open_in_memory().expect("in-memory gateway should open");
    let mut bad = note("ok", 1);
    bad.color = "blue".to_string();

    let err = gateway.save_note(&bad).await.expect_err("save should be rejected");
    assert!(matches!(
        err,
        GatewayError::Validation(NoteValidationError::InvalidColor(_))
    ));
    assert!(gateway.get_all_notes().await.expect("notes should load").is_empty());
}

#[tokio::test]
async fn invalid_rows_are_skipped_and_valid_notes_still_load() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let valid = note("survivor", 5);
    conn.execute_batch(&format!(
        "INSERT INTO notes (id, text, timestamp, author, sentiment, color, rotation, sway_speed, position)
         VALUES
            ('not-a-uuid', 'hi', 0, 'user', 'happy', '#ffffff', 0.0, 'slow', 0),
            ('{}', 'named color', 1, 'user', 'love', 'pink', 0.0, 'slow', 1),
            ('{}', 'survivor', 5, 'user', 'happy', '#fde68a', -1.5, 'fast', 2);",
        Uuid::new_v4(),
        valid.id
    ))
    .expect("rows passing table checks should insert");
    let gateway = SqliteNoteGateway::try_new(conn).expect("migrated connection should be accepted");

    let loaded = gateway
        .get_all_notes()
        .await
        .expect("load should succeed despite invalid rows");
    assert_eq!(loaded, vec![valid]);
}

#[test]
fn unmigrated_connection_is_rejected() {
    let conn = Connection::open_in_memory().expect("raw connection should open");
    let err = SqliteNoteGateway::try_new(conn).err().expect("unmigrated connection should be rejected");
    assert!(matches!(err, GatewayError::MissingRequiredTable("notes")));
}

#[tokio::test]
async fn clones_share_one_database() {
    let gateway = SqliteNoteGateway::open_in_memory().expect("in-memory gateway should open");
    let clone = gateway.clone();
    clone.save_note(&note("shared", 1)).await.expect("note should save");

    let loaded = gateway.get_all_notes().await.expect("notes should load");
    assert_eq!(texts(&loaded), vec!["shared"]);
}
