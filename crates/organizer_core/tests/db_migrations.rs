use organizer_core::db::migrations::latest_version;
use organizer_core::db::{open_db, open_db_in_memory, DbError};
use organizer_core::store::keys;
use organizer_core::{KeyValueStore, SqliteKvStore};
use rusqlite::Connection;

#[test]
fn in_memory_store_has_kv_table_at_latest_version() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_eq!(count_objects(&conn, "table", "kv_entries"), 1);
    assert_eq!(count_objects(&conn, "index", "idx_kv_entries_updated_at"), 1);
}

#[test]
fn file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("organizer.sqlite3");

    let conn = open_db(&path).unwrap();
    SqliteKvStore::new(&conn)
        .set_raw(keys::APP_SETTINGS, r#"{"theme":"dark"}"#)
        .unwrap();
    drop(conn);

    let reopened = open_db(&path).unwrap();
    assert_eq!(schema_version(&reopened), latest_version());
    let stored = SqliteKvStore::new(&reopened)
        .get_raw(keys::APP_SETTINGS)
        .unwrap();
    assert_eq!(stored.as_deref(), Some(r#"{"theme":"dark"}"#));
}

#[test]
fn newer_schema_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 42;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 42);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn data_folder_blocked_by_a_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("data");
    std::fs::write(&blocker, "not a folder").unwrap();

    match open_db(blocker.join("organizer.sqlite3")).unwrap_err() {
        DbError::DataDir { path, .. } => assert_eq!(path, blocker),
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn count_objects(conn: &Connection, kind: &str, name: &str) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = ?1 AND name = ?2;",
        [kind, name],
        |row| row.get(0),
    )
    .unwrap()
}
