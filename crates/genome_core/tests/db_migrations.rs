use genome_core::db::migrations::latest_version;
use genome_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "modification_events");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("genome.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "modification_events");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn modification_events_rejects_update_and_delete() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO modification_events (
            event_uuid, timestamp_ms, path, property, old_value, new_value
        ) VALUES ('00000000-0000-4000-8000-000000000001', 1, 'n0[0]', 'name', 'null', '\"A\"');",
        [],
    )
    .unwrap();

    let update = conn.execute("UPDATE modification_events SET property = 'role';", []);
    assert!(update.is_err());
    let delete = conn.execute("DELETE FROM modification_events;", []);
    assert!(delete.is_err());

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM modification_events;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn connections_run_with_full_synchronous_mode() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db(dir.path().join("sync.db")).unwrap();
    let synchronous: i64 = conn
        .query_row("PRAGMA synchronous;", [], |row| row.get(0))
        .unwrap();
    // FULL = 2
    assert_eq!(synchronous, 2);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
