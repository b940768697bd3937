use easel_core::db::migrations::latest_version;
use easel_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_column_exists(&conn, "slice_snapshots", "payload");
    assert_column_exists(&conn, "slice_snapshots", "schema_version");
}

#[test]
fn reopening_file_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("easel.db");

    drop(open_db(&path).unwrap());
    let conn = open_db(&path).unwrap();

    assert_eq!(schema_version(&conn), latest_version());
}

#[test]
fn unversioned_database_is_adopted_and_keeps_foreign_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE host_prefs (key TEXT PRIMARY KEY, value TEXT);
        INSERT INTO host_prefs (key, value) VALUES ('theme', 'dark');",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    assert_column_exists(&conn, "slice_snapshots", "payload");
    let theme: String = conn
        .query_row("SELECT value FROM host_prefs WHERE key = 'theme';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(theme, "dark");
}

#[test]
fn failed_migration_is_rolled_back_and_names_its_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clash.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE slice_snapshots (legacy TEXT);")
        .unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::Migration { version, .. } => assert_eq!(version, 1),
        other => panic!("unexpected error: {other}"),
    }

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
    assert_column_exists(&conn, "slice_snapshots", "legacy");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_column_exists(conn: &Connection, table: &str, column: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM pragma_table_info(?1) WHERE name = ?2);",
            [table, column],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "column {table}.{column} does not exist");
}
