use nodestore_core::db::migrations::latest_version;
use nodestore_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert!(object_exists(&conn, "table", "nodes"));
    assert!(object_exists(&conn, "index", "idx_nodes_category"));
    assert!(object_exists(&conn, "index", "ux_nodes_single_dashboard"));
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nodestore.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO nodes (id, category) VALUES ('00000000-0000-4000-8000-000000000001', 'folder');",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let rows: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM nodes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
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
fn failed_migration_reports_version_and_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    // Version-1 store written before dashboards were unique.
    let conn = open_db(&path).unwrap();
    conn.execute_batch(
        "DROP INDEX ux_nodes_single_dashboard;
         INSERT INTO nodes (id, category) VALUES
            ('00000000-0000-4000-8000-000000000003', 'dashboard'),
            ('00000000-0000-4000-8000-000000000004', 'dashboard');
         PRAGMA user_version = 1;",
    )
    .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match &err {
        DbError::Migration { version, name, .. } => {
            assert_eq!(*version, 2);
            assert_eq!(*name, "0002_singleton_kinds");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(std::error::Error::source(&err).is_some());

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 1);
    assert!(!object_exists(&conn, "index", "ux_nodes_single_dashboard"));
}

#[test]
fn schema_defaults_match_record_defaults() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO nodes (id, category) VALUES ('00000000-0000-4000-8000-000000000002', 'analysis');",
        [],
    )
    .unwrap();

    let (name, number): (String, i64) = conn
        .query_row("SELECT name, number FROM nodes;", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(name, "");
    assert_eq!(number, 1);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn object_exists(conn: &Connection, object_type: &str, name: &str) -> bool {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [object_type, name],
            |row| row.get(0),
        )
        .unwrap();
    exists == 1
}
