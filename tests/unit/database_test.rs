//! Unit tests for the Tabspace database layer (connection + migrations).

use tabspace::database::migrations::{self, CURRENT_SCHEMA_VERSION};
use tabspace::database::Database;
use tabspace::types::errors::StoreError;

fn column_names(db: &Database, table: &str) -> Vec<String> {
    let conn = db.connection();
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", table))
        .unwrap();
    stmt.query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .filter_map(|r| r.ok())
        .collect()
}

#[test]
fn test_open_in_memory_succeeds() {
    let db = Database::open_in_memory();
    assert!(db.is_ok(), "open_in_memory should succeed");
}

#[test]
fn test_migrations_create_tables() {
    let db = Database::open_in_memory().unwrap();
    let conn = db.connection();

    for table in ["spaces", "tabs", "schema_version"] {
        let exists: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
                [table],
                |row| row.get(0),
            )
            .unwrap_or(false);
        assert!(exists, "Table '{}' should exist after migrations", table);
    }
}

#[test]
fn test_schema_version_is_current() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(migrations::get_schema_version(db.connection()), CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_migrations_are_idempotent() {
    let db = Database::open_in_memory().unwrap();
    migrations::run_all(db.connection()).unwrap();
    migrations::run_all(db.connection()).unwrap();

    let count: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, CURRENT_SCHEMA_VERSION as i64);
}

#[test]
fn test_spaces_have_pinned_tabs_visible_column() {
    let db = Database::open_in_memory().unwrap();
    let columns = column_names(&db, "spaces");
    assert!(columns.contains(&"pinned_tabs_visible".to_string()));
}

#[test]
fn test_tab_columns() {
    let db = Database::open_in_memory().unwrap();
    let columns = column_names(&db, "tabs");
    for expected in ["id", "space_id", "title", "custom_title", "favicon", "url", "position", "pin_state", "content_type"] {
        assert!(columns.contains(&expected.to_string()), "missing column {}", expected);
    }
}

#[test]
fn test_deleting_space_cascades_to_tabs() {
    let db = Database::open_in_memory().unwrap();
    let conn = db.connection();
    conn.execute(
        "INSERT INTO spaces (id, name, system_image) VALUES ('s1', 'Work', 'briefcase')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO tabs (id, space_id, title, url) VALUES ('t1', 's1', 'Docs', 'https://docs.rs')",
        [],
    )
    .unwrap();

    conn.execute("DELETE FROM spaces WHERE id = 's1'", []).unwrap();
    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM tabs", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn test_transaction_rolls_back_on_error() {
    let db = Database::open_in_memory().unwrap();
    let result: Result<(), StoreError> = db.transaction(|tx| {
        tx.execute(
            "INSERT INTO spaces (id, name, system_image) VALUES ('s1', 'Work', 'briefcase')",
            [],
        )?;
        Err(StoreError::CorruptRow("abort".to_string()))
    });
    assert!(result.is_err());

    let count: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM spaces", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_open_file_database_persists() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("tabspace.db");
    {
        let db = Database::open(&path).unwrap();
        db.connection()
            .execute(
                "INSERT INTO spaces (id, name, system_image) VALUES ('s1', 'Work', 'briefcase')",
                [],
            )
            .unwrap();
    }
    let db = Database::open(&path).unwrap();
    let name: String = db
        .connection()
        .query_row("SELECT name FROM spaces WHERE id = 's1'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, "Work");
}
