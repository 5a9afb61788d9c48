//! Schema migrations for the tabspace SQLite database.
//!
//! A `schema_version` table records which migrations have been applied; each
//! migration runs exactly once.

use rusqlite::Connection;

/// Current schema version. Bump this when adding a new migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Returns the current schema version from the database (0 if table doesn't exist).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .unwrap_or(0)
}

/// Runs all pending schema migrations. Safe to call on every startup.
///
/// # Errors
/// Returns `rusqlite::Error` if any SQL statement fails.
pub fn run_all(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         CREATE TABLE IF NOT EXISTS schema_version (
             version INTEGER PRIMARY KEY,
             applied_at INTEGER NOT NULL,
             description TEXT NOT NULL
         );",
    )?;

    let current = get_schema_version(conn);

    if current < 1 {
        migration_v1(conn)?;
        record_version(conn, 1, "Spaces and tabs")?;
    }

    if current < 2 {
        migration_v2(conn)?;
        record_version(conn, 2, "Add pinned_tabs_visible to spaces")?;
    }

    Ok(())
}

fn record_version(conn: &Connection, version: i32, description: &str) -> Result<(), rusqlite::Error> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at, description) VALUES (?1, ?2, ?3)",
        rusqlite::params![version, now, description],
    )?;
    Ok(())
}

/// V1: spaces and their tabs. Deleting a space cascades to its tabs.
fn migration_v1(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS spaces (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            system_image TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            colors TEXT NOT NULL DEFAULT '[]',
            grain_opacity REAL NOT NULL DEFAULT 0.0,
            color_opacity REAL NOT NULL DEFAULT 1.0,
            color_scheme TEXT NOT NULL DEFAULT 'light'
        );

        CREATE TABLE IF NOT EXISTS tabs (
            id TEXT PRIMARY KEY,
            space_id TEXT NOT NULL,
            title TEXT NOT NULL,
            custom_title TEXT,
            favicon BLOB,
            url TEXT NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            pin_state TEXT NOT NULL DEFAULT 'normal',
            content_type TEXT NOT NULL DEFAULT 'web',
            FOREIGN KEY (space_id) REFERENCES spaces(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_tabs_space ON tabs(space_id, position);
        ",
    )
}

/// V2: sidebar visibility of the pinned section, per space.
fn migration_v2(conn: &Connection) -> Result<(), rusqlite::Error> {
    if conn.prepare("SELECT pinned_tabs_visible FROM spaces LIMIT 0").is_err() {
        conn.execute_batch(
            "ALTER TABLE spaces ADD COLUMN pinned_tabs_visible INTEGER NOT NULL DEFAULT 1;",
        )?;
    }
    Ok(())
}
