//! SQLite connection management for tabspace.
//!
//! [`Database`] wraps a `rusqlite::Connection` and brings the schema up to
//! date every time a database is opened.

use rusqlite::{Connection, Transaction};
use std::path::Path;

use super::migrations;

/// Owns the SQLite connection holding spaces and tabs.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) a database file at `path` and runs pending migrations.
    ///
    /// # Errors
    /// Returns `rusqlite::Error` if the file cannot be opened or a migration fails.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Opens a throwaway in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, rusqlite::Error> {
        migrations::run_all(&conn)?;
        Ok(Self { conn })
    }

    /// Returns the underlying connection for queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Runs `f` inside a transaction that commits when `f` succeeds and rolls
    /// back when it fails.
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<rusqlite::Error>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}
