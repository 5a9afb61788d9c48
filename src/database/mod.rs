//! Tabspace database layer.
//!
//! Provides SQLite connection management, schema migrations and the
//! [`TabStore`] persistence interface for spaces and tabs.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use tabspace::database::{Database, SqliteTabStore, TabStore};
//!
//! // Open a persistent database
//! let db = Arc::new(Database::open("tabspace.db").expect("failed to open database"));
//!
//! // Spaces and their tabs are read and written through a store
//! let store = SqliteTabStore::new(db);
//! let spaces = store.load_spaces().expect("failed to load spaces");
//! ```

pub mod connection;
pub mod migrations;
pub mod tab_store;

pub use connection::Database;
pub use tab_store::{MemoryTabStore, SqliteTabStore, TabStore};
