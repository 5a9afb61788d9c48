//! Persistence store for spaces and tabs.
//!
//! [`TabStore`] is the narrow interface the tab model persists through.
//! [`SqliteTabStore`] is the on-disk implementation; [`MemoryTabStore`] keeps
//! everything in memory (private windows, tests, the demo binary).

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::connection::Database;
use crate::types::errors::StoreError;
use crate::types::space::Space;
use crate::types::tab::{SpaceId, Tab, TabContentType, TabId, TabPinState};

/// Operations the tab model needs from a persistence backend.
pub trait TabStore {
    fn load_spaces(&self) -> Result<Vec<Space>, StoreError>;
    fn insert_tab(&mut self, tab: &Tab) -> Result<(), StoreError>;
    fn delete_tab(&mut self, tab_id: TabId) -> Result<(), StoreError>;
    /// Writes the space and the current state of all of its tabs. Rows of tabs
    /// that are no longer in the space are removed.
    fn save_space(&mut self, space: &Space) -> Result<(), StoreError>;
    fn delete_space(&mut self, space_id: SpaceId) -> Result<(), StoreError>;
}

// === SQLite ===

/// `TabStore` backed by the `spaces` and `tabs` tables.
pub struct SqliteTabStore {
    db: Arc<Database>,
}

impl SqliteTabStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn upsert_tab(conn: &Connection, tab: &Tab) -> Result<(), rusqlite::Error> {
        conn.execute(
            "INSERT INTO tabs (id, space_id, title, custom_title, favicon, url, position, pin_state, content_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                space_id = excluded.space_id,
                title = excluded.title,
                custom_title = excluded.custom_title,
                favicon = excluded.favicon,
                url = excluded.url,
                position = excluded.position,
                pin_state = excluded.pin_state,
                content_type = excluded.content_type",
            params![
                tab.id.to_string(),
                tab.space_id.to_string(),
                tab.title,
                tab.custom_title,
                tab.favicon,
                tab.url,
                tab.order as i64,
                tab.pin_state.as_str(),
                tab.content_type.as_str(),
            ],
        )?;
        Ok(())
    }

    fn parse_id(value: &str) -> Result<Uuid, StoreError> {
        Uuid::parse_str(value).map_err(|e| StoreError::CorruptRow(format!("bad id '{}': {}", value, e)))
    }

    fn load_tabs(&self, space: &mut Space) -> Result<(), StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(
            "SELECT id, title, custom_title, favicon, url, position, pin_state, content_type
             FROM tabs WHERE space_id = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![space.id.to_string()], StoredTabRow::from_row)?;

        let mut tabs = Vec::new();
        for row in rows {
            let row = row?;
            tabs.push(row.into_tab(space.id)?);
        }
        space.set_tabs(tabs);
        Ok(())
    }
}

/// Raw column values of a `tabs` row.
struct StoredTabRow {
    id: String,
    title: String,
    custom_title: Option<String>,
    favicon: Option<Vec<u8>>,
    url: String,
    position: i64,
    pin_state: String,
    content_type: String,
}

impl StoredTabRow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            custom_title: row.get(2)?,
            favicon: row.get(3)?,
            url: row.get(4)?,
            position: row.get(5)?,
            pin_state: row.get(6)?,
            content_type: row.get(7)?,
        })
    }

    fn into_tab(self, space_id: SpaceId) -> Result<Tab, StoreError> {
        let id = SqliteTabStore::parse_id(&self.id)?;
        let pin_state = TabPinState::parse(&self.pin_state)
            .ok_or_else(|| StoreError::CorruptRow(format!("unknown pin state '{}'", self.pin_state)))?;
        let content_type = TabContentType::parse(&self.content_type).ok_or_else(|| {
            StoreError::CorruptRow(format!("unknown content type '{}'", self.content_type))
        })?;

        let mut tab = Tab::create(
            &self.title,
            self.favicon,
            &self.url,
            self.position.max(0) as usize,
            space_id,
            content_type,
            Some(id),
        );
        tab.pin_state = pin_state;
        tab.custom_title = self.custom_title;
        Ok(tab)
    }
}

impl TabStore for SqliteTabStore {
    fn load_spaces(&self) -> Result<Vec<Space>, StoreError> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(
            "SELECT id, name, system_image, position, colors, grain_opacity, color_opacity, color_scheme, pinned_tabs_visible
             FROM spaces ORDER BY position",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, bool>(8)?,
            ))
        })?;

        let mut spaces = Vec::new();
        for row in rows {
            let (id, name, system_image, position, colors, grain, color_opacity, scheme, pinned_visible) = row?;
            let colors: Vec<String> = serde_json::from_str(&colors)
                .map_err(|e| StoreError::SerializationError(e.to_string()))?;

            let mut space = Space::new(&name, &system_image, position.max(0) as usize, colors, &scheme);
            space.id = Self::parse_id(&id)?;
            space.grain_opacity = grain;
            space.color_opacity = color_opacity;
            space.pinned_tabs_visible = pinned_visible;
            self.load_tabs(&mut space)?;
            spaces.push(space);
        }
        Ok(spaces)
    }

    fn insert_tab(&mut self, tab: &Tab) -> Result<(), StoreError> {
        Self::upsert_tab(self.db.connection(), tab)?;
        Ok(())
    }

    fn delete_tab(&mut self, tab_id: TabId) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute("DELETE FROM tabs WHERE id = ?1", params![tab_id.to_string()])?;
        Ok(())
    }

    fn save_space(&mut self, space: &Space) -> Result<(), StoreError> {
        let colors = serde_json::to_string(&space.colors)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        self.db.transaction(|tx| -> Result<(), StoreError> {
            tx.execute(
                "INSERT INTO spaces (id, name, system_image, position, colors, grain_opacity, color_opacity, color_scheme, pinned_tabs_visible)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    system_image = excluded.system_image,
                    position = excluded.position,
                    colors = excluded.colors,
                    grain_opacity = excluded.grain_opacity,
                    color_opacity = excluded.color_opacity,
                    color_scheme = excluded.color_scheme,
                    pinned_tabs_visible = excluded.pinned_tabs_visible",
                params![
                    space.id.to_string(),
                    space.name,
                    space.system_image,
                    space.order as i64,
                    colors,
                    space.grain_opacity,
                    space.color_opacity,
                    space.color_scheme,
                    space.pinned_tabs_visible,
                ],
            )?;

            for tab in space.tabs() {
                Self::upsert_tab(tx, tab)?;
            }

            let live: HashSet<String> = space.tabs().iter().map(|t| t.id.to_string()).collect();
            let stored: Vec<String> = {
                let mut stmt = tx.prepare("SELECT id FROM tabs WHERE space_id = ?1")?;
                let ids = stmt.query_map(params![space.id.to_string()], |row| row.get(0))?;
                ids.collect::<Result<_, _>>()?
            };
            for id in stored.iter().filter(|id| !live.contains(*id)) {
                tx.execute("DELETE FROM tabs WHERE id = ?1", params![id])?;
            }
            Ok(())
        })
    }

    fn delete_space(&mut self, space_id: SpaceId) -> Result<(), StoreError> {
        self.db
            .connection()
            .execute("DELETE FROM spaces WHERE id = ?1", params![space_id.to_string()])?;
        Ok(())
    }
}

// === In memory ===

/// `TabStore` that keeps persisted copies of spaces in memory.
#[derive(Debug, Default)]
pub struct MemoryTabStore {
    spaces: BTreeMap<SpaceId, Space>,
    save_count: usize,
}

impl MemoryTabStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save_space` calls so far.
    pub fn save_count(&self) -> usize {
        self.save_count
    }

    /// The stored copy of a space, as last persisted.
    pub fn stored_space(&self, space_id: SpaceId) -> Option<&Space> {
        self.spaces.get(&space_id)
    }
}

impl TabStore for MemoryTabStore {
    fn load_spaces(&self) -> Result<Vec<Space>, StoreError> {
        let mut spaces: Vec<Space> = self.spaces.values().cloned().collect();
        spaces.sort_by_key(|s| s.order);
        Ok(spaces)
    }

    fn insert_tab(&mut self, tab: &Tab) -> Result<(), StoreError> {
        let space = self
            .spaces
            .get_mut(&tab.space_id)
            .ok_or_else(|| StoreError::DatabaseError(format!("no stored space {}", tab.space_id)))?;
        let mut stored = tab.clone();
        stored.runtime = Default::default();
        space.take_tab(tab.id);
        space.insert_tab(tab.order, stored);
        Ok(())
    }

    fn delete_tab(&mut self, tab_id: TabId) -> Result<(), StoreError> {
        for space in self.spaces.values_mut() {
            space.take_tab(tab_id);
        }
        Ok(())
    }

    fn save_space(&mut self, space: &Space) -> Result<(), StoreError> {
        self.spaces.insert(space.id, space.persisted_copy());
        self.save_count += 1;
        Ok(())
    }

    fn delete_space(&mut self, space_id: SpaceId) -> Result<(), StoreError> {
        self.spaces.remove(&space_id);
        Ok(())
    }
}
