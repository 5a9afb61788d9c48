//! Tests for the SQLite and in-memory tab stores.

use std::sync::Arc;

use rstest::rstest;
use tabspace::database::{Database, MemoryTabStore, SqliteTabStore, TabStore};
use tabspace::types::errors::StoreError;
use tabspace::types::space::Space;
use tabspace::types::tab::{Tab, TabContentType, TabPinState};

fn sample_space() -> Space {
    let mut space = Space::new("Work", "briefcase", 0, vec!["#ff0000".to_string(), "#00ff00".to_string()], "dark");
    space.grain_opacity = 0.25;
    space.pinned_tabs_visible = false;

    let mut docs = Tab::create(
        "Docs",
        Some(vec![1, 2, 3]),
        "https://docs.rs",
        0,
        space.id,
        TabContentType::Web,
        None,
    );
    docs.pin_state = TabPinState::Pinned;
    docs.custom_title = Some("Rust docs".to_string());
    space.insert_tab(0, docs);

    let history = Tab::create("History", None, "tabspace://history", 1, space.id, TabContentType::History, None);
    space.insert_tab(1, history);
    space
}

fn sqlite_store() -> SqliteTabStore {
    SqliteTabStore::new(Arc::new(Database::open_in_memory().unwrap()))
}

fn stores() -> Vec<Box<dyn TabStore>> {
    vec![Box::new(sqlite_store()), Box::new(MemoryTabStore::new())]
}

#[test]
fn save_and_load_space_roundtrip() {
    for mut store in stores() {
        let space = sample_space();
        store.save_space(&space).unwrap();

        let loaded = store.load_spaces().unwrap();
        assert_eq!(loaded.len(), 1);
        let restored = &loaded[0];
        assert_eq!(restored.id, space.id);
        assert_eq!(restored.name, "Work");
        assert_eq!(restored.colors, space.colors);
        assert_eq!(restored.color_scheme, "dark");
        assert_eq!(restored.grain_opacity, 0.25);
        assert!(!restored.pinned_tabs_visible);

        assert_eq!(restored.tab_count(), 2);
        let docs = &restored.tabs()[0];
        assert_eq!(docs.id, space.tabs()[0].id);
        assert_eq!(docs.pin_state, TabPinState::Pinned);
        assert_eq!(docs.custom_title.as_deref(), Some("Rust docs"));
        assert_eq!(docs.favicon.as_deref(), Some(&[1u8, 2, 3][..]));
        assert_eq!(restored.tabs()[1].content_type, TabContentType::History);
    }
}

#[test]
fn loaded_spaces_have_no_runtime_state() {
    for mut store in stores() {
        let mut space = sample_space();
        let first = space.tabs()[0].id;
        space.mark_loaded(first);
        space.set_current_tab(Some(first));
        store.save_space(&space).unwrap();

        let loaded = store.load_spaces().unwrap();
        assert!(loaded[0].current_tab_id().is_none());
        assert!(loaded[0].loaded_tabs().is_empty());
    }
}

#[test]
fn save_space_removes_rows_of_tabs_no_longer_present() {
    for mut store in stores() {
        let mut space = sample_space();
        store.save_space(&space).unwrap();

        let removed = space.tabs()[0].id;
        space.take_tab(removed);
        store.save_space(&space).unwrap();

        let loaded = store.load_spaces().unwrap();
        assert_eq!(loaded[0].tab_count(), 1);
        assert!(!loaded[0].contains(removed));
        assert_eq!(loaded[0].tabs()[0].order, 0);
    }
}

#[test]
fn insert_and_delete_tab() {
    for mut store in stores() {
        let space = sample_space();
        store.save_space(&space).unwrap();

        let extra = Tab::new("Extra", "https://extra.example", 2, space.id);
        store.insert_tab(&extra).unwrap();
        assert_eq!(store.load_spaces().unwrap()[0].tab_count(), 3);

        store.delete_tab(extra.id).unwrap();
        assert_eq!(store.load_spaces().unwrap()[0].tab_count(), 2);
    }
}

#[test]
fn delete_space_removes_its_tabs() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let mut store = SqliteTabStore::new(db.clone());
    let space = sample_space();
    store.save_space(&space).unwrap();
    store.delete_space(space.id).unwrap();

    assert!(store.load_spaces().unwrap().is_empty());
    let tabs: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM tabs", [], |row| row.get(0))
        .unwrap();
    assert_eq!(tabs, 0);
}

#[test]
fn spaces_load_in_order() {
    for mut store in stores() {
        let second = Space::new("B", "b.circle", 1, Vec::new(), "light");
        let first = Space::new("A", "a.circle", 0, Vec::new(), "light");
        store.save_space(&second).unwrap();
        store.save_space(&first).unwrap();

        let names: Vec<String> = store.load_spaces().unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}

#[test]
fn memory_store_counts_saves() {
    let mut store = MemoryTabStore::new();
    let space = sample_space();
    store.save_space(&space).unwrap();
    store.save_space(&space).unwrap();
    assert_eq!(store.save_count(), 2);
    assert!(store.stored_space(space.id).is_some());
}

#[test]
fn memory_store_rejects_tab_for_unknown_space() {
    let mut store = MemoryTabStore::new();
    let orphan = Tab::new("Orphan", "https://orphan.example", 0, uuid::Uuid::new_v4());
    assert!(matches!(store.insert_tab(&orphan), Err(StoreError::DatabaseError(_))));
}

#[rstest]
#[case("pin_state", "sticky")]
#[case("content_type", "video")]
#[case("id", "not-a-uuid")]
fn corrupt_rows_are_reported(#[case] column: &str, #[case] value: &str) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let mut store = SqliteTabStore::new(db.clone());
    let space = sample_space();
    store.save_space(&space).unwrap();

    db.connection()
        .execute(&format!("UPDATE tabs SET {} = ?1 WHERE position = 0", column), [value])
        .unwrap();

    assert!(matches!(store.load_spaces(), Err(StoreError::CorruptRow(_))));
}
