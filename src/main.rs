//! Tabspace console demo.
//!
//! Walks through the tab model with an in-memory store: opening tabs, closing
//! them, undo and redo, clearing a space and automatic suspension.

use std::error::Error;
use std::time::{Duration, Instant};

use tabspace::database::{Database, MemoryTabStore};
use tabspace::managers::space_manager::{SpaceManager, SpaceManagerTrait};
use tabspace::managers::undo_manager::{TabUndoManager, TabUndoManagerTrait};
use tabspace::services::page_suspension::PageSuspension;
use tabspace::types::space::Space;
use tabspace::types::tab::{SpaceId, Tab};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 Tabspace v{} - Demo Mode                  ║", env!("CARGO_PKG_VERSION"));
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    demo_database()?;
    let (mut spaces, space_id) = demo_tabs()?;
    let mut undo = TabUndoManager::new();
    demo_close_and_undo(&mut spaces, &mut undo, space_id)?;
    demo_clear(&mut spaces, &mut undo, space_id)?;
    demo_suspension(&mut spaces, space_id)?;

    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  ✅ Demo finished");
    println!("═══════════════════════════════════════════════════════════════");
    Ok(())
}

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn print_space(space: &Space) {
    for tab in space.tabs() {
        let marker = if space.current_tab_id() == Some(tab.id) { "▶" } else { " " };
        let loaded = if space.is_loaded(tab.id) { "loaded" } else { "" };
        println!(
            "   {} [{}] {:<12} {:<8} {}",
            marker,
            tab.order,
            tab.display_title(),
            tab.pin_state.as_str(),
            loaded
        );
    }
}

fn demo_database() -> Result<(), Box<dyn Error>> {
    section("Database Layer");
    let db = Database::open_in_memory()?;
    let conn = db.connection();
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")?;
    let tables: Vec<String> = stmt
        .query_map([], |row| row.get(0))?
        .filter_map(|r| r.ok())
        .collect();
    println!("  Created {} tables: {}", tables.len(), tables.join(", "));
    println!();
    Ok(())
}

fn demo_tabs() -> Result<(SpaceManager, SpaceId), Box<dyn Error>> {
    section("Spaces & Tabs");
    let mut spaces = SpaceManager::new(Box::new(MemoryTabStore::new()));
    let space_id = spaces.create_space("Work", "briefcase", vec!["#3b82f6".to_string()], "light");

    for (i, (title, url)) in [
        ("Docs", "https://doc.rust-lang.org"),
        ("Crates", "https://crates.io"),
        ("Issues", "https://github.com/issues"),
        ("Mail", "https://mail.example.com"),
    ]
    .iter()
    .enumerate()
    {
        let tab_id = spaces.open_new_tab(space_id, Tab::new(title, url, i, space_id), true)?;
        spaces.load_tab(tab_id)?;
    }
    if let Some(first) = spaces.space(space_id).and_then(|s| s.tabs().first()).map(|t| t.id) {
        spaces.pin_tab(first)?;
    }

    if let Some(space) = spaces.space(space_id) {
        println!("  Space '{}' with {} tabs:", space.name, space.tab_count());
        print_space(space);
    }
    println!();
    Ok((spaces, space_id))
}

fn demo_close_and_undo(spaces: &mut SpaceManager, undo: &mut TabUndoManager, space_id: SpaceId) -> Result<(), Box<dyn Error>> {
    section("Close, Undo, Redo");
    let current = spaces
        .space(space_id)
        .and_then(|s| s.current_tab_id())
        .ok_or("no current tab")?;
    spaces.close_tab(space_id, current, undo)?;
    println!("  After close ({}):", undo.undo_description());
    if let Some(space) = spaces.space(space_id) {
        print_space(space);
    }

    if let Some(alert) = undo.undo(spaces) {
        println!("  🔔 {} ({})", alert.message, alert.system_image);
    }
    if let Some(space) = spaces.space(space_id) {
        print_space(space);
    }

    if let Some(alert) = undo.redo(spaces) {
        println!("  🔔 {} ({})", alert.message, alert.system_image);
    }
    println!("  can_undo={} can_redo={}", undo.can_undo(), undo.can_redo());
    println!();
    Ok(())
}

fn demo_clear(spaces: &mut SpaceManager, undo: &mut TabUndoManager, space_id: SpaceId) -> Result<(), Box<dyn Error>> {
    section("Clear Space");
    spaces.clear(space_id, false, undo)?;
    println!("  {}:", undo.undo_description());
    if let Some(space) = spaces.space(space_id) {
        print_space(space);
    }
    if let Some(alert) = undo.undo(spaces) {
        println!("  🔔 {}", alert.message);
    }
    if let Some(space) = spaces.space(space_id) {
        print_space(space);
    }
    println!();
    Ok(())
}

fn demo_suspension(spaces: &mut SpaceManager, space_id: SpaceId) -> Result<(), Box<dyn Error>> {
    section("Page Suspension");
    let mut suspension = PageSuspension::new(true, Duration::from_secs(30 * 60));
    let start = Instant::now();
    let loaded: Vec<_> = spaces
        .space(space_id)
        .map(|s| s.loaded_tabs().to_vec())
        .unwrap_or_default();
    for tab_id in &loaded {
        suspension.start(*tab_id, start);
    }

    let suspended = suspension.poll(start + Duration::from_secs(31 * 60), spaces);
    println!("  {} of {} loaded tabs suspended after 31 minutes", suspended.len(), loaded.len());
    if let Some(space) = spaces.space(space_id) {
        print_space(space);
    }
    Ok(())
}
