//! Property-based tests for undoing tab closes.
//!
//! Undoing every recorded close puts the space back exactly as it was: same
//! tabs, same sequence and same pin states. Redoing them all again lands on
//! the state right after the closes. Selection is not compared because closing
//! a background tab moves it and undo only restores it for the current tab.

use proptest::prelude::*;
use tabspace::database::MemoryTabStore;
use tabspace::managers::space_manager::{SpaceManager, SpaceManagerTrait};
use tabspace::managers::undo_manager::{TabUndoManager, TabUndoManagerTrait};
use tabspace::types::tab::{SpaceId, Tab, TabId, TabPinState};

#[derive(Debug, Clone)]
enum CloseOp {
    Close(usize),
    Above(usize),
    Below(usize),
    Clear(bool),
}

fn arb_pin_state() -> impl Strategy<Value = TabPinState> {
    prop_oneof![
        4 => Just(TabPinState::Normal),
        1 => Just(TabPinState::Pinned),
        1 => Just(TabPinState::Favorite),
    ]
}

/// Initial layout: a pin state per tab, which tabs are loaded, and which one
/// is current.
fn arb_layout() -> impl Strategy<Value = (Vec<(TabPinState, bool)>, usize)> {
    (prop::collection::vec((arb_pin_state(), any::<bool>()), 1..12), 0..12usize)
}

fn arb_close_ops() -> impl Strategy<Value = Vec<CloseOp>> {
    prop::collection::vec(
        prop_oneof![
            4 => (0..12usize).prop_map(CloseOp::Close),
            1 => (0..12usize).prop_map(CloseOp::Above),
            1 => (0..12usize).prop_map(CloseOp::Below),
            1 => any::<bool>().prop_map(CloseOp::Clear),
        ],
        1..15,
    )
}

/// Observable layout of the space: tab ids with their pin state.
fn shape(manager: &SpaceManager, space_id: SpaceId) -> Vec<(TabId, TabPinState)> {
    let space = manager.space(space_id).unwrap();
    space.tabs().iter().map(|t| (t.id, t.pin_state)).collect()
}

fn build(layout: &[(TabPinState, bool)], current: usize) -> (SpaceManager, SpaceId) {
    let mut manager = SpaceManager::new(Box::new(MemoryTabStore::new()));
    let space_id = manager.create_space("Work", "briefcase", Vec::new(), "light");
    let mut ids = Vec::new();
    for (i, (pin_state, loaded)) in layout.iter().enumerate() {
        let tab = Tab::new(&format!("t{}", i), "https://example.com", i, space_id);
        let id = manager.open_new_tab(space_id, tab, true).unwrap();
        match pin_state {
            TabPinState::Normal => {}
            TabPinState::Pinned => manager.pin_tab(id).unwrap(),
            TabPinState::Favorite => manager.favorite_tab(id).unwrap(),
        }
        if *loaded {
            manager.load_tab(id).unwrap();
        }
        ids.push(id);
    }
    manager.select_tab(ids[current % ids.len()]).unwrap();
    (manager, space_id)
}

/// Runs `op` and reports whether it recorded a command.
fn run(manager: &mut SpaceManager, undo: &mut TabUndoManager, space_id: SpaceId, op: &CloseOp) -> bool {
    let space = manager.space(space_id).unwrap();
    if space.tab_count() == 0 {
        return false;
    }
    let pick = |i: usize| space.tabs()[i % space.tab_count()].id;
    match op {
        CloseOp::Close(i) => {
            let id = pick(*i);
            manager.close_tab(space_id, id, undo).is_ok()
        }
        CloseOp::Above(i) => {
            let id = pick(*i);
            manager.close_tabs_above(space_id, id, undo).unwrap_or(false)
        }
        CloseOp::Below(i) => {
            let id = pick(*i);
            manager.close_tabs_below(space_id, id, undo).unwrap_or(false)
        }
        CloseOp::Clear(delete_current) => manager.clear(space_id, *delete_current, undo).unwrap_or(false),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn undo_all_restores_and_redo_all_replays((layout, current) in arb_layout(), ops in arb_close_ops()) {
        let (mut manager, space_id) = build(&layout, current);
        let mut undo = TabUndoManager::new();
        let before = shape(&manager, space_id);

        let mut recorded = 0;
        for op in &ops {
            if run(&mut manager, &mut undo, space_id, op) {
                recorded += 1;
            }
        }
        prop_assert_eq!(undo.undo_len(), recorded);
        let after = shape(&manager, space_id);

        for _ in 0..recorded {
            prop_assert!(undo.undo(&mut manager).is_some());
        }
        prop_assert!(!undo.can_undo());
        prop_assert_eq!(shape(&manager, space_id), before);

        for _ in 0..recorded {
            prop_assert!(undo.redo(&mut manager).is_some());
        }
        prop_assert!(!undo.can_redo());
        if let Some(current) = manager.space(space_id).unwrap().current_tab_id() {
            prop_assert!(manager.find_tab(current).is_some());
        }
        prop_assert_eq!(shape(&manager, space_id), after);
    }
}
