//! Undoable tab-closing commands.
//!
//! A command captures snapshots of the tabs it closes before it runs, so that
//! `undo` can put them back with the same ids at the same positions. Spaces
//! are referenced by id and resolved on every call; a space or tab that has
//! disappeared in the meantime is reported as an error and nothing is changed.

use crate::types::errors::TabError;
use crate::types::snapshot::ClosedTabSnapshot;
use crate::types::space::Space;
use crate::types::tab::{SpaceId, TabId};

use super::space_manager::SpaceManager;

/// Any command the undo manager can execute, undo and redo.
#[derive(Debug, Clone)]
pub enum TabCommand {
    CloseTab(CloseTabCommand),
    CloseMultipleTabs(CloseMultipleTabsCommand),
}

impl TabCommand {
    pub fn execute(&self, spaces: &mut SpaceManager) -> Result<(), TabError> {
        match self {
            TabCommand::CloseTab(cmd) => cmd.execute(spaces),
            TabCommand::CloseMultipleTabs(cmd) => cmd.execute(spaces),
        }
    }

    pub fn undo(&self, spaces: &mut SpaceManager) -> Result<(), TabError> {
        match self {
            TabCommand::CloseTab(cmd) => cmd.undo(spaces),
            TabCommand::CloseMultipleTabs(cmd) => cmd.undo(spaces),
        }
    }

    /// Human readable description used in undo/redo alerts and menu titles.
    pub fn description(&self) -> String {
        match self {
            TabCommand::CloseTab(cmd) => cmd.description(),
            TabCommand::CloseMultipleTabs(cmd) => cmd.description(),
        }
    }

    pub fn space_id(&self) -> SpaceId {
        match self {
            TabCommand::CloseTab(cmd) => cmd.space_id,
            TabCommand::CloseMultipleTabs(cmd) => cmd.space_id,
        }
    }
}

impl From<CloseTabCommand> for TabCommand {
    fn from(cmd: CloseTabCommand) -> Self {
        TabCommand::CloseTab(cmd)
    }
}

impl From<CloseMultipleTabsCommand> for TabCommand {
    fn from(cmd: CloseMultipleTabsCommand) -> Self {
        TabCommand::CloseMultipleTabs(cmd)
    }
}

// === CloseTab ===

/// Closes a single tab.
#[derive(Debug, Clone)]
pub struct CloseTabCommand {
    snapshot: ClosedTabSnapshot,
    space_id: SpaceId,
    was_current_tab: bool,
}

impl CloseTabCommand {
    /// Captures the tab as it is right now.
    pub fn new(space: &Space, tab_id: TabId) -> Result<Self, TabError> {
        let tab = space
            .tab(tab_id)
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))?;
        Ok(Self {
            snapshot: ClosedTabSnapshot::from_tab(tab),
            space_id: space.id,
            was_current_tab: space.current_tab_id() == Some(tab_id),
        })
    }

    pub fn snapshot(&self) -> &ClosedTabSnapshot {
        &self.snapshot
    }

    pub fn was_current_tab(&self) -> bool {
        self.was_current_tab
    }

    pub fn description(&self) -> String {
        format!("Close Tab \"{}\"", self.snapshot.title)
    }

    /// The loaded tab to show once `tab_id` is gone: the one loaded before it,
    /// or the second loaded tab when it is first in line or not loaded.
    fn replacement(space: &Space, tab_id: TabId) -> Option<TabId> {
        let loaded = space.loaded_tabs();
        match loaded.iter().position(|id| *id == tab_id).unwrap_or(0) {
            0 => loaded.get(1).copied(),
            index => loaded.get(index - 1).copied(),
        }
    }

    fn execute(&self, spaces: &mut SpaceManager) -> Result<(), TabError> {
        let tab_id = self.snapshot.id;
        {
            let space = spaces
                .space_mut(self.space_id)
                .ok_or_else(|| TabError::SpaceNotFound(self.space_id.to_string()))?;
            if !space.contains(tab_id) {
                log::warn!("Tab {} not found in space {} when trying to close", tab_id, self.space_id);
                return Err(TabError::NotFound(tab_id.to_string()));
            }

            // The selection always moves to the replacement, even when a
            // background tab is closed.
            let replacement = Self::replacement(space, tab_id);
            space.take_tab(tab_id);
            space.set_current_tab(replacement);
        }

        spaces.persist_tab_deletion(tab_id);
        spaces.persist_space(self.space_id);
        log::debug!("Closed tab {} in space {}", tab_id, self.space_id);
        Ok(())
    }

    fn undo(&self, spaces: &mut SpaceManager) -> Result<(), TabError> {
        let tab_id = self.snapshot.id;
        {
            let space = spaces
                .space_mut(self.space_id)
                .ok_or_else(|| TabError::SpaceNotFound(self.space_id.to_string()))?;
            if space.contains(tab_id) {
                log::warn!("Tab {} is already in space {}, nothing to restore", tab_id, self.space_id);
                return Ok(());
            }
            let Some(tab) = self.snapshot.create_tab(space) else {
                return Ok(());
            };
            let index = self.snapshot.order.min(space.tab_count());
            space.insert_tab(index, tab);
        }

        spaces.persist_tab_insert(tab_id);
        spaces.persist_space(self.space_id);

        if self.was_current_tab {
            if let Some(space) = spaces.space_mut(self.space_id) {
                space.set_current_tab(Some(tab_id));
            }
        }
        log::debug!("Restored tab {} in space {}", tab_id, self.space_id);
        Ok(())
    }
}

// === CloseMultipleTabs ===

/// How the batch of a [`CloseMultipleTabsCommand`] was chosen. Only affects
/// the description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseMultipleKind {
    Clear,
    CloseAbove,
    CloseBelow,
}

impl CloseMultipleKind {
    fn description(&self, tab_count: usize) -> String {
        match self {
            CloseMultipleKind::CloseAbove => format!("Close {} Tabs Above", tab_count),
            CloseMultipleKind::CloseBelow => format!("Close {} Tabs Below", tab_count),
            CloseMultipleKind::Clear => format!("Clear Space With {} Tabs", tab_count),
        }
    }
}

/// Closes a batch of tabs in one step.
#[derive(Debug, Clone)]
pub struct CloseMultipleTabsCommand {
    snapshots: Vec<ClosedTabSnapshot>,
    space_id: SpaceId,
    current_tab_id: Option<TabId>,
    kind: CloseMultipleKind,
}

impl CloseMultipleTabsCommand {
    /// Captures the given tabs in the order listed, together with the space's
    /// current selection. Ids that are not in the space are ignored.
    pub fn new(space: &Space, tab_ids: &[TabId], kind: CloseMultipleKind) -> Self {
        let snapshots = tab_ids
            .iter()
            .filter_map(|id| space.tab(*id))
            .map(ClosedTabSnapshot::from_tab)
            .collect();
        Self {
            snapshots,
            space_id: space.id,
            current_tab_id: space.current_tab_id(),
            kind,
        }
    }

    pub fn snapshots(&self) -> &[ClosedTabSnapshot] {
        &self.snapshots
    }

    pub fn current_tab_id(&self) -> Option<TabId> {
        self.current_tab_id
    }

    pub fn kind(&self) -> CloseMultipleKind {
        self.kind
    }

    pub fn description(&self) -> String {
        self.kind.description(self.snapshots.len())
    }

    fn execute(&self, spaces: &mut SpaceManager) -> Result<(), TabError> {
        let ids: Vec<TabId> = self.snapshots.iter().map(|s| s.id).collect();
        let removed: Vec<TabId> = {
            let space = spaces
                .space_mut(self.space_id)
                .ok_or_else(|| TabError::SpaceNotFound(self.space_id.to_string()))?;

            // Selection moves off the batch before anything is removed.
            if space.current_tab_id().is_some_and(|current| ids.contains(&current)) {
                let next = space.tabs().iter().find(|t| !ids.contains(&t.id)).map(|t| t.id);
                space.set_current_tab(next);
            }

            ids.iter()
                .copied()
                .filter(|id| space.take_tab(*id).is_some())
                .collect()
        };

        if removed.is_empty() {
            log::warn!("None of the {} tabs to close are in space {}", ids.len(), self.space_id);
            return Err(TabError::NotFound(format!("{} tabs in space {}", ids.len(), self.space_id)));
        }
        if removed.len() < ids.len() {
            log::warn!(
                "Only {} of {} tabs were still in space {}",
                removed.len(),
                ids.len(),
                self.space_id
            );
        }

        for id in &removed {
            spaces.persist_tab_deletion(*id);
        }
        spaces.persist_space(self.space_id);
        log::debug!("Closed {} tabs in space {}", removed.len(), self.space_id);
        Ok(())
    }

    fn undo(&self, spaces: &mut SpaceManager) -> Result<(), TabError> {
        // Inserting in ascending recorded position puts every tab back exactly
        // where it was relative to the tabs that survived.
        let mut ordered: Vec<&ClosedTabSnapshot> = self.snapshots.iter().collect();
        ordered.sort_by_key(|s| s.order);

        let restored: Vec<TabId> = {
            let space = spaces
                .space_mut(self.space_id)
                .ok_or_else(|| TabError::SpaceNotFound(self.space_id.to_string()))?;

            let mut restored = Vec::with_capacity(ordered.len());
            for snapshot in ordered {
                if space.contains(snapshot.id) {
                    log::warn!("Tab {} is already in space {}, skipping", snapshot.id, self.space_id);
                    continue;
                }
                if let Some(tab) = snapshot.create_tab(space) {
                    let index = snapshot.order.min(space.tab_count());
                    space.insert_tab(index, tab);
                    restored.push(snapshot.id);
                }
            }
            restored
        };

        for id in &restored {
            spaces.persist_tab_insert(*id);
        }
        spaces.persist_space(self.space_id);

        if let Some(current) = self.current_tab_id.filter(|id| restored.contains(id)) {
            if let Some(space) = spaces.space_mut(self.space_id) {
                space.set_current_tab(Some(current));
            }
        }
        log::debug!("Restored {} tabs in space {}", restored.len(), self.space_id);
        Ok(())
    }
}
