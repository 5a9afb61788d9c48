use crate::database::TabStore;
use crate::types::errors::{StoreError, TabError};
use crate::types::renderer::{RendererFactory, RendererHandle};
use crate::types::space::Space;
use crate::types::tab::{SpaceId, Tab, TabId, TabPinState};

use super::tab_commands::{CloseMultipleKind, CloseMultipleTabsCommand, CloseTabCommand};
use super::undo_manager::{TabUndoManager, TabUndoManagerTrait};

/// Trait defining the space and tab management interface.
pub trait SpaceManagerTrait {
    fn create_space(&mut self, name: &str, system_image: &str, colors: Vec<String>, color_scheme: &str) -> SpaceId;
    fn remove_space(&mut self, space_id: SpaceId) -> Result<(), TabError>;
    fn space(&self, space_id: SpaceId) -> Option<&Space>;
    fn spaces(&self) -> &[Space];
    fn find_tab(&self, tab_id: TabId) -> Option<SpaceId>;
    fn tab(&self, tab_id: TabId) -> Option<&Tab>;
    fn open_new_tab(&mut self, space_id: SpaceId, tab: Tab, select: bool) -> Result<TabId, TabError>;
    fn duplicate_tab(&mut self, tab_id: TabId) -> Result<TabId, TabError>;
    fn pin_tab(&mut self, tab_id: TabId) -> Result<(), TabError>;
    fn unpin_tab(&mut self, tab_id: TabId) -> Result<(), TabError>;
    fn favorite_tab(&mut self, tab_id: TabId) -> Result<(), TabError>;
    fn select_tab(&mut self, tab_id: TabId) -> Result<(), TabError>;
    fn load_tab(&mut self, tab_id: TabId) -> Result<bool, TabError>;
    fn unload_tab(&mut self, tab_id: TabId) -> Result<bool, TabError>;
    fn reload_tab(&mut self, tab_id: TabId) -> Result<(), TabError>;
    fn set_tab_order(&mut self, space_id: SpaceId, order: &[TabId]) -> Result<(), TabError>;
    fn move_tab(&mut self, tab_id: TabId, new_index: usize) -> Result<(), TabError>;
    fn rename_tab(&mut self, tab_id: TabId, custom_title: Option<&str>) -> Result<(), TabError>;
    fn update_tab_location(&mut self, tab_id: TabId, url: &str, title: &str) -> Result<(), TabError>;
    fn apply_favicon(&mut self, tab_id: TabId, favicon: Vec<u8>) -> bool;
    fn close_tab(&mut self, space_id: SpaceId, tab_id: TabId, undo: &mut TabUndoManager) -> Result<(), TabError>;
    fn clear(&mut self, space_id: SpaceId, delete_current: bool, undo: &mut TabUndoManager) -> Result<bool, TabError>;
    fn close_tabs_above(&mut self, space_id: SpaceId, tab_id: TabId, undo: &mut TabUndoManager) -> Result<bool, TabError>;
    fn close_tabs_below(&mut self, space_id: SpaceId, tab_id: TabId, undo: &mut TabUndoManager) -> Result<bool, TabError>;
}

/// Owns every space of a window and the store they persist to.
///
/// Persistence failures are logged and never undo the in-memory change, so
/// memory and store can drift apart until the next successful save.
pub struct SpaceManager {
    spaces: Vec<Space>,
    store: Box<dyn TabStore>,
    renderers: Option<Box<dyn RendererFactory>>,
}

impl SpaceManager {
    pub fn new(store: Box<dyn TabStore>) -> Self {
        Self {
            spaces: Vec::new(),
            store,
            renderers: None,
        }
    }

    /// Creates a manager holding everything `store` has persisted.
    pub fn load(store: Box<dyn TabStore>) -> Result<Self, StoreError> {
        let spaces = store.load_spaces()?;
        log::info!(
            "Loaded {} spaces with {} tabs",
            spaces.len(),
            spaces.iter().map(Space::tab_count).sum::<usize>()
        );
        Ok(Self {
            spaces,
            store,
            renderers: None,
        })
    }

    pub fn with_renderer_factory(mut self, factory: Box<dyn RendererFactory>) -> Self {
        self.renderers = Some(factory);
        self
    }

    pub fn store(&self) -> &dyn TabStore {
        self.store.as_ref()
    }

    pub(crate) fn space_mut(&mut self, space_id: SpaceId) -> Option<&mut Space> {
        self.spaces.iter_mut().find(|s| s.id == space_id)
    }

    fn locate(&self, tab_id: TabId) -> Result<SpaceId, TabError> {
        self.find_tab(tab_id)
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))
    }

    fn tab_mut(&mut self, tab_id: TabId) -> Result<&mut Tab, TabError> {
        self.spaces
            .iter_mut()
            .find_map(|s| s.tab_mut(tab_id))
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))
    }

    fn space_or_err(&mut self, space_id: SpaceId) -> Result<&mut Space, TabError> {
        self.space_mut(space_id)
            .ok_or_else(|| TabError::SpaceNotFound(space_id.to_string()))
    }

    fn set_pin_state(&mut self, tab_id: TabId, state: TabPinState) -> Result<(), TabError> {
        let space_id = self.locate(tab_id)?;
        self.tab_mut(tab_id)?.pin_state = state;
        self.persist_space(space_id);
        Ok(())
    }

    /// Ids of the tabs that share `tab_id`'s pin state, in sequence order.
    fn partition_of(space: &Space, tab_id: TabId) -> Result<Vec<TabId>, TabError> {
        let state = space
            .tab(tab_id)
            .map(|t| t.pin_state)
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))?;
        Ok(space
            .tabs()
            .iter()
            .filter(|t| t.pin_state == state)
            .map(|t| t.id)
            .collect())
    }

    fn close_many(
        &mut self,
        space_id: SpaceId,
        tab_ids: &[TabId],
        kind: CloseMultipleKind,
        undo: &mut TabUndoManager,
    ) -> Result<bool, TabError> {
        if tab_ids.is_empty() {
            return Ok(false);
        }
        let space = self
            .space(space_id)
            .ok_or_else(|| TabError::SpaceNotFound(space_id.to_string()))?;
        let command = CloseMultipleTabsCommand::new(space, tab_ids, kind);
        undo.execute(command.into(), self)?;
        Ok(true)
    }

    // --- persistence ---

    pub(crate) fn persist_tab_insert(&mut self, tab_id: TabId) {
        let Some(tab) = self.spaces.iter().find_map(|s| s.tab(tab_id)) else {
            return;
        };
        if let Err(e) = self.store.insert_tab(tab) {
            log::error!("Failed to insert tab {}: {}", tab_id, e);
        }
    }

    pub(crate) fn persist_tab_deletion(&mut self, tab_id: TabId) {
        if let Err(e) = self.store.delete_tab(tab_id) {
            log::error!("Failed to delete tab {}: {}", tab_id, e);
        }
    }

    pub(crate) fn persist_space(&mut self, space_id: SpaceId) {
        let Some(space) = self.spaces.iter().find(|s| s.id == space_id) else {
            return;
        };
        if let Err(e) = self.store.save_space(space) {
            log::error!("Failed to save space {}: {}", space_id, e);
        }
    }
}

impl SpaceManagerTrait for SpaceManager {
    fn create_space(&mut self, name: &str, system_image: &str, colors: Vec<String>, color_scheme: &str) -> SpaceId {
        let space = Space::new(name, system_image, self.spaces.len(), colors, color_scheme);
        let id = space.id;
        self.spaces.push(space);
        self.persist_space(id);
        log::info!("Created space '{}' ({})", name, id);
        id
    }

    /// Removes a space with all of its tabs. Commands that still refer to it
    /// will fail with `SpaceNotFound` when undone or redone.
    fn remove_space(&mut self, space_id: SpaceId) -> Result<(), TabError> {
        let index = self
            .spaces
            .iter()
            .position(|s| s.id == space_id)
            .ok_or_else(|| TabError::SpaceNotFound(space_id.to_string()))?;
        let mut space = self.spaces.remove(index);
        let loaded: Vec<TabId> = space.loaded_tabs().to_vec();
        for tab_id in loaded {
            space.unload_tab(tab_id);
        }
        if let Err(e) = self.store.delete_space(space_id) {
            log::error!("Failed to delete space {}: {}", space_id, e);
        }

        for (order, space) in self.spaces.iter_mut().enumerate() {
            space.order = order;
        }
        let remaining: Vec<SpaceId> = self.spaces.iter().map(|s| s.id).collect();
        for id in remaining {
            self.persist_space(id);
        }
        log::info!("Removed space '{}' ({})", space.name, space_id);
        Ok(())
    }

    fn space(&self, space_id: SpaceId) -> Option<&Space> {
        self.spaces.iter().find(|s| s.id == space_id)
    }

    fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    fn find_tab(&self, tab_id: TabId) -> Option<SpaceId> {
        self.spaces.iter().find(|s| s.contains(tab_id)).map(|s| s.id)
    }

    fn tab(&self, tab_id: TabId) -> Option<&Tab> {
        self.spaces.iter().find_map(|s| s.tab(tab_id))
    }

    /// Inserts `tab` at its `order`, or appends it when that is past the end.
    /// A selected tab becomes current; a background tab is kept loaded.
    fn open_new_tab(&mut self, space_id: SpaceId, tab: Tab, select: bool) -> Result<TabId, TabError> {
        let tab_id = tab.id;
        {
            let space = self.space_or_err(space_id)?;
            let index = if tab.order > space.tab_count() {
                space.tab_count()
            } else {
                tab.order
            };
            space.insert_tab(index, tab);
        }

        self.persist_tab_insert(tab_id);
        self.persist_space(space_id);

        let space = self.space_or_err(space_id)?;
        if select {
            space.set_current_tab(Some(tab_id));
        } else {
            space.mark_loaded(tab_id);
        }
        log::debug!("Opened tab {} in space {}", tab_id, space_id);
        Ok(tab_id)
    }

    /// Opens a copy of the tab right after it and selects the copy.
    fn duplicate_tab(&mut self, tab_id: TabId) -> Result<TabId, TabError> {
        let space_id = self.locate(tab_id)?;
        let source = self
            .tab(tab_id)
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))?;
        let mut copy = Tab::create(
            &source.title,
            source.favicon.clone(),
            &source.url,
            source.order + 1,
            space_id,
            source.content_type,
            None,
        );
        copy.pin_state = source.pin_state;
        self.open_new_tab(space_id, copy, true)
    }

    fn pin_tab(&mut self, tab_id: TabId) -> Result<(), TabError> {
        self.set_pin_state(tab_id, TabPinState::Pinned)
    }

    fn unpin_tab(&mut self, tab_id: TabId) -> Result<(), TabError> {
        self.set_pin_state(tab_id, TabPinState::Normal)
    }

    fn favorite_tab(&mut self, tab_id: TabId) -> Result<(), TabError> {
        self.set_pin_state(tab_id, TabPinState::Favorite)
    }

    fn select_tab(&mut self, tab_id: TabId) -> Result<(), TabError> {
        let space_id = self.locate(tab_id)?;
        self.space_or_err(space_id)?.set_current_tab(Some(tab_id));
        Ok(())
    }

    /// Marks the tab loaded and attaches a renderer from the factory when it
    /// has none. Returns false if it was already loaded.
    fn load_tab(&mut self, tab_id: TabId) -> Result<bool, TabError> {
        let space_id = self.locate(tab_id)?;
        let Self { spaces, renderers, .. } = self;
        let space = spaces
            .iter_mut()
            .find(|s| s.id == space_id)
            .ok_or_else(|| TabError::SpaceNotFound(space_id.to_string()))?;

        let newly_loaded = space.mark_loaded(tab_id);
        if let (Some(factory), Some(tab)) = (renderers.as_ref(), space.tab_mut(tab_id)) {
            if tab.runtime.renderer.is_none() {
                let renderer = factory.instantiate(tab);
                tab.runtime.renderer = Some(RendererHandle::new(renderer));
                log::debug!("Instantiated renderer for tab {}", tab_id);
            }
        }
        Ok(newly_loaded)
    }

    /// Drops the tab's renderer. The tab stays in its space.
    fn unload_tab(&mut self, tab_id: TabId) -> Result<bool, TabError> {
        let space_id = self.locate(tab_id)?;
        let unloaded = self.space_or_err(space_id)?.unload_tab(tab_id);
        if unloaded {
            log::debug!("Unloaded tab {}", tab_id);
        }
        Ok(unloaded)
    }

    fn reload_tab(&mut self, tab_id: TabId) -> Result<(), TabError> {
        self.tab_mut(tab_id)?.reload();
        Ok(())
    }

    /// Replaces the sequence with `order`, which must list every tab of the
    /// space exactly once.
    fn set_tab_order(&mut self, space_id: SpaceId, order: &[TabId]) -> Result<(), TabError> {
        {
            let space = self.space_or_err(space_id)?;
            if order.len() != space.tab_count() {
                return Err(TabError::InvalidOrder(format!(
                    "expected {} tabs, got {}",
                    space.tab_count(),
                    order.len()
                )));
            }
            let mut tabs = Vec::with_capacity(order.len());
            for (i, id) in order.iter().enumerate() {
                if order[..i].contains(id) {
                    return Err(TabError::InvalidOrder(format!("tab {} listed twice", id)));
                }
                let tab = space
                    .tab(*id)
                    .cloned()
                    .ok_or_else(|| TabError::InvalidOrder(format!("tab {} is not in the space", id)))?;
                tabs.push(tab);
            }
            space.set_tabs(tabs);
        }
        self.persist_space(space_id);
        Ok(())
    }

    fn move_tab(&mut self, tab_id: TabId, new_index: usize) -> Result<(), TabError> {
        let space_id = self.locate(tab_id)?;
        self.space_or_err(space_id)?.move_tab(tab_id, new_index)?;
        self.persist_space(space_id);
        Ok(())
    }

    /// Sets or clears (with `None` or an empty string) the custom title.
    fn rename_tab(&mut self, tab_id: TabId, custom_title: Option<&str>) -> Result<(), TabError> {
        let space_id = self.locate(tab_id)?;
        self.tab_mut(tab_id)?.custom_title = custom_title.filter(|t| !t.is_empty()).map(str::to_string);
        self.persist_space(space_id);
        Ok(())
    }

    /// Records where a navigation ended up.
    fn update_tab_location(&mut self, tab_id: TabId, url: &str, title: &str) -> Result<(), TabError> {
        let space_id = self.locate(tab_id)?;
        let tab = self.tab_mut(tab_id)?;
        tab.url = url.to_string();
        tab.title = title.to_string();
        tab.clear_error();
        self.persist_space(space_id);
        Ok(())
    }

    fn apply_favicon(&mut self, tab_id: TabId, favicon: Vec<u8>) -> bool {
        let Ok(space_id) = self.locate(tab_id) else {
            log::debug!("Dropping favicon for closed tab {}", tab_id);
            return false;
        };
        if let Ok(tab) = self.tab_mut(tab_id) {
            tab.favicon = Some(favicon);
        }
        self.persist_space(space_id);
        true
    }

    /// The only way to close a single tab; goes through the undo manager.
    fn close_tab(&mut self, space_id: SpaceId, tab_id: TabId, undo: &mut TabUndoManager) -> Result<(), TabError> {
        let space = self
            .space(space_id)
            .ok_or_else(|| TabError::SpaceNotFound(space_id.to_string()))?;
        let command = CloseTabCommand::new(space, tab_id)?;
        undo.execute(command.into(), self)
    }

    /// Closes the normal tabs of the space, keeping the current one unless
    /// `delete_current` is set. Returns false when there was nothing to close.
    fn clear(&mut self, space_id: SpaceId, delete_current: bool, undo: &mut TabUndoManager) -> Result<bool, TabError> {
        let space = self
            .space(space_id)
            .ok_or_else(|| TabError::SpaceNotFound(space_id.to_string()))?;
        let normal = space.normal_tabs();
        if normal.is_empty() {
            return Ok(false);
        }
        let current = space.current_tab_id();
        let targets: Vec<TabId> = normal
            .iter()
            .map(|t| t.id)
            .filter(|id| delete_current || Some(*id) != current)
            .collect();
        self.close_many(space_id, &targets, CloseMultipleKind::Clear, undo)
    }

    fn close_tabs_above(&mut self, space_id: SpaceId, tab_id: TabId, undo: &mut TabUndoManager) -> Result<bool, TabError> {
        let space = self
            .space(space_id)
            .ok_or_else(|| TabError::SpaceNotFound(space_id.to_string()))?;
        let partition = Self::partition_of(space, tab_id)?;
        let targets: Vec<TabId> = partition.iter().copied().take_while(|id| *id != tab_id).collect();
        self.close_many(space_id, &targets, CloseMultipleKind::CloseAbove, undo)
    }

    fn close_tabs_below(&mut self, space_id: SpaceId, tab_id: TabId, undo: &mut TabUndoManager) -> Result<bool, TabError> {
        let space = self
            .space(space_id)
            .ok_or_else(|| TabError::SpaceNotFound(space_id.to_string()))?;
        let partition = Self::partition_of(space, tab_id)?;
        let targets: Vec<TabId> = partition
            .iter()
            .copied()
            .skip_while(|id| *id != tab_id)
            .skip(1)
            .collect();
        self.close_many(space_id, &targets, CloseMultipleKind::CloseBelow, undo)
    }
}
