use uuid::Uuid;

use super::errors::TabError;
use super::tab::{SpaceId, Tab, TabId, TabPinState};

/// A named, ordered collection of tabs.
///
/// The tab sequence is private so that every change goes through a method that
/// keeps `Tab::order` equal to the tab's index, `current_tab` pointing at a tab
/// that exists, and `loaded_tabs` a subset of `tabs`.
#[derive(Debug, Clone)]
pub struct Space {
    pub id: SpaceId,
    pub name: String,
    pub system_image: String,
    pub order: usize,
    pub colors: Vec<String>,
    pub grain_opacity: f64,
    pub color_opacity: f64,
    pub color_scheme: String,
    pub pinned_tabs_visible: bool,
    tabs: Vec<Tab>,
    current_tab: Option<TabId>,
    loaded_tabs: Vec<TabId>,
}

impl Space {
    pub fn new(name: &str, system_image: &str, order: usize, colors: Vec<String>, color_scheme: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            system_image: system_image.to_string(),
            order,
            colors,
            grain_opacity: 0.0,
            color_opacity: 1.0,
            color_scheme: color_scheme.to_string(),
            pinned_tabs_visible: true,
            tabs: Vec::new(),
            current_tab: None,
            loaded_tabs: Vec::new(),
        }
    }

    // --- tab sequence ---

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn tab(&self, tab_id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    pub fn tab_mut(&mut self, tab_id: TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|t| t.id == tab_id)
    }

    pub fn index_of(&self, tab_id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == tab_id)
    }

    pub fn contains(&self, tab_id: TabId) -> bool {
        self.index_of(tab_id).is_some()
    }

    /// Replaces the whole sequence (drag-reorder). Every tab's `order` is
    /// re-numbered to its new index; selection and loaded state referring to
    /// tabs that are no longer present are dropped.
    pub fn set_tabs(&mut self, tabs: Vec<Tab>) {
        self.tabs = tabs;
        self.reindex();
        self.prune_dangling();
    }

    /// Inserts `tab` at `index` (clamped to the sequence length) and returns
    /// the index actually used.
    pub fn insert_tab(&mut self, index: usize, mut tab: Tab) -> usize {
        let index = index.min(self.tabs.len());
        tab.space_id = self.id;
        self.tabs.insert(index, tab);
        self.reindex();
        index
    }

    /// Removes a tab from the sequence and from `loaded_tabs`, tearing down its
    /// renderer. Clears the selection if it pointed at the removed tab.
    pub fn take_tab(&mut self, tab_id: TabId) -> Option<Tab> {
        let index = self.index_of(tab_id)?;
        let mut tab = self.tabs.remove(index);
        tab.teardown_renderer();
        self.loaded_tabs.retain(|id| *id != tab_id);
        if self.current_tab == Some(tab_id) {
            self.current_tab = None;
        }
        self.reindex();
        Some(tab)
    }

    /// Moves a tab to `new_index` in the full sequence.
    pub fn move_tab(&mut self, tab_id: TabId, new_index: usize) -> Result<(), TabError> {
        let index = self
            .index_of(tab_id)
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))?;
        if new_index >= self.tabs.len() {
            return Err(TabError::InvalidIndex(new_index));
        }
        let tab = self.tabs.remove(index);
        self.tabs.insert(new_index, tab);
        self.reindex();
        Ok(())
    }

    pub fn normal_tabs(&self) -> Vec<&Tab> {
        self.tabs_with_state(TabPinState::Normal)
    }

    pub fn pinned_tabs(&self) -> Vec<&Tab> {
        self.tabs_with_state(TabPinState::Pinned)
    }

    pub fn favorite_tabs(&self) -> Vec<&Tab> {
        self.tabs_with_state(TabPinState::Favorite)
    }

    fn tabs_with_state(&self, state: TabPinState) -> Vec<&Tab> {
        self.tabs.iter().filter(|t| t.pin_state == state).collect()
    }

    // --- selection ---

    pub fn current_tab_id(&self) -> Option<TabId> {
        self.current_tab
    }

    pub fn current_tab(&self) -> Option<&Tab> {
        self.current_tab.and_then(|id| self.tab(id))
    }

    /// Sets the current tab. Ids that are not in the sequence are rejected and
    /// leave the selection untouched.
    pub fn set_current_tab(&mut self, tab_id: Option<TabId>) -> bool {
        match tab_id {
            Some(id) if !self.contains(id) => {
                log::warn!("Refusing to select tab {} which is not in space {}", id, self.id);
                false
            }
            _ => {
                self.current_tab = tab_id;
                true
            }
        }
    }

    // --- loaded tabs ---

    pub fn loaded_tabs(&self) -> &[TabId] {
        &self.loaded_tabs
    }

    pub fn is_loaded(&self, tab_id: TabId) -> bool {
        self.loaded_tabs.contains(&tab_id)
    }

    /// Records that the tab's renderer is instantiated. Returns false when the
    /// tab is unknown or already loaded.
    pub fn mark_loaded(&mut self, tab_id: TabId) -> bool {
        if !self.contains(tab_id) || self.is_loaded(tab_id) {
            return false;
        }
        self.loaded_tabs.push(tab_id);
        true
    }

    /// Drops the tab from `loaded_tabs` and tears down its renderer. The tab
    /// itself and its data stay in the space.
    pub fn unload_tab(&mut self, tab_id: TabId) -> bool {
        let was_loaded = self.is_loaded(tab_id);
        self.loaded_tabs.retain(|id| *id != tab_id);
        if let Some(tab) = self.tab_mut(tab_id) {
            tab.teardown_renderer();
        }
        was_loaded
    }

    /// Copy of the persisted fields only: no renderers, no selection, nothing loaded.
    pub fn persisted_copy(&self) -> Space {
        let mut copy = self.clone();
        copy.current_tab = None;
        copy.loaded_tabs.clear();
        for tab in &mut copy.tabs {
            tab.runtime = Default::default();
        }
        copy
    }

    fn reindex(&mut self) {
        for (index, tab) in self.tabs.iter_mut().enumerate() {
            tab.order = index;
        }
    }

    fn prune_dangling(&mut self) {
        if let Some(current) = self.current_tab {
            if !self.contains(current) {
                self.current_tab = None;
            }
        }
        let present: Vec<TabId> = self.tabs.iter().map(|t| t.id).collect();
        self.loaded_tabs.retain(|id| present.contains(id));
    }
}
