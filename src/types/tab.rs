use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::renderer::RendererHandle;

/// Stable identifier of a tab.
pub type TabId = Uuid;

/// Stable identifier of a space.
pub type SpaceId = Uuid;

/// Which sidebar partition a tab belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TabPinState {
    #[default]
    Normal,
    Pinned,
    Favorite,
}

impl TabPinState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TabPinState::Normal => "normal",
            TabPinState::Pinned => "pinned",
            TabPinState::Favorite => "favorite",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "normal" => Some(TabPinState::Normal),
            "pinned" => Some(TabPinState::Pinned),
            "favorite" => Some(TabPinState::Favorite),
            _ => None,
        }
    }
}

/// What a tab displays: a web page or the built-in history view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TabContentType {
    #[default]
    Web,
    History,
}

impl TabContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TabContentType::Web => "web",
            TabContentType::History => "history",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "web" => Some(TabContentType::Web),
            "history" => Some(TabContentType::History),
            _ => None,
        }
    }
}

/// Runtime-only state of a tab. Re-derived whenever the tab is (re)loaded,
/// never persisted and never captured by a snapshot.
#[derive(Debug, Clone, Default)]
pub struct TabRuntime {
    pub renderer: Option<RendererHandle>,
    pub error_description: Option<String>,
    pub error_code: Option<i64>,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub estimated_progress: f64,
    pub is_loading: bool,
}

/// A single browsing unit inside a space.
#[derive(Debug, Clone)]
pub struct Tab {
    pub id: TabId,
    pub title: String,
    pub favicon: Option<Vec<u8>>,
    pub url: String,
    pub order: usize,
    pub pin_state: TabPinState,
    pub content_type: TabContentType,
    pub custom_title: Option<String>,
    pub space_id: SpaceId,
    pub runtime: TabRuntime,
}

impl Tab {
    /// Creates a tab. A fresh id is allocated unless `restored_id` is given,
    /// which only happens when an undo re-materializes a closed tab.
    pub fn create(
        title: &str,
        favicon: Option<Vec<u8>>,
        url: &str,
        order: usize,
        space_id: SpaceId,
        content_type: TabContentType,
        restored_id: Option<TabId>,
    ) -> Self {
        Self {
            id: restored_id.unwrap_or_else(Uuid::new_v4),
            title: title.to_string(),
            favicon,
            url: url.to_string(),
            order,
            pin_state: TabPinState::Normal,
            content_type,
            custom_title: None,
            space_id,
            runtime: TabRuntime::default(),
        }
    }

    /// Shorthand for a new web tab without a favicon.
    pub fn new(title: &str, url: &str, order: usize, space_id: SpaceId) -> Self {
        Self::create(title, None, url, order, space_id, TabContentType::Web, None)
    }

    /// The custom title when one is set and non-empty, else the page title.
    pub fn display_title(&self) -> &str {
        match self.custom_title.as_deref() {
            Some(custom) if !custom.is_empty() => custom,
            _ => &self.title,
        }
    }

    pub fn is_loaded_in_renderer(&self) -> bool {
        self.runtime.renderer.is_some()
    }

    /// Clears any stored error and asks the attached renderer to reload.
    pub fn reload(&mut self) {
        self.clear_error();
        match &self.runtime.renderer {
            Some(renderer) => renderer.reload(&self.url),
            None => log::debug!("Reload requested for tab {} without a renderer", self.id),
        }
    }

    pub fn clear_error(&mut self) {
        self.runtime.error_description = None;
        self.runtime.error_code = None;
    }

    /// Detaches the renderer handle (if any) and tears it down.
    pub(crate) fn teardown_renderer(&mut self) {
        if let Some(renderer) = self.runtime.renderer.take() {
            renderer.teardown();
        }
        self.runtime.is_loading = false;
        self.runtime.estimated_progress = 0.0;
    }
}
