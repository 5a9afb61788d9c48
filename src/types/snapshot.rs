use super::space::Space;
use super::tab::{SpaceId, Tab, TabContentType, TabId, TabPinState};

/// Everything needed to recreate a closed tab with its original identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTabSnapshot {
    pub id: TabId,
    pub title: String,
    pub favicon: Option<Vec<u8>>,
    pub url: String,
    pub order: usize,
    pub pin_state: TabPinState,
    pub content_type: TabContentType,
    pub custom_title: Option<String>,
    pub space_id: SpaceId,
}

impl ClosedTabSnapshot {
    pub fn from_tab(tab: &Tab) -> Self {
        Self {
            id: tab.id,
            title: tab.title.clone(),
            favicon: tab.favicon.clone(),
            url: tab.url.clone(),
            order: tab.order,
            pin_state: tab.pin_state,
            content_type: tab.content_type,
            custom_title: tab.custom_title.clone(),
            space_id: tab.space_id,
        }
    }

    /// Re-materializes the tab for `space`.
    ///
    /// Restoring into a different space is a logic error: it panics in debug
    /// builds and is logged and skipped in release builds.
    pub fn create_tab(&self, space: &Space) -> Option<Tab> {
        debug_assert_eq!(
            self.space_id, space.id,
            "The space ID of the snapshot does not match the provided space"
        );
        if self.space_id != space.id {
            log::error!(
                "Snapshot of tab {} belongs to space {}, refusing to restore into {}",
                self.id,
                self.space_id,
                space.id
            );
            return None;
        }

        let mut tab = Tab::create(
            &self.title,
            self.favicon.clone(),
            &self.url,
            self.order,
            space.id,
            self.content_type,
            Some(self.id),
        );
        tab.pin_state = self.pin_state;
        tab.custom_title = self.custom_title.clone();
        Some(tab)
    }
}
