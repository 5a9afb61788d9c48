// Tabspace automatic page suspension
// Unloads tabs that have sat in the background for too long. The clock is
// passed in by the caller, so the owner decides when deadlines are checked.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::managers::space_manager::{SpaceManager, SpaceManagerTrait};
use crate::types::settings::PerformanceSettings;
use crate::types::tab::TabId;

/// Per-tab suspension deadlines.
#[derive(Debug, Clone)]
pub struct PageSuspension {
    enabled: bool,
    interval: Duration,
    deadlines: HashMap<TabId, Instant>,
}

impl PageSuspension {
    pub fn new(enabled: bool, interval: Duration) -> Self {
        Self {
            enabled,
            interval,
            deadlines: HashMap::new(),
        }
    }

    pub fn from_settings(settings: &PerformanceSettings) -> Self {
        Self::new(
            settings.automatic_page_suspension,
            Duration::from_secs(u64::from(settings.tab_suspend_timeout_minutes) * 60),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Applies new settings. Disabling drops every pending deadline.
    pub fn configure(&mut self, enabled: bool, interval: Duration) {
        self.enabled = enabled;
        self.interval = interval;
        if !enabled {
            self.deadlines.clear();
        }
    }

    /// Arms the timer for a tab that just became loaded. Does nothing while
    /// suspension is disabled.
    pub fn start(&mut self, tab_id: TabId, now: Instant) {
        if self.enabled {
            self.deadlines.insert(tab_id, now + self.interval);
        }
    }

    /// Pushes the deadline back after activity in the tab.
    pub fn reset(&mut self, tab_id: TabId, now: Instant) {
        if self.deadlines.contains_key(&tab_id) {
            self.start(tab_id, now);
        }
    }

    pub fn cancel(&mut self, tab_id: TabId) {
        self.deadlines.remove(&tab_id);
    }

    pub fn deadline(&self, tab_id: TabId) -> Option<Instant> {
        self.deadlines.get(&tab_id).copied()
    }

    /// Earliest pending deadline, for scheduling the next `poll`.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Handles every deadline that has passed at `now` and returns the tabs
    /// that were unloaded. The current tab of its space and tabs whose renderer
    /// reports active media are re-armed instead.
    pub fn poll(&mut self, now: Instant, spaces: &mut SpaceManager) -> Vec<TabId> {
        let due: Vec<TabId> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, _)| *id)
            .collect();

        let mut unloaded = Vec::new();
        for tab_id in due {
            let Some(space) = spaces.find_tab(tab_id).and_then(|id| spaces.space(id)) else {
                self.deadlines.remove(&tab_id);
                continue;
            };
            if !space.is_loaded(tab_id) {
                self.deadlines.remove(&tab_id);
                continue;
            }

            let is_current = space.current_tab_id() == Some(tab_id);
            let media_active = space
                .tab(tab_id)
                .and_then(|t| t.runtime.renderer.as_ref())
                .is_some_and(|r| r.is_media_active());

            if is_current || media_active {
                log::debug!(
                    "Keeping tab {} loaded (current: {}, media: {})",
                    tab_id,
                    is_current,
                    media_active
                );
                self.start(tab_id, now);
                continue;
            }

            self.deadlines.remove(&tab_id);
            match spaces.unload_tab(tab_id) {
                Ok(_) => {
                    log::info!("Suspended tab {} after {:?} in the background", tab_id, self.interval);
                    unloaded.push(tab_id);
                }
                Err(e) => log::warn!("Could not suspend tab {}: {}", tab_id, e),
            }
        }
        unloaded
    }
}

impl Default for PageSuspension {
    fn default() -> Self {
        Self::from_settings(&PerformanceSettings::default())
    }
}
