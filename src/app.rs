//! App core for Tabspace.
//!
//! Ties the spaces, the undo history and the services together for one
//! browser window and drives the work that happens outside a direct call:
//! applying fetched favicons and suspending idle tabs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::database::{Database, SqliteTabStore};
use crate::managers::space_manager::{SpaceManager, SpaceManagerTrait};
use crate::managers::undo_manager::{TabUndoManager, TabUndoManagerTrait};
use crate::services::favicon_service::{FaviconService, FaviconUpdate};
use crate::services::page_suspension::PageSuspension;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::types::alert::ActionAlert;
use crate::types::errors::TabError;
use crate::types::tab::{SpaceId, Tab, TabId};

/// Name of the space created on first launch.
pub const DEFAULT_SPACE_NAME: &str = "Personal";

/// Central application struct holding the managers and services of a window.
pub struct App {
    pub db: Arc<Database>,
    pub space_manager: SpaceManager,
    pub undo_manager: TabUndoManager,
    pub settings_engine: SettingsEngine,
    pub page_suspension: PageSuspension,
    pub favicon_service: FaviconService,
    favicon_updates: UnboundedReceiver<FaviconUpdate>,
    alerts: UnboundedReceiver<ActionAlert>,
    runtime: Runtime,
}

impl App {
    /// Opens the database at `db_path` with settings from the platform config
    /// directory.
    pub fn new(db_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_settings_path(db_path, None)
    }

    pub fn with_settings_path(db_path: &str, settings_path: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        Self::build(Database::open(db_path)?, settings_path)
    }

    /// App backed by an in-memory database, for tests and throwaway windows.
    pub fn in_memory(settings_path: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        Self::build(Database::open_in_memory()?, settings_path)
    }

    fn build(db: Database, settings_path: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Arc::new(db);

        let mut settings_engine = SettingsEngine::new(settings_path);
        if let Err(e) = settings_engine.load() {
            log::warn!("Using default settings, could not load {}: {}", settings_engine.get_config_path(), e);
        }
        let settings = settings_engine.get_settings().clone();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tabspace-io")
            .enable_all()
            .build()?;

        let space_manager = SpaceManager::load(Box::new(SqliteTabStore::new(db.clone())))?;

        let (alert_tx, alerts) = mpsc::unbounded_channel();
        let undo_manager = TabUndoManager::new()
            .with_max_stack_size(settings.tabs.undo_stack_size)
            .with_alert_sender(alert_tx);

        let (favicon_tx, favicon_updates) = mpsc::unbounded_channel();
        let favicon_service = FaviconService::new(&settings.favicons, runtime.handle().clone(), favicon_tx);
        let page_suspension = PageSuspension::from_settings(&settings.performance);

        Ok(Self {
            db,
            space_manager,
            undo_manager,
            settings_engine,
            page_suspension,
            favicon_service,
            favicon_updates,
            alerts,
            runtime,
        })
    }

    /// Makes sure there is at least one space and that every space's current
    /// tab is loaded.
    pub fn startup(&mut self) {
        if self.space_manager.spaces().is_empty() {
            self.space_manager
                .create_space(DEFAULT_SPACE_NAME, "person", Vec::new(), "light");
        }
        let ids: Vec<SpaceId> = self.space_manager.spaces().iter().map(|s| s.id).collect();
        for id in ids {
            self.ensure_current_loaded(id);
        }
        log::info!("Started with {} spaces", self.space_manager.spaces().len());
    }

    pub fn default_space_id(&self) -> Option<SpaceId> {
        self.space_manager.spaces().first().map(|s| s.id)
    }

    /// Re-reads the settings into the undo manager and services.
    pub fn apply_settings(&mut self) {
        let settings = self.settings_engine.get_settings().clone();
        self.undo_manager.set_max_stack_size(settings.tabs.undo_stack_size);
        self.page_suspension.configure(
            settings.performance.automatic_page_suspension,
            Duration::from_secs(u64::from(settings.performance.tab_suspend_timeout_minutes) * 60),
        );
        self.favicon_service.configure(&settings.favicons);
    }

    // --- tabs ---

    /// Opens `url` at the end of the space. A selected tab becomes current,
    /// a background tab stays loaded.
    pub fn open_tab(&mut self, space_id: SpaceId, url: &str, title: &str, select: bool) -> Result<TabId, TabError> {
        let order = self
            .space_manager
            .space(space_id)
            .map(|s| s.tab_count())
            .ok_or_else(|| TabError::SpaceNotFound(space_id.to_string()))?;
        let tab = Tab::new(title, url, order, space_id);
        let tab_id = self.space_manager.open_new_tab(space_id, tab, select)?;
        self.space_manager.load_tab(tab_id)?;
        self.page_suspension.start(tab_id, Instant::now());
        self.favicon_service.update_favicon(tab_id, url);
        Ok(tab_id)
    }

    pub fn duplicate_tab(&mut self, tab_id: TabId) -> Result<TabId, TabError> {
        let copy = self.space_manager.duplicate_tab(tab_id)?;
        self.space_manager.load_tab(copy)?;
        self.page_suspension.start(copy, Instant::now());
        Ok(copy)
    }

    /// Selects a tab and loads it if it was suspended.
    pub fn select_tab(&mut self, tab_id: TabId) -> Result<(), TabError> {
        self.space_manager.select_tab(tab_id)?;
        self.space_manager.load_tab(tab_id)?;
        self.page_suspension.start(tab_id, Instant::now());
        Ok(())
    }

    /// Records a finished navigation and refreshes the favicon.
    pub fn navigate(&mut self, tab_id: TabId, url: &str, title: &str) -> Result<(), TabError> {
        self.space_manager.update_tab_location(tab_id, url, title)?;
        self.page_suspension.reset(tab_id, Instant::now());
        self.favicon_service.update_favicon(tab_id, url);
        Ok(())
    }

    pub fn unload_tab(&mut self, tab_id: TabId) -> Result<bool, TabError> {
        self.page_suspension.cancel(tab_id);
        self.space_manager.unload_tab(tab_id)
    }

    pub fn close_tab(&mut self, tab_id: TabId) -> Result<(), TabError> {
        let space_id = self
            .space_manager
            .find_tab(tab_id)
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))?;
        self.space_manager.close_tab(space_id, tab_id, &mut self.undo_manager)?;
        self.forget_tab(tab_id);
        self.ensure_current_loaded(space_id);
        Ok(())
    }

    pub fn clear_space(&mut self, space_id: SpaceId, delete_current: bool) -> Result<bool, TabError> {
        let before = self.tab_ids(space_id);
        let changed = self.space_manager.clear(space_id, delete_current, &mut self.undo_manager)?;
        self.after_batch_close(space_id, before);
        Ok(changed)
    }

    pub fn close_tabs_above(&mut self, tab_id: TabId) -> Result<bool, TabError> {
        let space_id = self
            .space_manager
            .find_tab(tab_id)
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))?;
        let before = self.tab_ids(space_id);
        let changed = self.space_manager.close_tabs_above(space_id, tab_id, &mut self.undo_manager)?;
        self.after_batch_close(space_id, before);
        Ok(changed)
    }

    pub fn close_tabs_below(&mut self, tab_id: TabId) -> Result<bool, TabError> {
        let space_id = self
            .space_manager
            .find_tab(tab_id)
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))?;
        let before = self.tab_ids(space_id);
        let changed = self.space_manager.close_tabs_below(space_id, tab_id, &mut self.undo_manager)?;
        self.after_batch_close(space_id, before);
        Ok(changed)
    }

    pub fn remove_space(&mut self, space_id: SpaceId) -> Result<(), TabError> {
        for tab_id in self.tab_ids(space_id) {
            self.forget_tab(tab_id);
        }
        self.space_manager.remove_space(space_id)
    }

    // --- undo / redo ---

    pub fn undo(&mut self) -> Option<ActionAlert> {
        let alert = self.undo_manager.undo(&mut self.space_manager);
        self.sync_all_current();
        alert
    }

    pub fn redo(&mut self) -> Option<ActionAlert> {
        let alert = self.undo_manager.redo(&mut self.space_manager);
        self.sync_all_current();
        alert
    }

    /// Alerts emitted by undo/redo since the last call.
    pub fn drain_alerts(&mut self) -> Vec<ActionAlert> {
        let mut alerts = Vec::new();
        while let Ok(alert) = self.alerts.try_recv() {
            alerts.push(alert);
        }
        alerts
    }

    // --- background work ---

    /// Applies favicons that arrived since the last call, skipping stale ones.
    /// Returns how many were applied.
    pub fn apply_pending_favicons(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.favicon_updates.try_recv() {
            if !self.favicon_service.is_latest(&update) {
                log::debug!("Ignoring stale favicon for tab {}", update.tab_id);
                continue;
            }
            if self.space_manager.apply_favicon(update.tab_id, update.bytes) {
                applied += 1;
            }
        }
        applied
    }

    /// Periodic housekeeping. Returns the tabs suspended at `now`.
    pub fn tick(&mut self, now: Instant) -> Vec<TabId> {
        self.apply_pending_favicons();
        self.page_suspension.poll(now, &mut self.space_manager)
    }

    /// Waits for a future on the app's runtime. Only for callers outside any
    /// async context (the demo binary, tests).
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Flushes every space to the store.
    pub fn shutdown(&mut self) {
        let ids: Vec<SpaceId> = self.space_manager.spaces().iter().map(|s| s.id).collect();
        for id in ids {
            self.space_manager.persist_space(id);
        }
        log::info!("Shut down");
    }

    // --- helpers ---

    fn tab_ids(&self, space_id: SpaceId) -> Vec<TabId> {
        self.space_manager
            .space(space_id)
            .map(|s| s.tabs().iter().map(|t| t.id).collect())
            .unwrap_or_default()
    }

    fn forget_tab(&mut self, tab_id: TabId) {
        self.page_suspension.cancel(tab_id);
        self.favicon_service.cancel(tab_id);
    }

    fn after_batch_close(&mut self, space_id: SpaceId, before: Vec<TabId>) {
        for tab_id in before {
            if self.space_manager.find_tab(tab_id).is_none() {
                self.forget_tab(tab_id);
            }
        }
        self.ensure_current_loaded(space_id);
    }

    fn sync_all_current(&mut self) {
        let ids: Vec<SpaceId> = self.space_manager.spaces().iter().map(|s| s.id).collect();
        for id in ids {
            self.ensure_current_loaded(id);
        }
    }

    fn ensure_current_loaded(&mut self, space_id: SpaceId) {
        let Some(current) = self.space_manager.space(space_id).and_then(|s| s.current_tab_id()) else {
            return;
        };
        match self.space_manager.load_tab(current) {
            Ok(true) => self.page_suspension.start(current, Instant::now()),
            Ok(false) => {}
            Err(e) => log::warn!("Could not load current tab {}: {}", current, e),
        }
    }
}
