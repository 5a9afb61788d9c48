// Tabspace favicon service
// Fetches a site icon for a tab from a favicon web service keyed by host.
// Fetches run on the tokio runtime; results come back through a channel and
// are applied by the owner of the spaces.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use reqwest::Url;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

use crate::types::errors::FaviconError;
use crate::types::settings::FaviconSettings;
use crate::types::tab::TabId;

/// A fetched icon, tagged with the request generation it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct FaviconUpdate {
    pub tab_id: TabId,
    pub generation: u64,
    pub bytes: Vec<u8>,
}

/// Fire-and-forget favicon fetcher.
///
/// Every request takes a fresh generation from a service-wide counter and
/// records it as its tab's latest. Only an update whose generation is still
/// the latest should be applied; older fetches that finish late are ignored.
/// Generations are never reused, so a tab that was cancelled and requested
/// again cannot accept a fetch from before the cancel.
pub struct FaviconService {
    client: reqwest::Client,
    enabled: bool,
    service_url: String,
    size: u32,
    runtime: Handle,
    next_generation: AtomicU64,
    generations: Arc<Mutex<HashMap<TabId, u64>>>,
    updates: UnboundedSender<FaviconUpdate>,
}

impl FaviconService {
    pub fn new(settings: &FaviconSettings, runtime: Handle, updates: UnboundedSender<FaviconUpdate>) -> Self {
        Self {
            client: reqwest::Client::new(),
            enabled: settings.enabled,
            service_url: settings.service_url.clone(),
            size: settings.size,
            runtime,
            next_generation: AtomicU64::new(1),
            generations: Arc::new(Mutex::new(HashMap::new())),
            updates,
        }
    }

    pub fn configure(&mut self, settings: &FaviconSettings) {
        self.enabled = settings.enabled;
        self.service_url = settings.service_url.clone();
        self.size = settings.size;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Service URL asking for the icon of `page_url`'s host.
    pub fn request_url(&self, page_url: &str) -> Result<Url, FaviconError> {
        let page = Url::parse(page_url).map_err(|e| FaviconError::InvalidUrl(format!("{}: {}", page_url, e)))?;
        let host = page
            .host_str()
            .ok_or_else(|| FaviconError::InvalidUrl(format!("{} has no host", page_url)))?;
        Url::parse_with_params(&self.service_url, &[("domain", host.to_string()), ("sz", self.size.to_string())])
            .map_err(|e| FaviconError::InvalidUrl(format!("{}: {}", self.service_url, e)))
    }

    /// Checks that `bytes` decode as an image.
    pub fn validate_image(bytes: &[u8]) -> Result<(), FaviconError> {
        image::load_from_memory(bytes)
            .map(|_| ())
            .map_err(|e| FaviconError::InvalidImage(e.to_string()))
    }

    async fn fetch(client: reqwest::Client, url: Url) -> Result<Vec<u8>, FaviconError> {
        let response = client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FaviconError::NetworkError(e.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FaviconError::NetworkError(e.to_string()))?;
        Self::validate_image(&bytes)?;
        Ok(bytes.to_vec())
    }

    /// Fetches and validates the icon for `page_url` right away.
    pub async fn fetch_icon(&self, page_url: &str) -> Result<Vec<u8>, FaviconError> {
        let url = self.request_url(page_url)?;
        Self::fetch(self.client.clone(), url).await
    }

    /// Starts a background fetch for `tab_id` and returns its generation.
    /// Returns `None` when fetching is disabled or the URL has no host.
    pub fn update_favicon(&self, tab_id: TabId, page_url: &str) -> Option<u64> {
        if !self.enabled {
            return None;
        }
        let url = match self.request_url(page_url) {
            Ok(url) => url,
            Err(e) => {
                log::debug!("No favicon for tab {}: {}", tab_id, e);
                return None;
            }
        };

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        {
            let mut generations = match self.generations.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            generations.insert(tab_id, generation);
        }

        let client = self.client.clone();
        let updates = self.updates.clone();
        self.runtime.spawn(async move {
            match Self::fetch(client, url).await {
                Ok(bytes) => {
                    let update = FaviconUpdate {
                        tab_id,
                        generation,
                        bytes,
                    };
                    if updates.send(update).is_err() {
                        log::debug!("Favicon receiver dropped for tab {}", tab_id);
                    }
                }
                Err(e) => log::warn!("Favicon fetch for tab {} failed: {}", tab_id, e),
            }
        });
        Some(generation)
    }

    /// Whether `update` answers the most recent request for its tab.
    pub fn is_latest(&self, update: &FaviconUpdate) -> bool {
        self.generations
            .lock()
            .ok()
            .and_then(|g| g.get(&update.tab_id).copied())
            == Some(update.generation)
    }

    /// Forgets a tab so that any fetch still in flight for it is ignored.
    pub fn cancel(&self, tab_id: TabId) {
        if let Ok(mut generations) = self.generations.lock() {
            generations.remove(&tab_id);
        }
    }
}
