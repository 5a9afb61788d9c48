use std::fmt;
use std::sync::Arc;

use super::tab::Tab;

/// The live page-rendering surface behind a loaded tab.
///
/// The core never inspects a renderer; it only reloads it, tears it down when
/// the tab is unloaded or closed, and asks whether it is currently playing
/// media or capturing the camera/microphone (which blocks automatic suspension).
pub trait PageRenderer {
    fn reload(&self, url: &str);
    fn teardown(&self);
    fn is_media_active(&self) -> bool {
        false
    }
}

/// Creates renderers for tabs as they become loaded.
pub trait RendererFactory {
    fn instantiate(&self, tab: &Tab) -> Arc<dyn PageRenderer>;
}

/// Shared handle to a tab's renderer.
#[derive(Clone)]
pub struct RendererHandle(Arc<dyn PageRenderer>);

impl RendererHandle {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self(renderer)
    }

    pub fn reload(&self, url: &str) {
        self.0.reload(url);
    }

    pub fn teardown(&self) {
        self.0.teardown();
    }

    pub fn is_media_active(&self) -> bool {
        self.0.is_media_active()
    }
}

impl fmt::Debug for RendererHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RendererHandle(..)")
    }
}
