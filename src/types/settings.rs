use serde::{Deserialize, Serialize};

/// Top-level settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BrowserSettings {
    #[serde(default)]
    pub tabs: TabSettings,
    #[serde(default)]
    pub performance: PerformanceSettings,
    #[serde(default)]
    pub favicons: FaviconSettings,
}

/// Tab behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TabSettings {
    /// How many closed-tab commands can be undone.
    pub undo_stack_size: usize,
}

impl Default for TabSettings {
    fn default() -> Self {
        Self { undo_stack_size: 20 }
    }
}

/// Performance tuning settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceSettings {
    pub automatic_page_suspension: bool,
    pub tab_suspend_timeout_minutes: u32,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            automatic_page_suspension: true,
            tab_suspend_timeout_minutes: 30,
        }
    }
}

/// Favicon fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FaviconSettings {
    pub enabled: bool,
    pub service_url: String,
    pub size: u32,
}

impl Default for FaviconSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            service_url: "https://www.google.com/s2/favicons".to_string(),
            size: 256,
        }
    }
}
