use std::fmt;

// === TabError ===

/// Errors related to tab and space operations.
#[derive(Debug, PartialEq)]
pub enum TabError {
    /// Tab with the given ID was not found.
    NotFound(String),
    /// Space with the given ID was not found.
    SpaceNotFound(String),
    /// The provided tab index is out of bounds.
    InvalidIndex(usize),
    /// A reordering did not contain exactly the tabs of the space.
    InvalidOrder(String),
}

impl fmt::Display for TabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabError::NotFound(id) => write!(f, "Tab not found: {}", id),
            TabError::SpaceNotFound(id) => write!(f, "Space not found: {}", id),
            TabError::InvalidIndex(index) => write!(f, "Invalid tab index: {}", index),
            TabError::InvalidOrder(msg) => write!(f, "Invalid tab order: {}", msg),
        }
    }
}

impl std::error::Error for TabError {}

// === StoreError ===

/// Errors raised by the tab persistence store.
#[derive(Debug, PartialEq)]
pub enum StoreError {
    /// Database operation failed.
    DatabaseError(String),
    /// Failed to serialize or deserialize a stored value.
    SerializationError(String),
    /// A stored row could not be turned back into a tab or space.
    CorruptRow(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DatabaseError(msg) => write!(f, "Store database error: {}", msg),
            StoreError::SerializationError(msg) => {
                write!(f, "Store serialization error: {}", msg)
            }
            StoreError::CorruptRow(msg) => write!(f, "Corrupt stored row: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

// === FaviconError ===

/// Errors related to favicon fetching.
#[derive(Debug, PartialEq)]
pub enum FaviconError {
    /// The page URL has no usable host.
    InvalidUrl(String),
    /// The favicon request failed.
    NetworkError(String),
    /// The response body is not a decodable image.
    InvalidImage(String),
}

impl fmt::Display for FaviconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaviconError::InvalidUrl(url) => write!(f, "Invalid favicon page URL: {}", url),
            FaviconError::NetworkError(msg) => write!(f, "Favicon network error: {}", msg),
            FaviconError::InvalidImage(msg) => write!(f, "Invalid favicon image: {}", msg),
        }
    }
}

impl std::error::Error for FaviconError {}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
