use serde::{Deserialize, Serialize};

/// Transient on-screen notification produced by undo/redo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionAlert {
    pub message: String,
    pub system_image: String,
}

impl ActionAlert {
    pub fn new(message: impl Into<String>, system_image: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            system_image: system_image.into(),
        }
    }
}
