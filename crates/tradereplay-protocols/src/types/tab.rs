//! Browser tab descriptors.

use serde::{Deserialize, Serialize};

/// Host-assigned tab identifier.
pub type TabId = i64;

/// Snapshot of a browser tab as reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: TabId,
    #[serde(default)]
    pub window_id: i64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Active tab within its window.
    #[serde(default)]
    pub active: bool,
    /// Whether the owning window has focus.
    #[serde(default)]
    pub window_focused: bool,
}

impl TabInfo {
    pub fn new(id: TabId, url: impl Into<String>) -> Self {
        Self {
            id,
            window_id: 0,
            url: url.into(),
            title: String::new(),
            active: false,
            window_focused: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_window(mut self, window_id: i64) -> Self {
        self.window_id = window_id;
        self
    }

    /// Mark the tab as the active tab of a focused window.
    pub fn focused(mut self) -> Self {
        self.active = true;
        self.window_focused = true;
        self
    }

    /// A capture only shows this tab if it is active in a focused window.
    pub fn is_visible(&self) -> bool {
        self.active && self.window_focused
    }
}
