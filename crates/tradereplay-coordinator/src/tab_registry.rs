//! In-memory registry of tabs with a live content agent.
//!
//! A tab is either unregistered or registered. It becomes registered on a
//! `CONTENT_SCRIPT_READY` message and unregistered on close, on
//! navigation-complete, or when a push to it fails. Nothing is persisted.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use tradereplay_protocols::TabId;

/// A registered content agent.
#[derive(Debug, Clone, PartialEq)]
pub struct TabEntry {
    pub platform: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct TabRegistry {
    tabs: DashMap<TabId, TabEntry>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register) a tab. Returns true if it was not registered.
    pub fn register(&self, tab_id: TabId, platform: impl Into<String>) -> bool {
        let entry = TabEntry {
            platform: platform.into(),
            registered_at: Utc::now(),
        };
        self.tabs.insert(tab_id, entry).is_none()
    }

    /// Remove a tab. Returns true if it was registered.
    pub fn unregister(&self, tab_id: TabId) -> bool {
        self.tabs.remove(&tab_id).is_some()
    }

    pub fn contains(&self, tab_id: TabId) -> bool {
        self.tabs.contains_key(&tab_id)
    }

    pub fn get(&self, tab_id: TabId) -> Option<TabEntry> {
        self.tabs.get(&tab_id).map(|e| e.clone())
    }

    /// Registered tab ids in ascending order.
    pub fn tab_ids(&self) -> Vec<TabId> {
        let mut ids: Vec<TabId> = self.tabs.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}
