//! Test doubles for the host browser and the clock.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use tradereplay_protocols::{
    BrowserHost, CaptureError, ChannelError, Push, Sleeper, TabId, TabInfo,
};

pub const FAKE_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgo=";

#[derive(Default)]
struct HostState {
    tabs: HashMap<TabId, TabInfo>,
    unreachable: HashSet<TabId>,
    tab_pushes: Vec<(TabId, Push)>,
    broadcasts: Vec<Push>,
    badges: Vec<String>,
    focused: Vec<TabId>,
    injected: Vec<TabId>,
    capture_error: Option<CaptureError>,
}

/// In-memory browser with scripted tabs.
#[derive(Default)]
pub struct FakeHost {
    state: Mutex<HostState>,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_tab(&self, tab: TabInfo) {
        self.state.lock().tabs.insert(tab.id, tab);
    }

    pub fn close_tab(&self, tab_id: TabId) {
        self.state.lock().tabs.remove(&tab_id);
    }

    /// Pushes to this tab fail as if no agent were listening.
    pub fn make_unreachable(&self, tab_id: TabId) {
        self.state.lock().unreachable.insert(tab_id);
    }

    pub fn make_reachable(&self, tab_id: TabId) {
        self.state.lock().unreachable.remove(&tab_id);
    }

    pub fn fail_capture(&self, error: CaptureError) {
        self.state.lock().capture_error = Some(error);
    }

    pub fn tab_pushes(&self) -> Vec<(TabId, Push)> {
        self.state.lock().tab_pushes.clone()
    }

    pub fn broadcasts(&self) -> Vec<Push> {
        self.state.lock().broadcasts.clone()
    }

    pub fn badges(&self) -> Vec<String> {
        self.state.lock().badges.clone()
    }

    pub fn focused(&self) -> Vec<TabId> {
        self.state.lock().focused.clone()
    }

    pub fn injected(&self) -> Vec<TabId> {
        self.state.lock().injected.clone()
    }
}

#[async_trait]
impl BrowserHost for FakeHost {
    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo, CaptureError> {
        self.state
            .lock()
            .tabs
            .get(&tab_id)
            .cloned()
            .ok_or(CaptureError::TabNotFound(tab_id))
    }

    async fn focus_tab(&self, tab: &TabInfo) -> Result<(), CaptureError> {
        let mut state = self.state.lock();
        state.focused.push(tab.id);
        if let Some(t) = state.tabs.get_mut(&tab.id) {
            t.active = true;
            t.window_focused = true;
        }
        Ok(())
    }

    async fn capture_visible_tab(&self, _window_id: i64) -> Result<String, CaptureError> {
        match self.state.lock().capture_error.clone() {
            Some(e) => Err(e),
            None => Ok(FAKE_DATA_URL.to_string()),
        }
    }

    async fn send_to_tab(&self, tab_id: TabId, push: Push) -> Result<(), ChannelError> {
        let mut state = self.state.lock();
        if state.unreachable.contains(&tab_id) {
            return Err(ChannelError::Disconnected(
                "Could not establish connection. Receiving end does not exist.".into(),
            ));
        }
        state.tab_pushes.push((tab_id, push));
        Ok(())
    }

    async fn broadcast(&self, push: Push) -> Result<(), ChannelError> {
        self.state.lock().broadcasts.push(push);
        Ok(())
    }

    async fn set_badge_text(&self, text: &str) {
        self.state.lock().badges.push(text.to_string());
    }

    async fn inject_content_agent(&self, tab_id: TabId) -> Result<(), ChannelError> {
        self.state.lock().injected.push(tab_id);
        Ok(())
    }
}

/// Records requested delays and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().push(duration);
    }
}
