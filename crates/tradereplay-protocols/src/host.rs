//! Host browser capabilities used by the coordinator.

use async_trait::async_trait;

use crate::error::{CaptureError, ChannelError};
use crate::message::Push;
use crate::types::{TabId, TabInfo};

/// Tab, capture, badge and notification capabilities of the host browser.
///
/// Implemented by the real extension runtime bridge, and by fakes in tests.
#[async_trait]
pub trait BrowserHost: Send + Sync {
    /// Look up a tab. Fails with [`CaptureError::TabNotFound`] if it is gone.
    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo, CaptureError>;

    /// Make the tab active and focus its window.
    async fn focus_tab(&self, tab: &TabInfo) -> Result<(), CaptureError>;

    /// Capture the visible area of a window as a `data:` URL.
    async fn capture_visible_tab(&self, window_id: i64) -> Result<String, CaptureError>;

    /// Deliver a push to the content agent in a tab.
    async fn send_to_tab(&self, tab_id: TabId, push: Push) -> Result<(), ChannelError>;

    /// Deliver a push to every extension page (popup, options). Having no
    /// listener is reported as an error and is normally ignored.
    async fn broadcast(&self, push: Push) -> Result<(), ChannelError>;

    /// Set the toolbar badge text; empty clears it.
    async fn set_badge_text(&self, text: &str);

    /// Inject the content agent into a tab.
    async fn inject_content_agent(&self, tab_id: TabId) -> Result<(), ChannelError>;
}
