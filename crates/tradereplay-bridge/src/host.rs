//! [`BrowserHost`] over bridge connections.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use tradereplay_protocols::{BrowserHost, CaptureError, ChannelError, Push, TabId, TabInfo};

use crate::BridgeState;

const NO_SCREEN: &str = "the bridge has no access to the browser window";

/// Host capabilities available to a coordinator behind the bridge.
///
/// Tabs are whatever the connected content agents announced in their hello.
/// Focus, capture and injection need the real browser and are unavailable.
pub struct WsHost {
    state: Arc<BridgeState>,
}

impl WsHost {
    pub fn new(state: Arc<BridgeState>) -> Self {
        Self { state }
    }

    /// Current badge text.
    pub fn badge(&self) -> String {
        self.state.badge.lock().clone()
    }
}

#[async_trait]
impl BrowserHost for WsHost {
    async fn get_tab(&self, tab_id: TabId) -> Result<TabInfo, CaptureError> {
        self.state
            .tabs
            .get(&tab_id)
            .and_then(|conn_id| self.state.connections.get(conn_id.value()).and_then(|c| c.tab.clone()))
            .ok_or(CaptureError::TabNotFound(tab_id))
    }

    async fn focus_tab(&self, _tab: &TabInfo) -> Result<(), CaptureError> {
        Err(CaptureError::ApiUnavailable(NO_SCREEN.into()))
    }

    async fn capture_visible_tab(&self, _window_id: i64) -> Result<String, CaptureError> {
        Err(CaptureError::ApiUnavailable(NO_SCREEN.into()))
    }

    async fn send_to_tab(&self, tab_id: TabId, push: Push) -> Result<(), ChannelError> {
        let conn_id = self
            .state
            .tabs
            .get(&tab_id)
            .map(|c| c.value().clone())
            .ok_or_else(|| ChannelError::Disconnected(format!("no content agent in tab {}", tab_id)))?;
        let conn = self
            .state
            .connections
            .get(&conn_id)
            .ok_or_else(|| ChannelError::Disconnected(format!("connection {} closed", conn_id)))?;
        conn.push(push)
    }

    async fn broadcast(&self, push: Push) -> Result<(), ChannelError> {
        let mut delivered = 0;
        for conn in self.state.connections.iter().filter(|c| c.tab.is_none()) {
            if conn.push(push.clone()).is_ok() {
                delivered += 1;
            }
        }
        if delivered == 0 {
            return Err(ChannelError::Disconnected("no extension page is listening".into()));
        }
        debug!("Broadcast delivered to {} pages", delivered);
        Ok(())
    }

    async fn set_badge_text(&self, text: &str) {
        debug!("Badge: '{}'", text);
        *self.state.badge.lock() = text.to_string();
    }

    async fn inject_content_agent(&self, tab_id: TabId) -> Result<(), ChannelError> {
        Err(ChannelError::SendFailed(format!(
            "cannot inject into tab {}: {}",
            tab_id, NO_SCREEN
        )))
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::Connection;

    fn host_with(conns: Vec<Connection>) -> WsHost {
        let state = Arc::new(BridgeState::new());
        for conn in conns {
            if let Some(tab) = &conn.tab {
                state.tabs.insert(tab.id, conn.id.clone());
            }
            state.connections.insert(conn.id.clone(), conn);
        }
        WsHost::new(state)
    }

    #[tokio::test]
    async fn test_get_tab_from_hello() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let tab = TabInfo::new(4, "https://www.tradingview.com/chart");
        let host = host_with(vec![Connection::new("c1", Some(tab.clone()), tx)]);

        assert_eq!(host.get_tab(4).await.unwrap(), tab);
        assert_eq!(host.get_tab(5).await.unwrap_err(), CaptureError::TabNotFound(5));
    }

    #[tokio::test]
    async fn test_send_to_tab_writes_push_frame() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let tab = TabInfo::new(4, "https://www.tradingview.com/chart");
        let host = host_with(vec![Connection::new("c1", Some(tab), tx)]);

        host.send_to_tab(4, Push::RecordingStatusUpdate { is_recording: true })
            .await
            .unwrap();
        let frame: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(
            frame,
            serde_json::json!({"push": {"type": "RECORDING_STATUS_UPDATE", "isRecording": true}})
        );
    }

    #[tokio::test]
    async fn test_send_to_closed_connection_fails() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let tab = TabInfo::new(4, "https://www.tradingview.com/chart");
        let host = host_with(vec![Connection::new("c1", Some(tab), tx)]);

        let err = host
            .send_to_tab(4, Push::RecordingStatusUpdate { is_recording: true })
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::Disconnected(_)));
        assert!(host.send_to_tab(9, Push::RecordingStatusUpdate { is_recording: true }).await.is_err());
    }

    #[tokio::test]
    async fn test_broadcast_reaches_pages_only() {
        let (page_tx, mut page_rx) = mpsc::unbounded_channel();
        let (tab_tx, mut tab_rx) = mpsc::unbounded_channel();
        let host = host_with(vec![
            Connection::new("popup", None, page_tx),
            Connection::new("c1", Some(TabInfo::new(1, "https://tradovate.com")), tab_tx),
        ]);

        host.broadcast(Push::RecordingStatusUpdate { is_recording: false })
            .await
            .unwrap();
        assert!(page_rx.try_recv().is_ok());
        assert!(tab_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_without_listener_errors() {
        let host = host_with(vec![]);
        assert!(host
            .broadcast(Push::RecordingStatusUpdate { is_recording: false })
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_capture_is_unavailable() {
        let host = host_with(vec![]);
        let err = host.capture_visible_tab(1).await.unwrap_err();
        assert!(matches!(err, CaptureError::ApiUnavailable(_)));
        host.set_badge_text("3").await;
        assert_eq!(host.badge(), "3");
    }
}
