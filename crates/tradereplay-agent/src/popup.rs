//! Popup controller.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use tradereplay_protocols::message::Diagnostics;
use tradereplay_protocols::{
    ChannelError, MessageChannel, Request, ResponseBody, TabId, TradeRecord,
};

use crate::client::AgentClient;
use crate::status::StatusMessage;

const RELOAD_REQUIRED: &str = "Extension was reloaded. Close and reopen this popup.";

/// Connection state as shown in the popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopupState {
    #[default]
    Unknown,
    Connected,
    Disconnected,
    /// The extension was reloaded under us. Terminal: nothing is sent any
    /// more and the user is told to reopen the popup.
    ContextInvalidated,
}

/// Thin request layer for the toolbar popup.
pub struct PopupController {
    client: AgentClient,
    state: Mutex<PopupState>,
    status: Mutex<Option<StatusMessage>>,
}

impl PopupController {
    pub fn new(channel: Arc<dyn MessageChannel>, timeout: Duration) -> Self {
        Self {
            client: AgentClient::new(channel, timeout),
            state: Mutex::new(PopupState::Unknown),
            status: Mutex::new(None),
        }
    }

    pub fn state(&self) -> PopupState {
        *self.state.lock()
    }

    /// The latest status message, if any.
    pub fn status(&self) -> Option<StatusMessage> {
        self.status.lock().clone()
    }

    fn show(&self, message: StatusMessage) {
        debug!("Popup status: {}", message);
        *self.status.lock() = Some(message);
    }

    async fn call(&self, request: Request) -> Result<ResponseBody, ChannelError> {
        if self.state() == PopupState::ContextInvalidated {
            return Err(ChannelError::ContextInvalidated);
        }

        let tag = request.tag();
        let result = self.client.request(request).await;
        let next = match &result {
            Ok(_) | Err(ChannelError::Rejected(_)) => PopupState::Connected,
            Err(e) if e.is_terminal() => {
                warn!("Extension context invalidated during {}", tag);
                self.show(StatusMessage::error(RELOAD_REQUIRED));
                PopupState::ContextInvalidated
            }
            Err(e) => {
                warn!("{} failed: {}", tag, e);
                PopupState::Disconnected
            }
        };
        *self.state.lock() = next;
        result
    }

    fn unexpected(request: &str) -> ChannelError {
        ChannelError::UnexpectedResponse {
            request: request.to_string(),
        }
    }

    /// Check the coordinator is alive and read the recording flag.
    pub async fn init(&self) -> Result<bool, ChannelError> {
        match self.call(Request::Ping).await? {
            ResponseBody::Pong { .. } => {}
            _ => return Err(Self::unexpected("PING")),
        }
        self.is_recording().await
    }

    pub async fn is_recording(&self) -> Result<bool, ChannelError> {
        match self.call(Request::GetRecordingStatus).await? {
            ResponseBody::Recording { is_recording } => Ok(is_recording),
            _ => Err(Self::unexpected("GET_RECORDING_STATUS")),
        }
    }

    pub async fn toggle_recording(&self) -> Result<bool, ChannelError> {
        let result = match self.call(Request::ToggleRecording { is_recording: None }).await {
            Ok(ResponseBody::Recording { is_recording }) => Ok(is_recording),
            Ok(_) => Err(Self::unexpected("TOGGLE_RECORDING")),
            Err(e) => Err(e),
        };
        match &result {
            Ok(true) => self.show(StatusMessage::success("Recording started")),
            Ok(false) => self.show(StatusMessage::info("Recording stopped")),
            Err(e) => self.report(e, "Could not toggle recording"),
        }
        result
    }

    /// The most recent `limit` trades, newest first.
    pub async fn recent_trades(&self, limit: usize) -> Result<Vec<TradeRecord>, ChannelError> {
        match self.call(Request::GetTrades).await? {
            ResponseBody::Trades { trades } => {
                Ok(trades.into_iter().rev().take(limit).collect())
            }
            _ => Err(Self::unexpected("GET_TRADES")),
        }
    }

    /// Screenshot the given tab (the active tab when the popup opened).
    pub async fn capture_screenshot(&self, tab_id: Option<TabId>) -> Result<String, ChannelError> {
        let request = Request::CaptureScreenshot {
            tab_id,
            reason: Some("manual".to_string()),
        };
        let result = match self.call(request).await {
            Ok(ResponseBody::Screenshot { data_url }) => Ok(data_url),
            Ok(_) => Err(Self::unexpected("CAPTURE_SCREENSHOT")),
            Err(e) => Err(e),
        };
        match &result {
            Ok(_) => self.show(StatusMessage::success("Screenshot captured")),
            Err(e) => self.report(e, "Screenshot failed"),
        }
        result
    }

    pub async fn clear_trades(&self) -> Result<usize, ChannelError> {
        let result = match self.call(Request::ClearTrades).await {
            Ok(ResponseBody::Cleared { cleared }) => Ok(cleared),
            Ok(_) => Err(Self::unexpected("CLEAR_TRADES")),
            Err(e) => Err(e),
        };
        match &result {
            Ok(n) => self.show(StatusMessage::success(format!("Cleared {} trades", n))),
            Err(e) => self.report(e, "Could not clear trades"),
        }
        result
    }

    pub async fn diagnostics(&self) -> Result<Diagnostics, ChannelError> {
        match self.call(Request::DiagnosticPing).await? {
            ResponseBody::Diagnostics(d) => Ok(d),
            _ => Err(Self::unexpected("DIAGNOSTIC_PING")),
        }
    }

    fn report(&self, error: &ChannelError, action: &str) {
        // The reload notice stays; it is the only useful instruction left.
        if error.is_terminal() {
            return;
        }
        let text = match error {
            ChannelError::Rejected(reason) => format!("{}: {}", action, reason),
            ChannelError::Timeout { .. } => format!("{}: background did not answer", action),
            other => format!("{}: {}", action, other),
        };
        self.show(StatusMessage::error(text));
    }
}

#[cfg(test)]
#[path = "popup_tests.rs"]
mod tests;
