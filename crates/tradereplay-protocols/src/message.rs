//! Message envelope exchanged between extension contexts.
//!
//! Requests and pushes are internally tagged by a `type` field using
//! SCREAMING_SNAKE_CASE tags (`PING`, `TRADE_DETECTED`, ...). Responses are
//! `{ "success": bool, ...result }` or `{ "success": false, "error": "..." }`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;
use crate::types::{ScreenshotRecord, TabId, TabInfo, TradeDraft, TradeRecord};

/// Request sent to the background coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    Ping,
    ContentScriptReady {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        platform: Option<String>,
    },
    GetRecordingStatus,
    /// Flip the recording flag, or set it when `is_recording` is given.
    ToggleRecording {
        #[serde(default, rename = "isRecording", skip_serializing_if = "Option::is_none")]
        is_recording: Option<bool>,
    },
    TradeDetected {
        #[serde(default)]
        trade: TradeDraft,
    },
    CaptureScreenshot {
        #[serde(default, rename = "tabId", skip_serializing_if = "Option::is_none")]
        tab_id: Option<TabId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    GetTrades,
    GetScreenshots,
    ClearTrades,
    DiagnosticPing,
}

impl Request {
    /// Wire tag of this request, used in logs and timeout errors.
    pub fn tag(&self) -> &'static str {
        match self {
            Request::Ping => "PING",
            Request::ContentScriptReady { .. } => "CONTENT_SCRIPT_READY",
            Request::GetRecordingStatus => "GET_RECORDING_STATUS",
            Request::ToggleRecording { .. } => "TOGGLE_RECORDING",
            Request::TradeDetected { .. } => "TRADE_DETECTED",
            Request::CaptureScreenshot { .. } => "CAPTURE_SCREENSHOT",
            Request::GetTrades => "GET_TRADES",
            Request::GetScreenshots => "GET_SCREENSHOTS",
            Request::ClearTrades => "CLEAR_TRADES",
            Request::DiagnosticPing => "DIAGNOSTIC_PING",
        }
    }
}

/// Unsolicited notification from the coordinator to other contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Push {
    RecordingStatusUpdate {
        #[serde(rename = "isRecording")]
        is_recording: bool,
    },
    TradesUpdated {
        trade: TradeRecord,
        #[serde(rename = "tradeCount")]
        trade_count: usize,
    },
}

/// Where a request came from. Popup and other extension pages have no tab.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sender {
    #[serde(default)]
    pub tab: Option<TabInfo>,
}

impl Sender {
    pub fn popup() -> Self {
        Self { tab: None }
    }

    pub fn tab(tab: TabInfo) -> Self {
        Self { tab: Some(tab) }
    }

    pub fn tab_id(&self) -> Option<TabId> {
        self.tab.as_ref().map(|t| t.id)
    }
}

/// Coordinator self-report returned for `DIAGNOSTIC_PING`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub ready: bool,
    pub id: String,
    pub is_recording: bool,
    pub registered_tabs: Vec<TabId>,
    pub trade_count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Result payload of a successful response.
///
/// Untagged: the variant is recognised by its field names, so variants with
/// more required fields come first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Diagnostics(Diagnostics),
    Pong {
        ready: bool,
        id: String,
    },
    Registered {
        registered: bool,
    },
    Recording {
        #[serde(rename = "isRecording")]
        is_recording: bool,
    },
    Trade {
        trade: TradeRecord,
    },
    Trades {
        trades: Vec<TradeRecord>,
    },
    Screenshot {
        #[serde(rename = "dataUrl")]
        data_url: String,
    },
    Screenshots {
        screenshots: Vec<ScreenshotRecord>,
    },
    Cleared {
        cleared: usize,
    },
    Empty {},
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub body: ResponseBody,
}

impl Response {
    pub fn ok(body: ResponseBody) -> Self {
        Self {
            success: true,
            error: None,
            body,
        }
    }

    /// Soft failure: handled, but unsuccessful, with no error text.
    pub fn declined(body: ResponseBody) -> Self {
        Self {
            success: false,
            error: None,
            body,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            body: ResponseBody::Empty {},
        }
    }

    /// Turn `success: false` into [`ChannelError::Rejected`].
    pub fn into_result(self) -> Result<ResponseBody, ChannelError> {
        if self.success {
            Ok(self.body)
        } else {
            Err(ChannelError::Rejected(
                self.error.unwrap_or_else(|| "request declined".to_string()),
            ))
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
