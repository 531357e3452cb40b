//! Screenshot records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TabId;

/// Reason tag used when a screenshot is triggered by a detected trade.
pub const REASON_TRADE_DETECTED: &str = "trade_detected";

/// A captured viewport image with the context it was taken in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// `data:image/png;base64,...` URL.
    pub image_data: String,
    pub tab_id: TabId,
    pub reason: String,
    pub url: String,
    pub title: String,
    pub window_id: i64,
}
