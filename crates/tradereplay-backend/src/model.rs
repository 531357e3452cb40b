//! Rows of the remote `trade_replays` table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tradereplay_protocols::{Direction, TradeRecord, Trigger};

/// A stored trade as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReplay {
    pub id: String,
    pub user_id: String,
    pub platform: String,
    pub instrument: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub trade_date: String,
    pub trade_time: String,
    #[serde(default)]
    pub trigger: Trigger,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub recording_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TradeReplay {
    /// Points gained (positive) or lost (negative); `None` for UNKNOWN.
    pub fn points(&self) -> Option<f64> {
        self.direction.signed_move(self.entry_price, self.exit_price)
    }

    pub fn has_recording(&self) -> bool {
        self.recording_url.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// Sort key: date then time, as stored.
    pub fn sort_key(&self) -> (&str, &str) {
        (&self.trade_date, &self.trade_time)
    }
}

/// Insert payload. `user_id` is filled in by the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTradeReplay {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    pub platform: String,
    pub instrument: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub trade_date: String,
    pub trade_time: String,
    pub trigger: Trigger,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_url: Option<String>,
}

impl From<&TradeRecord> for NewTradeReplay {
    fn from(trade: &TradeRecord) -> Self {
        Self {
            user_id: String::new(),
            platform: trade.platform.clone(),
            instrument: trade.instrument.clone(),
            direction: trade.direction,
            entry_price: trade.entry_price,
            exit_price: trade.exit_price,
            trade_date: trade.trade_date.clone(),
            trade_time: trade.trade_time.clone(),
            trigger: trade.trigger,
            notes: trade.notes.clone(),
            recording_url: None,
        }
    }
}
