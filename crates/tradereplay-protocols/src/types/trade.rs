//! Trade records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TabInfo;

/// Direction of a trade. Detectors may not be able to tell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
    #[default]
    Unknown,
}

impl Direction {
    /// Price move in the trade's favour, `None` when the direction is unknown.
    pub fn signed_move(&self, entry: f64, exit: f64) -> Option<f64> {
        match self {
            Direction::Buy => Some(exit - entry),
            Direction::Sell => Some(entry - exit),
            Direction::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
            Direction::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What produced a trade record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    #[default]
    ButtonClick,
    PositionChange,
    ManualEntry,
}

/// A captured trade. Immutable once appended to the trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: String,
    pub platform: String,
    pub instrument: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub trade_date: String,
    pub trade_time: String,
    pub trigger: Trigger,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub notes: String,
    pub timestamp: DateTime<Utc>,
}

impl TradeRecord {
    /// Finalize a detector or manual draft.
    ///
    /// The draft's id is kept when present, otherwise one is generated.
    /// `url` and `title` come from the calling tab when there is one.
    pub fn from_draft(draft: TradeDraft, tab: Option<&TabInfo>, now: DateTime<Utc>) -> Self {
        let id = draft
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("trade_{}", uuid::Uuid::new_v4()));

        let url = tab
            .map(|t| t.url.clone())
            .or(draft.url)
            .unwrap_or_default();
        let title = tab
            .map(|t| t.title.clone())
            .filter(|t| !t.is_empty())
            .or(draft.title);

        Self {
            id,
            platform: draft.platform.unwrap_or_else(|| "unknown".to_string()),
            instrument: draft.instrument.unwrap_or_else(|| "UNKNOWN".to_string()),
            direction: draft.direction.unwrap_or_default(),
            entry_price: draft.entry_price.unwrap_or(0.0),
            exit_price: draft.exit_price.unwrap_or(0.0),
            trade_date: draft
                .trade_date
                .unwrap_or_else(|| now.format("%Y-%m-%d").to_string()),
            trade_time: draft
                .trade_time
                .unwrap_or_else(|| now.format("%H:%M:%S").to_string()),
            trigger: draft.trigger.unwrap_or_default(),
            url,
            title,
            notes: draft.notes.unwrap_or_default(),
            timestamp: now,
        }
    }

    /// Points gained (positive) or lost (negative).
    pub fn points(&self) -> Option<f64> {
        self.direction.signed_move(self.entry_price, self.exit_price)
    }
}

/// Trade-shaped data as produced by a detector or typed in by a user.
/// Every field is optional; missing values are filled when the draft is
/// recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TradeDraft {
    pub fn new(instrument: impl Into<String>, direction: Direction) -> Self {
        Self {
            instrument: Some(instrument.into()),
            direction: Some(direction),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_prices(mut self, entry: f64, exit: f64) -> Self {
        self.entry_price = Some(entry);
        self.exit_price = Some(exit);
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }
}

#[cfg(test)]
#[path = "trade_tests.rs"]
mod tests;
