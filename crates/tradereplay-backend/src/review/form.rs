//! Manual trade entry.

use chrono::{NaiveDate, NaiveTime};
use tracing::info;

use tradereplay_protocols::{BackendError, Direction, Trigger};

use crate::client::BackendClient;
use crate::model::{NewTradeReplay, TradeReplay};

const MANUAL_PLATFORM: &str = "manual";

/// A file attached to a manual entry, typically a screen recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// The manual entry form as typed by the user. Prices, date and time are
/// kept as text until validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualTradeForm {
    pub instrument: String,
    pub direction: Option<Direction>,
    pub entry_price: String,
    pub exit_price: String,
    pub trade_date: String,
    pub trade_time: String,
    pub notes: String,
    pub attachment: Option<Attachment>,
}

fn invalid(message: impl Into<String>) -> BackendError {
    BackendError::Validation(message.into())
}

fn parse_price(field: &str, raw: &str) -> Result<f64, BackendError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid(format!("{} must be a number", field)))?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(format!("{} must be a positive number", field)));
    }
    Ok(value)
}

impl ManualTradeForm {
    /// Check required fields and build the insert payload.
    pub fn validate(&self) -> Result<NewTradeReplay, BackendError> {
        let instrument = self.instrument.trim();
        if instrument.is_empty() {
            return Err(invalid("instrument is required"));
        }

        let direction = match self.direction {
            Some(d @ (Direction::Buy | Direction::Sell)) => d,
            _ => return Err(invalid("direction must be BUY or SELL")),
        };

        let entry_price = parse_price("entry price", &self.entry_price)?;
        let exit_price = parse_price("exit price", &self.exit_price)?;

        let date = NaiveDate::parse_from_str(self.trade_date.trim(), "%Y-%m-%d")
            .map_err(|_| invalid("trade date must be YYYY-MM-DD"))?;
        let time_raw = self.trade_time.trim();
        let time = NaiveTime::parse_from_str(time_raw, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(time_raw, "%H:%M"))
            .map_err(|_| invalid("trade time must be HH:MM or HH:MM:SS"))?;

        Ok(NewTradeReplay {
            user_id: String::new(),
            platform: MANUAL_PLATFORM.to_string(),
            instrument: instrument.to_uppercase(),
            direction,
            entry_price,
            exit_price,
            trade_date: date.format("%Y-%m-%d").to_string(),
            trade_time: time.format("%H:%M:%S").to_string(),
            trigger: Trigger::ManualEntry,
            notes: self.notes.trim().to_string(),
            recording_url: None,
        })
    }

    /// Validate, upload the attachment if any, then create the trade.
    /// Nothing is uploaded when validation fails.
    pub async fn submit(&self, client: &BackendClient) -> Result<TradeReplay, BackendError> {
        let mut trade = self.validate()?;

        if let Some(attachment) = &self.attachment {
            let url = client
                .upload_file(
                    &attachment.filename,
                    &attachment.content_type,
                    attachment.bytes.clone(),
                )
                .await?;
            trade.recording_url = Some(url);
        }

        let created = client.create_trade(&trade).await?;
        info!("Manual trade {} created", created.id);
        Ok(created)
    }
}

#[cfg(test)]
#[path = "form_tests.rs"]
mod tests;
