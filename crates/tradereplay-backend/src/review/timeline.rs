//! Auto-refreshing trade timeline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::TradeSource;
use crate::model::TradeReplay;

/// Polls a [`TradeSource`] on a fixed interval and publishes the list,
/// newest first, whenever it changes.
pub struct TimelinePoller {
    source: Arc<dyn TradeSource>,
    interval: Duration,
}

impl TimelinePoller {
    pub fn new(source: Arc<dyn TradeSource>, interval: Duration) -> Self {
        Self { source, interval }
    }

    /// Fetch once, sorted newest first.
    pub async fn fetch(&self) -> Result<Vec<TradeReplay>, tradereplay_protocols::BackendError> {
        let mut trades = self.source.list_trades().await?;
        trades.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        Ok(trades)
    }

    /// Start polling until `cancel` fires. Fetch failures keep the last
    /// published list.
    pub fn spawn(
        self,
        cancel: CancellationToken,
    ) -> (watch::Receiver<Vec<TradeReplay>>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(Vec::new());
        let task = tokio::spawn(async move {
            loop {
                match self.fetch().await {
                    Ok(trades) => {
                        tx.send_if_modified(|current| {
                            if *current == trades {
                                false
                            } else {
                                debug!("Timeline updated: {} trades", trades.len());
                                *current = trades;
                                true
                            }
                        });
                    }
                    Err(e) => warn!("Timeline refresh failed: {}", e),
                }

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.interval) => {}
                }
            }
            debug!("Timeline poller stopped");
        });
        (rx, task)
    }
}
