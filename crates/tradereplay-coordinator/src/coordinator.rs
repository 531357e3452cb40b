//! Background coordinator.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use tradereplay_config::CoordinatorConfig;
use tradereplay_protocols::error::CaptureError;
use tradereplay_protocols::message::Diagnostics;
use tradereplay_protocols::store::{get_typed, keys, set_typed};
use tradereplay_protocols::{
    BrowserHost, LocalStore, Push, Request, Response, ResponseBody, ScreenshotRecord, Sender,
    Sleeper, TabId, TabInfo, TokioSleeper, TradeDraft, TradeRecord, TradeSink, Trigger,
    REASON_TRADE_DETECTED,
};

use crate::badge::badge_text;
use crate::error::CoordinatorError;
use crate::platform::PlatformMatcher;
use crate::screenshots::append_capped;
use crate::tab_registry::TabRegistry;

/// Reason recorded for captures requested without one.
const DEFAULT_CAPTURE_REASON: &str = "manual";

/// Owns recording state, the trade log, the screenshot ring and the tab
/// registry. All persistence goes through here.
pub struct BackgroundCoordinator {
    id: String,
    store: Arc<dyn LocalStore>,
    host: Arc<dyn BrowserHost>,
    sleeper: Arc<dyn Sleeper>,
    sink: Option<Arc<dyn TradeSink>>,
    config: CoordinatorConfig,
    platforms: PlatformMatcher,
    registry: TabRegistry,
    /// Bumped on every badge update so stale clear timers do nothing.
    badge_generation: Arc<AtomicU64>,
}

impl BackgroundCoordinator {
    pub fn new(
        store: Arc<dyn LocalStore>,
        host: Arc<dyn BrowserHost>,
        config: CoordinatorConfig,
    ) -> Self {
        let platforms = PlatformMatcher::new(config.supported_hosts.iter().cloned());
        Self {
            id: format!("background_{}", uuid::Uuid::new_v4().simple()),
            store,
            host,
            sleeper: Arc::new(TokioSleeper),
            sink: None,
            config,
            platforms,
            registry: TabRegistry::new(),
            badge_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replace the delay source (tests use an instant sleeper).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Forward every recorded trade to a remote sink, best-effort.
    pub fn with_sink(mut self, sink: Arc<dyn TradeSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn registry(&self) -> &TabRegistry {
        &self.registry
    }

    pub fn platforms(&self) -> &PlatformMatcher {
        &self.platforms
    }

    /// Dispatch one request. Every request tag is handled here.
    pub async fn handle(&self, request: Request, sender: &Sender) -> Response {
        debug!(
            "Handling {} from {}",
            request.tag(),
            sender
                .tab_id()
                .map_or_else(|| "extension page".to_string(), |id| format!("tab {}", id))
        );

        match request {
            Request::Ping => {
                let (ready, id) = self.ping();
                Response::ok(ResponseBody::Pong { ready, id })
            }
            Request::ContentScriptReady { platform } => {
                let registered = self.register_content_agent(sender, platform.as_deref());
                let body = ResponseBody::Registered { registered };
                if registered {
                    Response::ok(body)
                } else {
                    Response::declined(body)
                }
            }
            Request::GetRecordingStatus => Response::ok(ResponseBody::Recording {
                is_recording: self.get_recording_state().await,
            }),
            Request::ToggleRecording { is_recording } => Response::ok(ResponseBody::Recording {
                is_recording: self.set_recording_state(is_recording).await,
            }),
            Request::TradeDetected { trade } => match self.record_trade(trade, sender).await {
                Ok(trade) => Response::ok(ResponseBody::Trade { trade }),
                Err(e) => Response::failure(e.to_string()),
            },
            Request::CaptureScreenshot { tab_id, reason } => {
                let tab_id = tab_id.or_else(|| sender.tab_id());
                let reason = reason.as_deref().unwrap_or(DEFAULT_CAPTURE_REASON);
                match self.capture_screenshot(tab_id, reason).await {
                    Ok(data_url) => Response::ok(ResponseBody::Screenshot { data_url }),
                    Err(e) => Response::failure(e.to_string()),
                }
            }
            Request::GetTrades => Response::ok(ResponseBody::Trades {
                trades: self.list_trades().await,
            }),
            Request::GetScreenshots => Response::ok(ResponseBody::Screenshots {
                screenshots: self.list_screenshots().await,
            }),
            Request::ClearTrades => match self.clear_trades().await {
                Ok(cleared) => Response::ok(ResponseBody::Cleared { cleared }),
                Err(e) => Response::failure(e.to_string()),
            },
            Request::DiagnosticPing => {
                Response::ok(ResponseBody::Diagnostics(self.diagnostics().await))
            }
        }
    }

    /// Liveness probe.
    pub fn ping(&self) -> (bool, String) {
        (true, self.id.clone())
    }

    /// Register the sender's tab. Soft-fails when the sender has no tab.
    pub fn register_content_agent(&self, sender: &Sender, platform: Option<&str>) -> bool {
        let Some(tab) = sender.tab.as_ref() else {
            warn!("CONTENT_SCRIPT_READY without a tab, ignoring");
            return false;
        };

        let platform = platform
            .map(str::to_string)
            .or_else(|| self.platforms.platform_for(&tab.url).map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());

        if self.registry.register(tab.id, &platform) {
            info!("Content agent registered in tab {} ({})", tab.id, platform);
        } else {
            debug!("Content agent re-registered in tab {}", tab.id);
        }
        true
    }

    /// Current recording flag; false when unset or unreadable.
    pub async fn get_recording_state(&self) -> bool {
        match get_typed::<bool>(self.store.as_ref(), keys::IS_RECORDING).await {
            Ok(value) => value.unwrap_or(false),
            Err(e) => {
                warn!("Failed to read recording state, assuming off: {}", e);
                false
            }
        }
    }

    /// Set (or flip, when `explicit` is `None`) the recording flag, persist
    /// it and push it to every registered tab on a supported platform.
    ///
    /// Tabs that cannot be reached are evicted from the registry. The new
    /// state is returned whatever happens to the notifications.
    pub async fn set_recording_state(&self, explicit: Option<bool>) -> bool {
        let new_state = match explicit {
            Some(value) => value,
            None => !self.get_recording_state().await,
        };

        if let Err(e) = set_typed(self.store.as_ref(), keys::IS_RECORDING, &new_state).await {
            warn!("Failed to persist recording state: {}", e);
        }
        info!("Recording {}", if new_state { "started" } else { "stopped" });

        self.notify_recording_state(new_state).await;
        new_state
    }

    async fn notify_recording_state(&self, is_recording: bool) {
        for tab_id in self.registry.tab_ids() {
            let tab = match self.host.get_tab(tab_id).await {
                Ok(tab) => tab,
                Err(e) => {
                    warn!("Evicting tab {}: {}", tab_id, e);
                    self.registry.unregister(tab_id);
                    continue;
                }
            };

            if !self.platforms.matches(&tab.url) {
                debug!("Skipping tab {} on unsupported page", tab_id);
                continue;
            }

            let push = Push::RecordingStatusUpdate { is_recording };
            if let Err(e) = self.host.send_to_tab(tab_id, push).await {
                warn!("Evicting tab {} after failed notification: {}", tab_id, e);
                self.registry.unregister(tab_id);
            }
        }
    }

    /// Append a trade to the log.
    ///
    /// Store failures are returned to the caller. Badge, broadcast and
    /// remote sync are best-effort.
    pub async fn record_trade(
        &self,
        mut draft: TradeDraft,
        sender: &Sender,
    ) -> Result<TradeRecord, CoordinatorError> {
        if draft.trigger.is_none() && sender.tab.is_none() {
            draft.trigger = Some(Trigger::ManualEntry);
        }
        let trade = TradeRecord::from_draft(draft, sender.tab.as_ref(), Utc::now());

        let mut trades: Vec<TradeRecord> =
            get_typed(self.store.as_ref(), keys::TRADES).await?.unwrap_or_default();
        trades.push(trade.clone());
        set_typed(self.store.as_ref(), keys::TRADES, &trades).await?;

        let trade_count = trades.len();
        info!(
            "Recorded trade {} {} {} ({} total)",
            trade.id, trade.direction, trade.instrument, trade_count
        );

        self.show_badge(trade_count).await;

        let push = Push::TradesUpdated {
            trade: trade.clone(),
            trade_count,
        };
        if let Err(e) = self.host.broadcast(push).await {
            debug!("No listener for trade update: {}", e);
        }

        if let Some(sink) = self.sink.clone() {
            let remote = trade.clone();
            tokio::spawn(async move {
                if let Err(e) = sink.push_trade(&remote).await {
                    warn!("Remote sync failed for trade {}: {}", remote.id, e);
                }
            });
        }

        Ok(trade)
    }

    /// Show the trade count, then clear it after the configured delay
    /// unless a newer count replaced it.
    async fn show_badge(&self, count: usize) {
        let generation = self.badge_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.host.set_badge_text(&badge_text(count)).await;

        let host = self.host.clone();
        let sleeper = self.sleeper.clone();
        let current = self.badge_generation.clone();
        let delay = self.config.badge_clear_delay();
        tokio::spawn(async move {
            sleeper.sleep(delay).await;
            if current.load(Ordering::SeqCst) == generation {
                host.set_badge_text("").await;
            }
        });
    }

    /// Capture the visible area of a tab and keep it in the screenshot ring.
    ///
    /// A tab that is not the active tab of a focused window is focused
    /// first, then given time to settle before the capture.
    pub async fn capture_screenshot(
        &self,
        tab_id: Option<TabId>,
        reason: &str,
    ) -> Result<String, CoordinatorError> {
        let tab_id = tab_id.ok_or(CaptureError::NoTabId)?;
        let tab = self.host.get_tab(tab_id).await?;

        if !tab.is_visible() {
            self.host.focus_tab(&tab).await?;
            let settle = if reason == REASON_TRADE_DETECTED {
                self.config.trade_settle_delay()
            } else {
                self.config.settle_delay()
            };
            debug!("Focused tab {}, settling for {:?}", tab_id, settle);
            self.sleeper.sleep(settle).await;
        }

        let data_url = self.host.capture_visible_tab(tab.window_id).await?;
        self.store_screenshot(&tab, reason, &data_url).await?;

        info!("Captured screenshot of tab {} ({})", tab_id, reason);
        Ok(data_url)
    }

    async fn store_screenshot(
        &self,
        tab: &TabInfo,
        reason: &str,
        data_url: &str,
    ) -> Result<(), CoordinatorError> {
        let record = ScreenshotRecord {
            id: format!("screenshot_{}", uuid::Uuid::new_v4()),
            timestamp: Utc::now(),
            image_data: data_url.to_string(),
            tab_id: tab.id,
            reason: reason.to_string(),
            url: tab.url.clone(),
            title: tab.title.clone(),
            window_id: tab.window_id,
        };

        let mut screenshots: Vec<ScreenshotRecord> =
            get_typed(self.store.as_ref(), keys::SCREENSHOTS).await?.unwrap_or_default();
        append_capped(&mut screenshots, record, self.config.screenshot_capacity);
        set_typed(self.store.as_ref(), keys::SCREENSHOTS, &screenshots).await?;
        Ok(())
    }

    /// Trade log in insertion order; empty when absent or unreadable.
    pub async fn list_trades(&self) -> Vec<TradeRecord> {
        self.read_list(keys::TRADES).await
    }

    /// Screenshots in capture order; empty when absent or unreadable.
    pub async fn list_screenshots(&self) -> Vec<ScreenshotRecord> {
        self.read_list(keys::SCREENSHOTS).await
    }

    async fn read_list<T: serde::de::DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match get_typed::<Vec<T>>(self.store.as_ref(), key).await {
            Ok(list) => list.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to read '{}', returning empty list: {}", key, e);
                Vec::new()
            }
        }
    }

    /// Bulk clear of the trade log. Returns how many trades were removed.
    pub async fn clear_trades(&self) -> Result<usize, CoordinatorError> {
        let count = self.list_trades().await.len();
        self.store.set(keys::TRADES, Value::Array(Vec::new())).await?;
        info!("Cleared {} trades", count);
        Ok(count)
    }

    pub async fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            ready: true,
            id: self.id.clone(),
            is_recording: self.get_recording_state().await,
            registered_tabs: self.registry.tab_ids(),
            trade_count: self.list_trades().await.len(),
            timestamp: Utc::now(),
        }
    }

    /// Whether a content agent still has to be injected into this tab.
    pub fn needs_injection(&self, tab_id: TabId) -> bool {
        !self.registry.contains(tab_id)
    }

    /// Tab closed: its agent is gone.
    pub fn on_tab_removed(&self, tab_id: TabId) {
        if self.registry.unregister(tab_id) {
            debug!("Tab {} closed, unregistered", tab_id);
        }
    }

    /// Tab navigated. On completion the old agent is gone; a supported page
    /// gets a fresh agent injected.
    pub async fn on_tab_updated(&self, tab_id: TabId, url: &str, complete: bool) {
        if !complete {
            return;
        }
        if self.registry.unregister(tab_id) {
            debug!("Tab {} navigated, unregistered", tab_id);
        }
        if self.platforms.matches(url) && self.needs_injection(tab_id) {
            if let Err(e) = self.host.inject_content_agent(tab_id).await {
                warn!("Failed to inject content agent into tab {}: {}", tab_id, e);
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
