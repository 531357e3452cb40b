//! Content agent: the per-tab side of the capture pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use tradereplay_config::AgentConfig;
use tradereplay_protocols::{
    ChannelError, DomEvent, ElementSnapshot, MessageChannel, Push, Request, ResponseBody,
    Sleeper, TokioSleeper, TradeDetector, TradeRecord, REASON_TRADE_DETECTED,
};

use crate::backoff::BackoffPolicy;
use crate::client::AgentClient;
use crate::detect::MonitoredElements;
use crate::state::ConnectionState;

/// Keeps a self-healing channel to the coordinator, mirrors the recording
/// flag and forwards detected trades while recording.
pub struct ContentAgent {
    client: AgentClient,
    ping_timeout: Duration,
    policy: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
    detector: Mutex<Box<dyn TradeDetector>>,
    platform: String,
    monitored: MonitoredElements,
    state: Mutex<ConnectionState>,
    recording: AtomicBool,
}

impl ContentAgent {
    pub fn new(
        channel: Arc<dyn MessageChannel>,
        detector: Box<dyn TradeDetector>,
        config: &AgentConfig,
    ) -> Self {
        let platform = detector.platform().to_string();
        Self {
            client: AgentClient::new(channel, config.request_timeout()),
            ping_timeout: config.ping_timeout(),
            policy: BackoffPolicy::from(config),
            sleeper: Arc::new(TokioSleeper),
            detector: Mutex::new(detector),
            platform,
            monitored: MonitoredElements::new(),
            state: Mutex::new(ConnectionState::Idle),
            recording: AtomicBool::new(false),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.lock() = state;
    }

    /// Connect to the coordinator, retrying with backoff.
    ///
    /// The first ping is attempt zero. After `max_attempts` failed
    /// reconnects the agent gives up and returns the last error; only
    /// [`reconnect`](Self::reconnect) starts over.
    pub async fn connect(&self) -> Result<(), ChannelError> {
        let mut attempt = 0;
        loop {
            self.set_state(ConnectionState::Connecting);
            match self.ping().await {
                Ok(()) => {
                    self.set_state(ConnectionState::Connected);
                    info!("Content agent ({}) connected", self.platform);
                    self.sync().await;
                    return Ok(());
                }
                Err(e) => {
                    attempt += 1;
                    let Some(delay) = self.policy.delay_for_attempt(attempt) else {
                        self.set_state(ConnectionState::GaveUp);
                        warn!(
                            "Giving up on background connection after {} attempts: {}",
                            attempt - 1,
                            e
                        );
                        return Err(e);
                    };
                    debug!("Connection failed ({}), retry {} in {:?}", e, attempt, delay);
                    self.set_state(ConnectionState::Backoff { attempt });
                    self.sleeper.sleep(delay).await;
                }
            }
        }
    }

    /// User-initiated reconnect; resets the attempt budget.
    pub async fn reconnect(&self) -> Result<(), ChannelError> {
        info!("Manual reconnect requested");
        self.connect().await
    }

    async fn ping(&self) -> Result<(), ChannelError> {
        match self
            .client
            .request_with_timeout(Request::Ping, self.ping_timeout)
            .await?
        {
            ResponseBody::Pong { ready: true, .. } => Ok(()),
            ResponseBody::Pong { ready: false, .. } => {
                Err(ChannelError::Disconnected("background not ready".into()))
            }
            _ => Err(ChannelError::UnexpectedResponse {
                request: "PING".into(),
            }),
        }
    }

    /// Register with the coordinator and pull the current recording flag.
    /// Failures leave the agent connected; the next push corrects it.
    async fn sync(&self) {
        let register = Request::ContentScriptReady {
            platform: Some(self.platform.clone()),
        };
        if let Err(e) = self.client.request(register).await {
            warn!("Registration failed: {}", e);
        }

        match self.client.request(Request::GetRecordingStatus).await {
            Ok(ResponseBody::Recording { is_recording }) => self.set_recording(is_recording),
            Ok(_) => warn!("Unexpected response to GET_RECORDING_STATUS"),
            Err(e) => warn!("Failed to fetch recording state: {}", e),
        }
    }

    fn set_recording(&self, is_recording: bool) {
        let was = self.recording.swap(is_recording, Ordering::SeqCst);
        if was != is_recording {
            info!(
                "Recording {} in {} tab",
                if is_recording { "enabled" } else { "disabled" },
                self.platform
            );
        }
    }

    /// Apply a push from the coordinator.
    pub fn handle_push(&self, push: &Push) {
        match push {
            Push::RecordingStatusUpdate { is_recording } => self.set_recording(*is_recording),
            Push::TradesUpdated { trade_count, .. } => {
                debug!("Trade log now has {} trades", trade_count);
            }
        }
    }

    /// Flip recording from the in-page indicator.
    pub async fn toggle_recording(&self) -> Result<bool, ChannelError> {
        match self
            .client
            .request(Request::ToggleRecording { is_recording: None })
            .await?
        {
            ResponseBody::Recording { is_recording } => {
                self.set_recording(is_recording);
                Ok(is_recording)
            }
            _ => Err(ChannelError::UnexpectedResponse {
                request: "TOGGLE_RECORDING".into(),
            }),
        }
    }

    /// Start listening on trade controls. Returns how many were new.
    pub fn attach(&self, elements: &[ElementSnapshot]) -> usize {
        elements
            .iter()
            .filter(|e| self.monitored.mark(&e.key))
            .count()
    }

    /// Run a page event through the detector and forward any trade while
    /// recording. Clicks only count on attached elements.
    ///
    /// After a trade is recorded a screenshot is requested best-effort.
    pub async fn on_dom_event(&self, event: &DomEvent) -> Result<Option<TradeRecord>, ChannelError> {
        if let DomEvent::Click { element } = event {
            if !self.monitored.contains(&element.key) {
                return Ok(None);
            }
        }

        let detected = self.detector.lock().detect(event);
        let Some(draft) = detected else {
            return Ok(None);
        };

        if !self.is_recording() {
            debug!("Trade detected while not recording, dropped");
            return Ok(None);
        }

        let trade = match self
            .client
            .request(Request::TradeDetected { trade: draft })
            .await?
        {
            ResponseBody::Trade { trade } => trade,
            _ => {
                return Err(ChannelError::UnexpectedResponse {
                    request: "TRADE_DETECTED".into(),
                })
            }
        };
        info!("Trade sent: {} {}", trade.direction, trade.instrument);

        let capture = Request::CaptureScreenshot {
            tab_id: None,
            reason: Some(REASON_TRADE_DETECTED.to_string()),
        };
        if let Err(e) = self.client.request(capture).await {
            warn!("Screenshot after trade failed: {}", e);
        }

        Ok(Some(trade))
    }
}

#[cfg(test)]
#[path = "content_tests.rs"]
mod tests;
