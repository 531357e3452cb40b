//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Bridge server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

/// Local storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for the local store file and logs.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// `~/.tradereplay`, or a relative fallback without a home directory.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".tradereplay"))
        .unwrap_or_else(|| PathBuf::from(".tradereplay"))
}

/// Background coordinator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// How long the trade count badge stays visible.
    #[serde(default = "default_badge_clear_ms")]
    pub badge_clear_ms: u64,

    /// Screenshots kept before the oldest is evicted.
    #[serde(default = "default_screenshot_capacity")]
    pub screenshot_capacity: usize,

    /// Wait after focusing a tab before capturing.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Settle wait used when the capture was triggered by a trade.
    #[serde(default = "default_trade_settle_delay_ms")]
    pub trade_settle_delay_ms: u64,

    /// URL fragments identifying supported trading platforms.
    #[serde(default = "default_supported_hosts")]
    pub supported_hosts: Vec<String>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            badge_clear_ms: default_badge_clear_ms(),
            screenshot_capacity: default_screenshot_capacity(),
            settle_delay_ms: default_settle_delay_ms(),
            trade_settle_delay_ms: default_trade_settle_delay_ms(),
            supported_hosts: default_supported_hosts(),
        }
    }
}

impl CoordinatorConfig {
    pub fn badge_clear_delay(&self) -> Duration {
        Duration::from_millis(self.badge_clear_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn trade_settle_delay(&self) -> Duration {
        Duration::from_millis(self.trade_settle_delay_ms)
    }
}

fn default_badge_clear_ms() -> u64 {
    3000
}

fn default_screenshot_capacity() -> usize {
    50
}

fn default_settle_delay_ms() -> u64 {
    300
}

fn default_trade_settle_delay_ms() -> u64 {
    800
}

fn default_supported_hosts() -> Vec<String> {
    ["tradingview.com", "tradovate.com", "metatrader", "mql5.com", "metaquotes.net"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Content agent and popup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_growth_factor")]
    pub growth_factor: f64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Reconnect attempts before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_ping_timeout_ms")]
    pub ping_timeout_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            growth_factor: default_growth_factor(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
            request_timeout_ms: default_request_timeout_ms(),
            ping_timeout_ms: default_ping_timeout_ms(),
        }
    }
}

impl AgentConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }
}

fn default_base_delay_ms() -> u64 {
    2000
}

fn default_growth_factor() -> f64 {
    1.5
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    10
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_ping_timeout_ms() -> u64 {
    5000
}

/// Remote backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Public anon key sent as `apikey`.
    #[serde(default)]
    pub anon_key: Option<String>,

    /// Storage bucket for attachments.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Timeline refresh interval.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            anon_key: None,
            bucket: default_bucket(),
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn is_configured(&self) -> bool {
        self.base_url.as_deref().is_some_and(|u| !u.is_empty())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_bucket() -> String {
    "trade-recordings".to_string()
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Also write daily-rotated log files under `<data_dir>/logs`.
    #[serde(default = "default_true")]
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: default_true(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
