//! Configuration types for poly-sentinel

use crate::detection::{HistoryLimits, Thresholds};
use crate::telemetry::LogFormat;
use serde::Deserialize;
use std::time::Duration;

/// Environment variable overriding `telegram.bot_token`
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
/// Environment variable overriding `telegram.chat_id`
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Chat delivery and commands; alerts are only logged without it
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Market data provider endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_gamma_url")]
    pub gamma_url: String,
    #[serde(default = "default_data_api_url")]
    pub data_api_url: String,
    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_gamma_url() -> String {
    "https://gamma-api.polymarket.com".to_string()
}
fn default_data_api_url() -> String {
    "https://data-api.polymarket.com".to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            gamma_url: default_gamma_url(),
            data_api_url: default_data_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Scan loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Pause between scan cycles (seconds), changeable at runtime
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Active markets fetched per cycle
    #[serde(default = "default_market_limit")]
    pub market_limit: usize,
    /// Recent trades fetched per market
    #[serde(default = "default_trade_limit")]
    pub trade_limit: usize,
}

fn default_interval_secs() -> u64 {
    60
}
fn default_market_limit() -> usize {
    50
}
fn default_trade_limit() -> usize {
    20
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            market_limit: default_market_limit(),
            trade_limit: default_trade_limit(),
        }
    }
}

/// Rolling history and dedup retention
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    #[serde(flatten)]
    pub limits: HistoryLimits,
    /// How long dedup keys are kept behind the newest trade (seconds, 0 = forever)
    #[serde(default = "default_dedup_retention_secs")]
    pub dedup_retention_secs: u64,
}

fn default_dedup_retention_secs() -> u64 {
    0
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limits: HistoryLimits::default(),
            dedup_retention_secs: default_dedup_retention_secs(),
        }
    }
}

impl HistoryConfig {
    /// Dedup retention, or `None` to keep every key
    pub fn dedup_retention(&self) -> Option<chrono::Duration> {
        match self.dedup_retention_secs {
            0 => None,
            secs => Some(chrono::Duration::seconds(secs.min(i64::MAX as u64) as i64)),
        }
    }
}

/// Alert delivery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Pause between consecutive messages (milliseconds)
    #[serde(default = "default_pace_ms")]
    pub pace_ms: u64,
    /// Delivery attempts per alert
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_pace_ms() -> u64 {
    500
}
fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    1000
}
fn default_max_backoff_ms() -> u64 {
    10_000
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            pace_ms: default_pace_ms(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: i64,
    /// Long-poll timeout for command updates (seconds)
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

fn default_poll_timeout_secs() -> u64 {
    30
}

impl TelegramConfig {
    /// Whether both token and chat are set
    pub fn is_complete(&self) -> bool {
        !self.bot_token.is_empty() && self.chat_id != 0
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Prometheus exporter port; no exporter when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: None,
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Override Telegram settings from the environment
    ///
    /// `lookup` returns the value of an environment variable if set.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<()> {
        let token = lookup(ENV_BOT_TOKEN).filter(|v| !v.is_empty());
        let chat_id = match lookup(ENV_CHAT_ID).filter(|v| !v.is_empty()) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<i64>()
                    .map_err(|e| anyhow::anyhow!("Invalid {}: {}", ENV_CHAT_ID, e))?,
            ),
            None => None,
        };

        if token.is_none() && chat_id.is_none() {
            return Ok(());
        }
        let telegram = self.telegram.get_or_insert_with(|| TelegramConfig {
            bot_token: String::new(),
            chat_id: 0,
            poll_timeout_secs: default_poll_timeout_secs(),
        });
        if let Some(token) = token {
            telegram.bot_token = token;
        }
        if let Some(chat_id) = chat_id {
            telegram.chat_id = chat_id;
        }
        Ok(())
    }

    /// Telegram settings, if complete enough to use
    pub fn telegram(&self) -> Option<&TelegramConfig> {
        self.telegram.as_ref().filter(|t| t.is_complete())
    }
}
