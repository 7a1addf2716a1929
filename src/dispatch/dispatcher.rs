//! Paced delivery with exponential backoff

use super::format::render_alert;
use super::Notifier;
use crate::config::DispatchConfig;
use crate::detection::Alert;
use crate::telemetry::{increment, CounterMetric};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Retry schedule for a single message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let mut delay = self.initial_delay;
        for _ in 1..retry {
            delay = (delay * 2).min(self.max_delay);
        }
        delay.min(self.max_delay)
    }
}

/// Outcome of delivering a batch of alerts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Delivers rendered alerts through a notifier
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    retry: RetryPolicy,
    pace: Duration,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, retry: RetryPolicy, pace: Duration) -> Self {
        Self {
            notifier,
            retry,
            pace,
        }
    }

    pub fn from_config(notifier: Arc<dyn Notifier>, config: &DispatchConfig) -> Self {
        let retry = RetryPolicy {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_backoff_ms),
            max_delay: Duration::from_millis(config.max_backoff_ms),
        };
        Self::new(notifier, retry, Duration::from_millis(config.pace_ms))
    }

    /// Send one message, retrying failures with exponential backoff
    pub async fn send(&self, text: &str) -> anyhow::Result<()> {
        let mut attempt = 1;
        loop {
            match self.notifier.send(text).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Delivery failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Deliver alerts in order, pausing between messages
    ///
    /// Alerts that still fail after every attempt are logged and counted;
    /// the rest of the batch is still sent.
    pub async fn dispatch(&self, alerts: &[Alert]) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for (i, alert) in alerts.iter().enumerate() {
            if i > 0 && !self.pace.is_zero() {
                sleep(self.pace).await;
            }
            match self.send(&render_alert(alert)).await {
                Ok(()) => {
                    report.delivered += 1;
                    increment(CounterMetric::AlertsSent);
                }
                Err(e) => {
                    report.failed += 1;
                    increment(CounterMetric::DeliveryFailures);
                    tracing::error!(
                        error = %e,
                        alert_id = %alert.id,
                        kind = %alert.kind(),
                        "Dropping alert after failed delivery"
                    );
                }
            }
        }
        report
    }
}
