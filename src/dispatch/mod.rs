//! Alert dispatch module
//!
//! Renders alerts as chat messages and delivers them with pacing and retry

mod dispatcher;
pub mod format;
mod telegram;

pub use dispatcher::{DeliveryReport, Dispatcher, RetryPolicy};
pub use telegram::{Chat, Message, TelegramClient, TelegramClientConfig, Update, TELEGRAM_API_URL};

use async_trait::async_trait;

/// Destination for rendered messages
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message
    async fn send(&self, text: &str) -> anyhow::Result<()>;
}

/// Notifier that only writes messages to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        tracing::info!(message = %text, "Notification");
        Ok(())
    }
}
