//! Command listener
//!
//! Long-polls chat updates and answers commands from the configured chat.
//! Runs in its own task so polling never delays a scan.

use super::command::Command;
use super::handler::CommandHandler;
use crate::dispatch::{Notifier, TelegramClient, Update};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const ERROR_DELAY: Duration = Duration::from_secs(5);

/// Source of incoming chat updates
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Wait for updates with an id of at least `offset`
    async fn updates(&self, offset: i64) -> anyhow::Result<Vec<Update>>;
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn updates(&self, offset: i64) -> anyhow::Result<Vec<Update>> {
        self.get_updates(offset).await
    }
}

/// Polls for commands and sends replies
pub struct CommandListener {
    source: Arc<dyn UpdateSource>,
    replies: Arc<dyn Notifier>,
    handler: CommandHandler,
    chat_id: i64,
    offset: i64,
}

impl CommandListener {
    pub fn new(
        source: Arc<dyn UpdateSource>,
        replies: Arc<dyn Notifier>,
        handler: CommandHandler,
        chat_id: i64,
    ) -> Self {
        Self {
            source,
            replies,
            handler,
            chat_id,
            offset: 0,
        }
    }

    /// Fetch one batch of updates and answer any commands in it
    ///
    /// Returns the number of commands handled.
    pub async fn poll_once(&mut self) -> anyhow::Result<usize> {
        let updates = self.source.updates(self.offset).await?;
        let mut handled = 0;
        for update in updates {
            self.offset = self.offset.max(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            if message.chat.id != self.chat_id {
                tracing::debug!(chat_id = message.chat.id, "Ignoring message from other chat");
                continue;
            }
            let Some(command) = message.text.as_deref().and_then(Command::parse) else {
                continue;
            };

            let reply = self.handler.handle(command).await;
            if let Err(e) = self.replies.send(&reply).await {
                tracing::warn!(error = %e, "Failed to send command reply");
            }
            handled += 1;
        }
        Ok(handled)
    }

    /// Poll until the task is cancelled
    pub async fn run(mut self) {
        tracing::info!(chat_id = self.chat_id, "Listening for commands");
        loop {
            if let Err(e) = self.poll_once().await {
                tracing::warn!(error = %e, "Command polling failed");
                sleep(ERROR_DELAY).await;
            }
        }
    }
}
