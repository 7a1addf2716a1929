//! Run command implementation

use crate::config::{Config, TelegramConfig};
use crate::control::{CommandHandler, CommandListener, ControlState};
use crate::detection::{DetectionEngine, EngineHandle};
use crate::dispatch::{
    Dispatcher, LogNotifier, Notifier, TelegramClient, TelegramClientConfig, TELEGRAM_API_URL,
};
use crate::market::{GammaClient, GammaConfig};
use crate::monitor::{Monitor, ScanLimits, Scanner};
use crate::trades::{DataApiClient, DataApiConfig};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Log alerts instead of sending them to Telegram
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let state = Arc::new(ControlState::new(config.scan.interval_secs, config.thresholds));
        let engine = spawn_engine(config, &state);
        let scanner = build_scanner(config, engine.clone(), config.scan.market_limit)?;

        let telegram = match (self.dry_run, config.telegram()) {
            (false, Some(settings)) => Some(Arc::new(telegram_client(config, settings)?)),
            (false, None) => {
                tracing::warn!("Telegram not configured; alerts will only be logged");
                None
            }
            (true, _) => None,
        };

        let notifier: Arc<dyn Notifier> = match &telegram {
            Some(client) => client.clone(),
            None => Arc::new(LogNotifier),
        };
        let dispatcher = Dispatcher::from_config(notifier, &config.dispatch);

        let listener = telegram.map(|client| {
            let handler = CommandHandler::new(state.clone(), engine.clone());
            let chat_id = client.chat_id();
            let listener = CommandListener::new(client.clone(), client, handler, chat_id);
            tokio::spawn(listener.run())
        });

        tracing::info!(dry_run = self.dry_run, "Starting monitor");
        let monitor = Monitor::new(scanner, dispatcher, state);
        monitor
            .run_until(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for shutdown signal");
                    std::future::pending::<()>().await;
                }
            })
            .await;

        if let Some(listener) = listener {
            listener.abort();
        }
        Ok(())
    }
}

/// Start the engine task wired to the live thresholds
pub(crate) fn spawn_engine(config: &Config, state: &ControlState) -> EngineHandle {
    EngineHandle::spawn(DetectionEngine::new(
        config.history.limits,
        config.history.dedup_retention(),
        state.subscribe_thresholds(),
    ))
}

pub(crate) fn build_scanner(
    config: &Config,
    engine: EngineHandle,
    market_limit: usize,
) -> anyhow::Result<Scanner> {
    let timeout = config.provider.request_timeout();
    let markets = GammaClient::with_config(GammaConfig {
        base_url: config.provider.gamma_url.clone(),
        timeout,
    })?;
    let trades = DataApiClient::with_config(DataApiConfig {
        base_url: config.provider.data_api_url.clone(),
        timeout,
    })?;
    Ok(Scanner::new(
        Arc::new(markets),
        Arc::new(trades),
        engine,
        ScanLimits {
            market_limit,
            trade_limit: config.scan.trade_limit,
            request_timeout: timeout,
        },
    ))
}

fn telegram_client(config: &Config, settings: &TelegramConfig) -> anyhow::Result<TelegramClient> {
    TelegramClient::new(TelegramClientConfig {
        api_url: TELEGRAM_API_URL.to_string(),
        bot_token: settings.bot_token.clone(),
        chat_id: settings.chat_id,
        request_timeout: config.provider.request_timeout(),
        poll_timeout: Duration::from_secs(settings.poll_timeout_secs),
    })
}
