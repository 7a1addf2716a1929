//! Scan loop with in-memory providers

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use poly_sentinel::control::ControlState;
use poly_sentinel::detection::{
    AlertKind, DetectionEngine, EngineHandle, HistoryLimits, MarketMetadata, Thresholds, Trade,
};
use poly_sentinel::dispatch::{Dispatcher, Notifier, RetryPolicy};
use poly_sentinel::market::MarketSource;
use poly_sentinel::monitor::{CycleOutcome, Monitor, ScanLimits, Scanner};
use poly_sentinel::trades::TradeSource;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct StaticMarkets(Vec<MarketMetadata>);

#[async_trait]
impl MarketSource for StaticMarkets {
    async fn fetch_active_markets(&self, limit: usize) -> anyhow::Result<Vec<MarketMetadata>> {
        Ok(self.0.iter().take(limit).cloned().collect())
    }
}

struct FailingMarkets;

#[async_trait]
impl MarketSource for FailingMarkets {
    async fn fetch_active_markets(&self, _limit: usize) -> anyhow::Result<Vec<MarketMetadata>> {
        anyhow::bail!("gamma unavailable")
    }
}

/// Trades per market; markets without an entry fail
struct StaticTrades(HashMap<String, Vec<Trade>>);

#[async_trait]
impl TradeSource for StaticTrades {
    async fn fetch_trades(&self, market_id: &str, limit: usize) -> anyhow::Result<Vec<Trade>> {
        match self.0.get(market_id) {
            Some(trades) => Ok(trades.iter().take(limit).cloned().collect()),
            None => anyhow::bail!("no trades for {}", market_id),
        }
    }
}

#[derive(Default)]
struct RecordingNotifier(Mutex<Vec<String>>);

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

fn market(id: &str) -> MarketMetadata {
    MarketMetadata {
        market_id: id.to_string(),
        question: format!("Will {} happen?", id),
        volume: 1e6,
    }
}

fn trade(wallet: &str, market_id: &str, size: f64) -> Trade {
    Trade {
        wallet: wallet.to_string(),
        market_id: market_id.to_string(),
        size,
        price: 0.5,
        timestamp: Utc.with_ymd_and_hms(2024, 11, 5, 12, 0, 0).unwrap(),
        outcome: "Yes".to_string(),
    }
}

fn limits() -> ScanLimits {
    ScanLimits {
        market_limit: 50,
        trade_limit: 20,
        request_timeout: Duration::from_secs(5),
    }
}

struct Fixture {
    monitor: Monitor,
    state: Arc<ControlState>,
    notifier: Arc<RecordingNotifier>,
}

fn fixture(markets: Arc<dyn MarketSource>, trades: HashMap<String, Vec<Trade>>) -> Fixture {
    let state = Arc::new(ControlState::new(10, Thresholds::default()));
    let engine = EngineHandle::spawn(DetectionEngine::new(
        HistoryLimits::default(),
        None,
        state.subscribe_thresholds(),
    ));
    let scanner = Scanner::new(markets, Arc::new(StaticTrades(trades)), engine, limits());
    let notifier = Arc::new(RecordingNotifier::default());
    let dispatcher = Dispatcher::new(
        notifier.clone(),
        RetryPolicy {
            max_attempts: 1,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        },
        Duration::ZERO,
    );
    Fixture {
        monitor: Monitor::new(scanner, dispatcher, state.clone()),
        state,
        notifier,
    }
}

#[tokio::test]
async fn test_cycle_delivers_alerts_and_skips_failed_markets() {
    let markets = Arc::new(StaticMarkets(vec![market("m1"), market("broken"), market("m2")]));
    let trades = HashMap::from([
        ("m1".to_string(), vec![trade("whale", "m1", 5000.0), trade("minnow", "m1", 2.0)]),
        ("m2".to_string(), vec![trade("other", "m2", 4000.0)]),
    ]);
    let f = fixture(markets, trades);

    match f.monitor.run_cycle().await.unwrap() {
        CycleOutcome::Completed { report, delivery } => {
            assert_eq!(report.markets_scanned, 2);
            assert_eq!(report.markets_failed, 1);
            assert_eq!(report.trades_fetched, 3);
            assert_eq!(report.alerts.len(), 2);
            assert!(report
                .alerts
                .iter()
                .all(|a| a.kind() == AlertKind::FreshWalletLargeBet));
            assert_eq!(delivery.delivered, 2);
        }
        CycleOutcome::Paused => panic!("monitor should not be paused"),
    }
    assert_eq!(f.state.alerts_sent(), 2);
    assert_eq!(f.notifier.0.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_repeated_cycle_does_not_realert() {
    let markets = Arc::new(StaticMarkets(vec![market("m1")]));
    let trades = HashMap::from([("m1".to_string(), vec![trade("whale", "m1", 5000.0)])]);
    let f = fixture(markets, trades);

    f.monitor.run_cycle().await.unwrap();
    match f.monitor.run_cycle().await.unwrap() {
        CycleOutcome::Completed { report, .. } => assert!(report.alerts.is_empty()),
        CycleOutcome::Paused => panic!("monitor should not be paused"),
    }
    assert_eq!(f.state.alerts_sent(), 1);
}

#[tokio::test]
async fn test_paused_cycle_fetches_nothing() {
    let f = fixture(Arc::new(FailingMarkets), HashMap::new());
    f.state.pause();

    assert!(matches!(
        f.monitor.run_cycle().await.unwrap(),
        CycleOutcome::Paused
    ));
}

#[tokio::test]
async fn test_market_list_failure_fails_cycle() {
    let f = fixture(Arc::new(FailingMarkets), HashMap::new());
    assert!(f.monitor.run_cycle().await.is_err());
    assert_eq!(f.state.alerts_sent(), 0);
}

#[tokio::test]
async fn test_run_until_sends_start_and_stop_notices() {
    let markets = Arc::new(StaticMarkets(vec![market("m1")]));
    let trades = HashMap::from([("m1".to_string(), vec![trade("whale", "m1", 5000.0)])]);
    let f = fixture(markets, trades);

    f.monitor
        .run_until(tokio::time::sleep(Duration::from_millis(200)))
        .await;

    let sent = f.notifier.0.lock().unwrap();
    assert!(sent.first().unwrap().contains("Sentinel Started"));
    assert!(sent.iter().any(|m| m.contains("FRESH WALLET LARGE BET")));
    assert!(sent.last().unwrap().contains("stopped"));
}
