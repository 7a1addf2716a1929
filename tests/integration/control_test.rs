//! Runtime control reaching the engine

use chrono::{TimeZone, Utc};
use poly_sentinel::control::{Command, CommandHandler, ControlState};
use poly_sentinel::detection::{
    AlertKind, DetectionEngine, EngineHandle, HistoryLimits, MarketMetadata, Thresholds, Trade,
};
use std::sync::Arc;

fn setup() -> (Arc<ControlState>, EngineHandle, CommandHandler) {
    let state = Arc::new(ControlState::new(60, Thresholds::default()));
    let engine = EngineHandle::spawn(DetectionEngine::new(
        HistoryLimits::default(),
        None,
        state.subscribe_thresholds(),
    ));
    let handler = CommandHandler::new(state.clone(), engine.clone());
    (state, engine, handler)
}

fn pair(wallet: &str, market_id: &str, size: f64) -> (Trade, MarketMetadata) {
    (
        Trade {
            wallet: wallet.to_string(),
            market_id: market_id.to_string(),
            size,
            price: 0.5,
            timestamp: Utc.with_ymd_and_hms(2024, 11, 5, 12, 0, 0).unwrap(),
            outcome: "Yes".to_string(),
        },
        MarketMetadata {
            market_id: market_id.to_string(),
            question: "Q".to_string(),
            volume: 1e6,
        },
    )
}

#[tokio::test]
async fn test_set_command_changes_engine_behavior() {
    let (_state, engine, handler) = setup();

    let quiet = engine.process_batch(vec![pair("a", "m1", 1000.0)]).await.unwrap();
    assert!(quiet.is_empty());

    let reply = handler
        .handle(Command::parse("/set fresh_wallet_min_value 100").unwrap())
        .await;
    assert!(reply.starts_with("✅"));

    let loud = engine.process_batch(vec![pair("b", "m2", 1000.0)]).await.unwrap();
    assert_eq!(loud.len(), 1);
    assert_eq!(loud[0].kind(), AlertKind::FreshWalletLargeBet);
}

#[tokio::test]
async fn test_rejected_set_keeps_thresholds() {
    let (state, _engine, handler) = setup();

    handler.handle(Command::parse("/set bogus 5").unwrap()).await;
    handler
        .handle(Command::parse("/set fresh_wallet_days x").unwrap())
        .await;
    handler
        .handle(Command::parse("/set fresh_wallet_days -1").unwrap())
        .await;

    assert_eq!(state.thresholds(), Thresholds::default());
}

#[tokio::test]
async fn test_status_reflects_engine_state() {
    let (state, engine, handler) = setup();
    engine
        .process_batch(vec![pair("a", "m1", 1.0), pair("b", "m2", 1.0)])
        .await
        .unwrap();
    state.record_sent(4);

    let status = handler.handle(Command::Status).await;
    assert!(status.contains("Wallets tracked: 2"));
    assert!(status.contains("Markets tracked: 2"));
    assert!(status.contains("Alerts sent: 4"));
}
