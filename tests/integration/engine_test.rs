//! Detection engine behavior through the public API

use chrono::{DateTime, Duration, TimeZone, Utc};
use poly_sentinel::detection::{
    AlertDetails, AlertKind, DetectionEngine, HistoryLimits, MarketMetadata, Thresholds, Trade,
};
use std::collections::BTreeSet;
use tokio::sync::watch;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 5, 12, 0, 0).unwrap()
}

fn market(id: &str, volume: f64) -> MarketMetadata {
    MarketMetadata {
        market_id: id.to_string(),
        question: format!("Question for {}", id),
        volume,
    }
}

fn trade(wallet: &str, market_id: &str, secs: i64, size: f64, price: f64, outcome: &str) -> Trade {
    Trade {
        wallet: wallet.to_string(),
        market_id: market_id.to_string(),
        size,
        price,
        timestamp: t0() + Duration::seconds(secs),
        outcome: outcome.to_string(),
    }
}

fn kinds(alerts: &[poly_sentinel::detection::Alert]) -> Vec<AlertKind> {
    alerts.iter().map(|a| a.kind()).collect()
}

#[test]
fn test_coordinated_entry_fires_on_third_wallet() {
    let mut engine = DetectionEngine::with_thresholds(Thresholds::default());
    let m = market("m1", 1e6);

    // 500 * 0.5 = 250 > 200
    let a = engine.process(&trade("A", "m1", 0, 500.0, 0.5, "Yes"), &m).unwrap();
    let b = engine.process(&trade("B", "m1", 60, 500.0, 0.5, "Yes"), &m).unwrap();
    let c = engine.process(&trade("C", "m1", 120, 500.0, 0.5, "Yes"), &m).unwrap();

    assert!(a.is_empty());
    assert!(b.is_empty());
    assert_eq!(kinds(&c), vec![AlertKind::CoordinatedEntry]);
    match &c[0].details {
        AlertDetails::CoordinatedEntry { wallets, outcome, value } => {
            assert_eq!(*wallets, 3);
            assert_eq!(outcome, "Yes");
            assert_eq!(*value, 250.0);
        }
        other => panic!("unexpected details {:?}", other),
    }
}

#[test]
fn test_coordination_ignores_other_outcome_and_stale_entries() {
    let mut engine = DetectionEngine::with_thresholds(Thresholds::default());
    let m = market("m1", 1e6);

    engine.process(&trade("A", "m1", 0, 500.0, 0.5, "No"), &m).unwrap();
    engine.process(&trade("B", "m1", -600, 500.0, 0.5, "Yes"), &m).unwrap();
    let c = engine.process(&trade("C", "m1", 0, 500.0, 0.5, "Yes"), &m).unwrap();
    assert!(c.is_empty());
}

#[test]
fn test_coordination_index_matches_recent_entries() {
    let mut engine = DetectionEngine::with_thresholds(Thresholds {
        coordinated_min_wallets: 1000.0,
        ..Default::default()
    });
    let markets = [market("m1", 1e6), market("m2", 1e6)];
    let outcomes = ["Yes", "No"];

    // Wallets move between markets so older entries fall out of the last five
    for i in 0..400i64 {
        let wallet = format!("w{}", i % 7);
        let m = &markets[(i as usize * 3 / 5) % 2];
        let outcome = outcomes[(i as usize / 3) % 2];
        engine
            .process(&trade(&wallet, &m.market_id, i, 1.0, 0.5, outcome), m)
            .unwrap();
    }

    let history = engine.history();
    for m in &markets {
        for outcome in outcomes {
            let indexed: BTreeSet<String> = history
                .wallets_recently_on(&m.market_id, outcome)
                .map(str::to_string)
                .collect();
            let scanned: BTreeSet<String> = (0..7)
                .map(|i| format!("w{}", i))
                .filter(|w| {
                    history
                        .recent_wallet_entries(w)
                        .any(|e| e.market_id == m.market_id && e.outcome == outcome)
                })
                .collect();
            assert_eq!(indexed, scanned, "market {} outcome {}", m.market_id, outcome);
        }
    }
}

#[test]
fn test_windows_keep_most_recent_entries() {
    let mut engine = DetectionEngine::with_thresholds(Thresholds::default());
    let m = market("m1", 1e6);
    for i in 0..250 {
        engine
            .process(&trade(&format!("w{}", i), "m1", i, i as f64 + 1.0, 0.5, "Yes"), &m)
            .unwrap();
    }

    let sizes = engine.history().size_window("m1").unwrap();
    assert_eq!(sizes.len(), 100);
    assert_eq!(sizes.front(), Some(&151.0));
    assert_eq!(sizes.back(), Some(&250.0));

    let prices = engine.history().price_window("m1").unwrap();
    assert_eq!(prices.len(), 200);
    assert_eq!(prices.front().unwrap().timestamp, t0() + Duration::seconds(50));
}

#[test]
fn test_wallet_history_respects_cap() {
    let (_tx, rx) = watch::channel(Thresholds::default());
    let limits = HistoryLimits {
        wallet_history_cap: 8,
        ..Default::default()
    };
    let mut engine = DetectionEngine::new(limits, None, rx);
    let m = market("m1", 1e6);
    for i in 0..20 {
        engine.process(&trade("w", "m1", i, 1.0, 0.5, "Yes"), &m).unwrap();
    }

    let history = engine.history();
    assert_eq!(history.wallet_entries("w").unwrap().len(), 8);
    assert_eq!(history.wallet_trade_count("w"), 20);
    assert_eq!(history.outcome_count("w"), 20);
}

#[test]
fn test_fresh_wallet_first_trade() {
    let mut engine = DetectionEngine::with_thresholds(Thresholds::default());
    let m = market("m1", 1e6);

    let alerts = engine.process(&trade("new", "m1", 0, 3000.0, 0.5, "Yes"), &m).unwrap();
    assert_eq!(kinds(&alerts), vec![AlertKind::FreshWalletLargeBet]);
    match &alerts[0].details {
        AlertDetails::FreshWalletLargeBet { age_days, value } => {
            assert_eq!(*age_days, 0);
            assert_eq!(*value, 1500.0);
        }
        other => panic!("unexpected details {:?}", other),
    }
}

#[test]
fn test_old_wallet_is_not_fresh() {
    let mut engine = DetectionEngine::with_thresholds(Thresholds::default());
    let m = market("m1", 1e6);

    engine.process(&trade("w", "m1", 0, 1.0, 0.5, "Yes"), &m).unwrap();
    let eight_days = 8 * 86_400;
    let alerts = engine
        .process(&trade("w", "m1", eight_days, 3000.0, 0.5, "Yes"), &m)
        .unwrap();
    assert!(alerts.is_empty());
}

#[test]
fn test_unusual_size_needs_warm_window() {
    let mut engine = DetectionEngine::with_thresholds(Thresholds::default());
    let m = market("m1", 1e6);

    for i in 0..10 {
        engine
            .process(&trade(&format!("w{}", i), "m1", i, 10.0, 0.5, "Yes"), &m)
            .unwrap();
    }
    // Ten prior sizes: not warm yet
    let cold = engine.process(&trade("x", "m1", 20, 100.0, 0.5, "No"), &m).unwrap();
    assert!(cold.is_empty());

    // Eleven prior sizes, mean (10*10 + 100) / 11 = 18.18.., 100 > 45.45
    let warm = engine.process(&trade("y", "m1", 21, 100.0, 0.5, "No"), &m).unwrap();
    assert_eq!(kinds(&warm), vec![AlertKind::UnusualSize]);
}

#[test]
fn test_repeat_niche_player() {
    let mut engine = DetectionEngine::with_thresholds(Thresholds::default());
    let niche = market("tiny", 5_000.0);

    for i in 0..3 {
        let alerts = engine
            .process(&trade("w", "tiny", i * 10_000, 1.0, 0.5, "Yes"), &niche)
            .unwrap();
        assert!(alerts.is_empty());
    }
    let alerts = engine
        .process(&trade("w", "tiny", 40_000, 1.0, 0.5, "Yes"), &niche)
        .unwrap();
    assert_eq!(kinds(&alerts), vec![AlertKind::RepeatNichePlayer]);
}

#[test]
fn test_high_conviction_trader() {
    let mut engine = DetectionEngine::with_thresholds(Thresholds::default());
    let markets: Vec<MarketMetadata> = (0..10).map(|i| market(&format!("m{}", i), 1e6)).collect();

    // Nine extreme entries on different markets, spaced a day apart
    for (i, m) in markets.iter().take(9).enumerate() {
        let alerts = engine
            .process(&trade("sharp", &m.market_id, i as i64 * 86_400, 10.0, 0.9, "Yes"), m)
            .unwrap();
        assert!(alerts.is_empty());
    }
    // Tenth trade: 10 total, 10 extreme, value 400 * 0.95 = 380 > 300
    let m = &markets[9];
    let alerts = engine
        .process(&trade("sharp", &m.market_id, 9 * 86_400, 400.0, 0.95, "Yes"), m)
        .unwrap();
    assert_eq!(kinds(&alerts), vec![AlertKind::HighWinRateTrader]);
}

#[test]
fn test_pre_move_positioning() {
    let mut engine = DetectionEngine::with_thresholds(Thresholds::default());
    let m = market("m1", 1e6);

    for i in 0..10 {
        engine
            .process(&trade(&format!("w{}", i), "m1", i * 60, 1.0, 0.30 + i as f64 * 0.01, "Yes"), &m)
            .unwrap();
    }
    // 1200 * 0.55 = 660 > 500, move 0.30 -> 0.55
    let alerts = engine.process(&trade("big", "m1", 660, 1200.0, 0.55, "No"), &m).unwrap();
    assert!(kinds(&alerts).contains(&AlertKind::PreMovePositioning));
}

#[test]
fn test_duplicate_delivery_is_idempotent() {
    let mut engine = DetectionEngine::with_thresholds(Thresholds::default());
    let m = market("m1", 1e6);
    let big = trade("new", "m1", 0, 5000.0, 0.5, "Yes");

    let first = engine.process(&big, &m).unwrap();
    let stats_after_first = engine.stats();
    let second = engine.process(&big, &m).unwrap();
    let stats_after_second = engine.stats();

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    assert_eq!(stats_after_first.trades_tracked, stats_after_second.trades_tracked);
    assert_eq!(stats_after_first.alerts_total, stats_after_second.alerts_total);
}

#[test]
fn test_threshold_change_takes_effect_immediately() {
    let (tx, rx) = watch::channel(Thresholds::default());
    let mut engine = DetectionEngine::new(HistoryLimits::default(), None, rx);

    let m1 = market("m1", 1e6);
    let quiet = engine.process(&trade("a", "m1", 0, 1000.0, 0.5, "Yes"), &m1).unwrap();
    assert!(quiet.is_empty());

    tx.send_modify(|t| t.fresh_wallet_min_value = 100.0);
    let m2 = market("m2", 1e6);
    let loud = engine.process(&trade("b", "m2", 1, 1000.0, 0.5, "Yes"), &m2).unwrap();
    assert_eq!(kinds(&loud), vec![AlertKind::FreshWalletLargeBet]);
}

#[test]
fn test_alerts_serialize_with_type_tag() {
    let mut engine = DetectionEngine::with_thresholds(Thresholds::default());
    let alerts = engine
        .process(&trade("new", "m1", 0, 5000.0, 0.5, "Yes"), &market("m1", 1e6))
        .unwrap();

    let json: serde_json::Value = serde_json::to_value(&alerts[0]).unwrap();
    assert_eq!(json["details"]["type"], "FRESH_WALLET_LARGE_BET");
    assert_eq!(json["wallet"], "new");
    assert_eq!(json["market_id"], "m1");
}
