//! Alert dedup ledger
//!
//! Remembers which trades have already been handled. Keys are grouped per
//! market into hourly buckets by trade time so that, with a retention
//! configured, old keys can be dropped without ever letting an old trade
//! through again. Each market keeps its own horizon, so activity on one
//! market never expires trades of another.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};

const BUCKET_SECS: i64 = 3600;

#[derive(Debug, Default)]
struct MarketLedger {
    buckets: BTreeMap<i64, Vec<String>>,
    latest: Option<DateTime<Utc>>,
    horizon: Option<DateTime<Utc>>,
}

/// Set of handled trade identities with optional time-based eviction
#[derive(Debug, Default)]
pub struct DedupLedger {
    keys: HashSet<String>,
    markets: HashMap<String, MarketLedger>,
    retention: Option<Duration>,
}

impl DedupLedger {
    /// Ledger that keeps every key for the process lifetime
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Ledger that evicts keys older than `retention` behind the newest
    /// trade of the same market
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            retention: Some(retention),
            ..Default::default()
        }
    }

    /// Whether this key has been recorded
    pub fn seen(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Whether a trade on `market_id` at this time falls behind that
    /// market's eviction horizon
    ///
    /// Keys for such trades may already have been evicted, so they are
    /// treated as handled.
    pub fn is_expired(&self, market_id: &str, timestamp: DateTime<Utc>) -> bool {
        self.horizon(market_id)
            .is_some_and(|horizon| timestamp < horizon)
    }

    /// Record a key for a trade on `market_id` at the given time
    pub fn mark_seen(&mut self, market_id: &str, key: impl Into<String>, timestamp: DateTime<Utc>) {
        let key = key.into();
        let market = self.markets.entry(market_id.to_string()).or_default();
        if self.keys.insert(key.clone()) {
            market
                .buckets
                .entry(timestamp.timestamp().div_euclid(BUCKET_SECS))
                .or_default()
                .push(key);
        }
        if market.latest.map_or(true, |latest| timestamp > latest) {
            market.latest = Some(timestamp);
        }
    }

    /// Drop, per market, buckets that lie entirely before the retention
    /// cutoff
    ///
    /// Call between provider pages, never in the middle of one: a page can
    /// span more than the retention and its older trades must still be
    /// analyzed. Returns the number of evicted keys. Does nothing without a
    /// retention.
    pub fn evict_expired(&mut self) -> usize {
        let Some(retention) = self.retention else {
            return 0;
        };
        let mut evicted = 0;
        for (market_id, market) in &mut self.markets {
            let Some(latest) = market.latest else {
                continue;
            };
            let cutoff_bucket = (latest - retention).timestamp().div_euclid(BUCKET_SECS);
            if market
                .buckets
                .first_key_value()
                .map_or(true, |(bucket, _)| *bucket >= cutoff_bucket)
            {
                continue;
            }

            let kept = market.buckets.split_off(&cutoff_bucket);
            let expired = std::mem::replace(&mut market.buckets, kept);
            let mut dropped = 0;
            for key in expired.into_values().flatten() {
                self.keys.remove(&key);
                dropped += 1;
            }

            let boundary = Utc.timestamp_opt(cutoff_bucket * BUCKET_SECS, 0).single();
            if boundary > market.horizon {
                market.horizon = boundary;
            }
            tracing::debug!(
                market_id = %market_id,
                evicted = dropped,
                horizon = ?market.horizon,
                "Evicted expired dedup keys"
            );
            evicted += dropped;
        }
        evicted
    }

    /// Number of keys held
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no keys are held
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Oldest trade time still accepted on `market_id`, if eviction has
    /// happened there
    pub fn horizon(&self, market_id: &str) -> Option<DateTime<Utc>> {
        self.markets.get(market_id).and_then(|m| m.horizon)
    }
}
