use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

use crate::types::{Bar, Timeframe};

/// Source of historical OHLCV bars. The engine treats it as opaque; real
/// deployments wire a broker or data-vendor client here.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Bars covering `[start, end)` in chronological order. An empty vec
    /// means the source has no data for the request.
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timeframe: Timeframe,
    ) -> Result<Vec<Bar>>;
}

/// Deterministic random-walk bar generator for offline runs and tests.
/// The same seed, symbol and window always produce the same series.
pub struct SyntheticDataProvider {
    seed: u64,
    /// Per-bar fractional drift.
    drift: f64,
    /// Per-bar fractional volatility.
    volatility: f64,
    start_price: f64,
}

impl SyntheticDataProvider {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            drift: 0.0,
            volatility: 0.0004,
            start_price: 1.0850,
        }
    }

    pub fn with_drift(mut self, drift: f64) -> Self {
        self.drift = drift;
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    pub fn with_start_price(mut self, start_price: f64) -> Self {
        self.start_price = start_price;
        self
    }

    fn rng_for(&self, symbol: &str) -> StdRng {
        let mut hasher = DefaultHasher::new();
        symbol.hash(&mut hasher);
        StdRng::seed_from_u64(self.seed ^ hasher.finish())
    }
}

#[async_trait]
impl MarketDataProvider for SyntheticDataProvider {
    async fn fetch_bars(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timeframe: Timeframe,
    ) -> Result<Vec<Bar>> {
        if start >= end {
            return Ok(Vec::new());
        }

        let step = Duration::minutes(timeframe.minutes() as i64);
        let mut rng = self.rng_for(symbol);
        let mut bars = Vec::new();
        let mut price = self.start_price;
        let mut timestamp = start;

        while timestamp < end {
            let noise: f64 = rng.gen_range(-1.0..1.0);
            let open = price;
            let close = open * (1.0 + self.drift + self.volatility * noise);
            let wick_up: f64 = rng.gen_range(0.0..self.volatility);
            let wick_down: f64 = rng.gen_range(0.0..self.volatility);
            let high = open.max(close) * (1.0 + wick_up);
            let low = open.min(close) * (1.0 - wick_down);
            let volume = rng.gen_range(500.0..1500.0_f64);

            bars.push(Bar::new(
                timestamp,
                to_price(open)?,
                to_price(high)?,
                to_price(low)?,
                to_price(close)?,
                Some(Decimal::try_from(volume.round())?),
            ));

            price = close;
            timestamp += step;
        }

        debug!(symbol, bars = bars.len(), "generated synthetic series");
        Ok(bars)
    }
}

fn to_price(value: f64) -> Result<Decimal> {
    Ok(Decimal::try_from(value)?.round_dp(5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (start, start + Duration::days(2))
    }

    #[tokio::test]
    async fn same_seed_is_deterministic() {
        let (start, end) = window();
        let a = SyntheticDataProvider::new(42)
            .fetch_bars("EURUSD", start, end, Timeframe::M5)
            .await
            .unwrap();
        let b = SyntheticDataProvider::new(42)
            .fetch_bars("EURUSD", start, end, Timeframe::M5)
            .await
            .unwrap();
        assert_eq!(a.len(), b.len());
        assert!(a
            .iter()
            .zip(&b)
            .all(|(x, y)| x.close == y.close && x.timestamp == y.timestamp));
    }

    #[tokio::test]
    async fn different_symbols_diverge() {
        let (start, end) = window();
        let provider = SyntheticDataProvider::new(42);
        let a = provider
            .fetch_bars("EURUSD", start, end, Timeframe::M5)
            .await
            .unwrap();
        let b = provider
            .fetch_bars("GBPUSD", start, end, Timeframe::M5)
            .await
            .unwrap();
        assert!(a.iter().zip(&b).any(|(x, y)| x.close != y.close));
    }

    #[tokio::test]
    async fn bars_are_well_formed() {
        let (start, end) = window();
        let bars = SyntheticDataProvider::new(7)
            .with_drift(0.0001)
            .fetch_bars("EURUSD", start, end, Timeframe::M5)
            .await
            .unwrap();
        // Two days of M5 bars.
        assert_eq!(bars.len(), 2 * 24 * 12);
        for bar in &bars {
            assert!(bar.high >= bar.open && bar.high >= bar.close);
            assert!(bar.low <= bar.open && bar.low <= bar.close);
            assert!(bar.volume > Decimal::ZERO);
        }
        for pair in bars.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::minutes(5));
        }
    }

    #[tokio::test]
    async fn empty_window_yields_no_bars() {
        let (start, _) = window();
        let bars = SyntheticDataProvider::new(1)
            .fetch_bars("EURUSD", start, start, Timeframe::M5)
            .await
            .unwrap();
        assert!(bars.is_empty());
    }
}
