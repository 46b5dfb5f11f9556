use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Nominal volume assigned when the data source reports none.
pub const DEFAULT_VOLUME: Decimal = dec!(1000);

/// One OHLCV sample at a fixed time granularity.
///
/// Bars are immutable once produced by the data provider; the provider
/// guarantees ascending, unique timestamps and `low <= open,close <= high`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Option<Decimal>,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: volume.unwrap_or(DEFAULT_VOLUME),
        }
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// (high + low + close) / 3, the price VWAP weights by volume.
    pub fn typical_price(&self) -> Decimal {
        (self.high + self.low + self.close) / Decimal::from(3)
    }

    pub fn ohlc4(&self) -> Decimal {
        (self.open + self.high + self.low + self.close) / Decimal::from(4)
    }
}

pub fn closes(bars: &[Bar]) -> Vec<Decimal> {
    bars.iter().map(|b| b.close).collect()
}

pub fn highest_high(bars: &[Bar]) -> Option<Decimal> {
    bars.iter().map(|b| b.high).max()
}

pub fn lowest_low(bars: &[Bar]) -> Option<Decimal> {
    bars.iter().map(|b| b.low).min()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar::new(
            Utc::now(),
            Decimal::try_from(open).unwrap(),
            Decimal::try_from(high).unwrap(),
            Decimal::try_from(low).unwrap(),
            Decimal::try_from(close).unwrap(),
            None,
        )
    }

    #[test]
    fn default_volume_applied_when_absent() {
        let b = bar(1.0850, 1.0860, 1.0840, 1.0855);
        assert_eq!(b.volume, DEFAULT_VOLUME);
    }

    #[test]
    fn typical_price_is_hlc3() {
        let b = bar(1.0, 1.2, 0.9, 1.1);
        assert_eq!(b.typical_price(), (dec!(1.2) + dec!(0.9) + dec!(1.1)) / dec!(3));
    }

    #[test]
    fn window_extremes() {
        let bars = vec![bar(1.0, 1.5, 0.8, 1.2), bar(1.2, 1.4, 0.7, 1.0)];
        assert_eq!(highest_high(&bars), Some(dec!(1.5)));
        assert_eq!(lowest_low(&bars), Some(dec!(0.7)));
    }
}
