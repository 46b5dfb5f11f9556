use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::indicators::{default_macd, vwap_series};
use crate::types::{closes, Bar, Side, SignalAction, Timeframe};

use super::{clamp_confidence, swing_stop, target_from_stop, Signal, Strategy, PIP, SWING_BUFFER};

const VWAP_STOP_BUFFER: Decimal = dec!(0.0003);
const SWING_LOOKBACK: usize = 5;
const TARGET_MULTIPLIER: Decimal = dec!(2);

/// Trades MACD histogram flips in the direction of the session VWAP:
/// price on the right side of the running VWAP plus fresh momentum.
pub struct VwapMacd;

impl VwapMacd {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VwapMacd {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for VwapMacd {
    fn id(&self) -> &'static str {
        "vwap-macd"
    }

    fn name(&self) -> &'static str {
        "VWAP + MACD Momentum"
    }

    fn timeframe(&self) -> Timeframe {
        Timeframe::M5
    }

    fn win_rate_expectation(&self) -> &'static str {
        "58-65%"
    }

    fn min_bars(&self) -> usize {
        40
    }

    fn analyze(&self, bars: &[Bar]) -> Result<Signal> {
        if bars.len() < self.min_bars() {
            return Ok(Signal::wait(format!(
                "insufficient history: {} of {} bars",
                bars.len(),
                self.min_bars()
            )));
        }

        let i = bars.len() - 1;
        let vwap = vwap_series(bars)[i];
        let macd = default_macd(&closes(bars));
        let histogram = macd.histogram[i];
        let previous_histogram = macd.histogram[i - 1];

        let close = bars[i].close;
        let flipped_up = previous_histogram <= Decimal::ZERO && histogram > Decimal::ZERO;
        let flipped_down = previous_histogram >= Decimal::ZERO && histogram < Decimal::ZERO;

        let side = if close > vwap && flipped_up {
            Side::Buy
        } else if close < vwap && flipped_down {
            Side::Sell
        } else {
            return Ok(Signal::wait(format!(
                "no histogram flip on VWAP side (close {:.5}, VWAP {:.5})",
                close, vwap
            )));
        };

        // Two stop candidates: just beyond the VWAP line and beyond the
        // recent swing. Take whichever sits closer to the entry.
        let vwap_stop = match side {
            Side::Buy => vwap - VWAP_STOP_BUFFER,
            Side::Sell => vwap + VWAP_STOP_BUFFER,
        };
        let swing = swing_stop(bars, SWING_LOOKBACK, side, SWING_BUFFER);
        let stop_loss = match side {
            Side::Buy => vwap_stop.max(swing),
            Side::Sell => vwap_stop.min(swing),
        };
        let take_profit = target_from_stop(close, stop_loss, side, TARGET_MULTIPLIER);

        let vwap_distance_pips = (close - vwap).abs() / PIP;
        let histogram_pips = histogram.abs() / PIP;
        let confidence = clamp_confidence(
            dec!(70)
                + (vwap_distance_pips / dec!(2)).min(dec!(10))
                + histogram_pips.min(dec!(10)),
        );

        let action = match side {
            Side::Buy => SignalAction::Buy,
            Side::Sell => SignalAction::Sell,
        };
        Ok(Signal::entry(
            action,
            confidence,
            close,
            stop_loss,
            take_profit,
            format!(
                "MACD histogram flip {} VWAP ({:.1} pips away)",
                match side {
                    Side::Buy => "above",
                    Side::Sell => "below",
                },
                vwap_distance_pips
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn flat_bars(count: usize, close: Decimal) -> Vec<Bar> {
        let start = Utc::now();
        (0..count)
            .map(|i| {
                Bar::new(
                    start + Duration::minutes(5 * i as i64),
                    close,
                    close + dec!(0.0003),
                    close - dec!(0.0003),
                    close,
                    None,
                )
            })
            .collect()
    }

    fn push_bar(bars: &mut Vec<Bar>, open: Decimal, high: Decimal, low: Decimal, close: Decimal) {
        let timestamp = bars[bars.len() - 1].timestamp + Duration::minutes(5);
        bars.push(Bar::new(timestamp, open, high, low, close, None));
    }

    /// A quiet session keeps the histogram pinned at zero; one strong bar
    /// flips it positive while closing well above the running VWAP.
    #[test]
    fn buy_on_histogram_flip_above_vwap() {
        let mut bars = flat_bars(41, dec!(1.0850));
        push_bar(&mut bars, dec!(1.0850), dec!(1.0882), dec!(1.0848), dec!(1.0880));

        let strategy = VwapMacd::new();
        let signal = strategy.analyze(&bars).unwrap();
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.entry, dec!(1.0880));

        // The VWAP-based stop is tighter than the 5-bar swing stop here,
        // so it wins.
        let vwap = vwap_series(&bars)[bars.len() - 1];
        assert_eq!(signal.stop_loss, vwap - VWAP_STOP_BUFFER);
        assert!(signal.stop_loss > dec!(1.0847) - SWING_BUFFER);
        assert_eq!(
            signal.take_profit,
            signal.entry + (signal.entry - signal.stop_loss) * dec!(2)
        );
        assert!(signal.confidence > dec!(70));
        assert!(signal.confidence <= dec!(95));
    }

    #[test]
    fn sell_on_histogram_flip_below_vwap() {
        let mut bars = flat_bars(41, dec!(1.0850));
        push_bar(&mut bars, dec!(1.0850), dec!(1.0852), dec!(1.0818), dec!(1.0820));

        let strategy = VwapMacd::new();
        let signal = strategy.analyze(&bars).unwrap();
        assert_eq!(signal.action, SignalAction::Sell);
        assert!(signal.stop_loss > signal.entry);
        assert!(signal.take_profit < signal.entry);
    }

    #[test]
    fn quiet_market_without_flip_waits() {
        let bars = flat_bars(50, dec!(1.0850));
        let strategy = VwapMacd::new();
        let signal = strategy.analyze(&bars).unwrap();
        assert!(signal.action.is_wait());
    }

    #[test]
    fn insufficient_history_waits() {
        let bars = flat_bars(30, dec!(1.0850));
        let strategy = VwapMacd::new();
        let signal = strategy.analyze(&bars).unwrap();
        assert!(signal.action.is_wait());
        assert_eq!(signal.confidence, Decimal::ZERO);
    }
}
