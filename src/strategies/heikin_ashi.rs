use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{Bar, Side, SignalAction, Timeframe};

use super::{swing_stop, target_from_stop, Signal, Strategy, SWING_BUFFER};

const HA_WINDOW: usize = 60;
const PATTERN_LEN: usize = 7;
const MIN_TREND_RUN: usize = 3;
const MAX_PULLBACK: usize = 2;
const SWING_LOOKBACK: usize = 10;
const TARGET_MULTIPLIER: Decimal = dec!(2.0);
const PATTERN_CONFIDENCE: Decimal = dec!(85);

#[derive(Debug, Clone, Copy)]
struct HaCandle {
    open: Decimal,
    close: Decimal,
}

impl HaCandle {
    fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// Trend-pullback pattern on synthetic Heikin-Ashi candles: a run of at
/// least three same-color candles, one or two opposite-color pullback
/// candles, then a reversion to the trend color on the current candle.
pub struct HeikinAshiPullback;

impl HeikinAshiPullback {
    pub fn new() -> Self {
        Self
    }

    /// Heikin-Ashi transform over the trailing window. The first candle
    /// seeds `ha_open` from its own midpoint.
    fn ha_candles(bars: &[Bar]) -> Vec<HaCandle> {
        let window = &bars[bars.len().saturating_sub(HA_WINDOW)..];
        let mut out: Vec<HaCandle> = Vec::with_capacity(window.len());
        for bar in window {
            let ha_close = bar.ohlc4();
            let ha_open = match out.last() {
                Some(prev) => (prev.open + prev.close) / Decimal::from(2),
                None => (bar.open + bar.close) / Decimal::from(2),
            };
            out.push(HaCandle {
                open: ha_open,
                close: ha_close,
            });
        }
        out
    }

    /// Matches the run/pullback/reversion shape on the last seven
    /// candles, returning the trend direction when it fires.
    fn match_pattern(candles: &[HaCandle]) -> Option<(Side, usize, usize)> {
        if candles.len() < PATTERN_LEN {
            return None;
        }
        let recent = &candles[candles.len() - PATTERN_LEN..];
        let trend_bullish = recent[PATTERN_LEN - 1].is_bullish();

        let mut i = PATTERN_LEN - 1;
        let mut pullback = 0;
        while i > 0 && recent[i - 1].is_bullish() != trend_bullish {
            pullback += 1;
            i -= 1;
        }
        if pullback == 0 || pullback > MAX_PULLBACK {
            return None;
        }

        let mut run = 0;
        while i > 0 && recent[i - 1].is_bullish() == trend_bullish {
            run += 1;
            i -= 1;
        }
        if run < MIN_TREND_RUN {
            return None;
        }

        let side = if trend_bullish { Side::Buy } else { Side::Sell };
        Some((side, run, pullback))
    }
}

impl Default for HeikinAshiPullback {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for HeikinAshiPullback {
    fn id(&self) -> &'static str {
        "heikin-ashi-pullback"
    }

    fn name(&self) -> &'static str {
        "Heikin-Ashi Pullback"
    }

    fn timeframe(&self) -> Timeframe {
        Timeframe::M5
    }

    fn win_rate_expectation(&self) -> &'static str {
        "55-62%"
    }

    fn min_bars(&self) -> usize {
        20
    }

    fn analyze(&self, bars: &[Bar]) -> Result<Signal> {
        if bars.len() < self.min_bars() {
            return Ok(Signal::wait(format!(
                "insufficient history: {} of {} bars",
                bars.len(),
                self.min_bars()
            )));
        }

        let candles = Self::ha_candles(bars);
        let Some((side, run, pullback)) = Self::match_pattern(&candles) else {
            return Ok(Signal::wait("no pullback-reversion pattern"));
        };

        let entry = bars[bars.len() - 1].close;
        let stop_loss = swing_stop(bars, SWING_LOOKBACK, side, SWING_BUFFER);
        let take_profit = target_from_stop(entry, stop_loss, side, TARGET_MULTIPLIER);

        let action = match side {
            Side::Buy => SignalAction::Buy,
            Side::Sell => SignalAction::Sell,
        };
        Ok(Signal::entry(
            action,
            PATTERN_CONFIDENCE,
            entry,
            stop_loss,
            take_profit,
            format!(
                "HA trend run of {} with {}-candle pullback reverted",
                run, pullback
            ),
        ))
    }
}
