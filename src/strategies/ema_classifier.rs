use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::indicators::{ema_series, trend_strength};
use crate::types::{closes, Bar, Side, SignalAction, Timeframe};

use super::{swing_stop, target_from_stop, Signal, Strategy, SWING_BUFFER};

const FAST: usize = 21;
const MID: usize = 45;
const SLOW: usize = 90;
const BASELINE: usize = 200;
const MIN_STRENGTH: f64 = 0.6;
const SWING_LOOKBACK: usize = 10;
const TARGET_MULTIPLIER: Decimal = dec!(2.5);
const BASE_CONFIDENCE: Decimal = dec!(80);
const MAX_CONFIDENCE: Decimal = dec!(100);

/// EMA ribbon state at two consecutive bars, as seen by the classifier.
#[derive(Debug, Clone, Copy)]
struct EmaSnapshot {
    fast: Decimal,
    mid: Decimal,
    slow: Decimal,
    baseline: Decimal,
    prev_fast: Decimal,
    prev_mid: Decimal,
    prev_slow: Decimal,
}

/// Four-EMA trend classifier (21/45/90/200). Deliberately selective: it
/// only fires when the fast EMA completes a cross above (or below) both
/// mid EMAs on the current bar while the whole ribbon is already stacked
/// in that direction and the trend-strength score confirms momentum.
pub struct EmaClassifier;

impl EmaClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EmaClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(close: Decimal, snapshot: &EmaSnapshot, strength: f64) -> Option<Side> {
    if strength <= MIN_STRENGTH {
        return None;
    }

    let bullish = close > snapshot.baseline
        && (snapshot.prev_fast <= snapshot.prev_mid || snapshot.prev_fast <= snapshot.prev_slow)
        && snapshot.fast > snapshot.mid
        && snapshot.fast > snapshot.slow
        && snapshot.mid > snapshot.slow
        && snapshot.slow > snapshot.baseline;
    if bullish {
        return Some(Side::Buy);
    }

    let bearish = close < snapshot.baseline
        && (snapshot.prev_fast >= snapshot.prev_mid || snapshot.prev_fast >= snapshot.prev_slow)
        && snapshot.fast < snapshot.mid
        && snapshot.fast < snapshot.slow
        && snapshot.mid < snapshot.slow
        && snapshot.slow < snapshot.baseline;
    if bearish {
        return Some(Side::Sell);
    }

    None
}

fn confidence(close: Decimal, snapshot: &EmaSnapshot, side: Side, strength: f64) -> Decimal {
    let beyond_stack = match side {
        Side::Buy => close > snapshot.fast,
        Side::Sell => close < snapshot.fast,
    };
    let alignment_bonus = if beyond_stack { dec!(10) } else { Decimal::ZERO };

    // Scale the remaining headroom from how far strength sits above the
    // minimum gate.
    let scaled = ((strength - MIN_STRENGTH) / (1.0 - MIN_STRENGTH) * 10.0).clamp(0.0, 10.0);
    let strength_bonus = Decimal::try_from(scaled).unwrap_or(Decimal::ZERO);

    (BASE_CONFIDENCE + alignment_bonus + strength_bonus).min(MAX_CONFIDENCE)
}

impl Strategy for EmaClassifier {
    fn id(&self) -> &'static str {
        "ema-classifier"
    }

    fn name(&self) -> &'static str {
        "ML EMA Classification"
    }

    fn timeframe(&self) -> Timeframe {
        Timeframe::M5
    }

    fn win_rate_expectation(&self) -> &'static str {
        "68-75%"
    }

    fn is_premium(&self) -> bool {
        true
    }

    fn min_bars(&self) -> usize {
        BASELINE
    }

    fn analyze(&self, bars: &[Bar]) -> Result<Signal> {
        if bars.len() < self.min_bars() {
            return Ok(Signal::wait(format!(
                "insufficient history: {} of {} bars",
                bars.len(),
                self.min_bars()
            )));
        }

        let close_prices = closes(bars);
        let fast = ema_series(&close_prices, FAST);
        let mid = ema_series(&close_prices, MID);
        let slow = ema_series(&close_prices, SLOW);
        let baseline = ema_series(&close_prices, BASELINE);

        let i = bars.len() - 1;
        let snapshot = EmaSnapshot {
            fast: fast[i],
            mid: mid[i],
            slow: slow[i],
            baseline: baseline[i],
            prev_fast: fast[i - 1],
            prev_mid: mid[i - 1],
            prev_slow: slow[i - 1],
        };

        let Some(strength) = trend_strength(&close_prices) else {
            return Ok(Signal::wait("trend strength not yet defined"));
        };
        let close = bars[i].close;
        let Some(side) = classify(close, &snapshot, strength) else {
            return Ok(Signal::wait(format!(
                "no fresh EMA alignment (strength {:.2})",
                strength
            )));
        };

        let stop_loss = swing_stop(bars, SWING_LOOKBACK, side, SWING_BUFFER);
        let take_profit = target_from_stop(close, stop_loss, side, TARGET_MULTIPLIER);
        let action = match side {
            Side::Buy => SignalAction::Buy,
            Side::Sell => SignalAction::Sell,
        };
        Ok(Signal::entry(
            action,
            confidence(close, &snapshot, side, strength),
            close,
            stop_loss,
            take_profit,
            format!("fresh 21-EMA cross with stacked ribbon, strength {:.2}", strength),
        ))
    }
}
