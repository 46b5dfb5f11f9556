use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::indicators::rsi_series;
use crate::types::{closes, Bar, Side, SignalAction, Timeframe};

use super::{clamp_confidence, swing_stop, target_from_stop, Signal, Strategy, SWING_BUFFER};

const RSI_PERIOD: usize = 7;
const OVERSOLD: Decimal = dec!(20);
const OVERBOUGHT: Decimal = dec!(80);
const SWING_LOOKBACK: usize = 10;
const TARGET_MULTIPLIER: Decimal = dec!(2.0);

/// Fades short-period RSI extremes: BUY when RSI(7) crosses back up
/// through 20, SELL when it crosses back down through 80. Confidence
/// grows with how deep the reading sat in the extreme zone before the
/// cross.
pub struct RsiExtremes;

impl RsiExtremes {
    pub fn new() -> Self {
        Self
    }

    /// Deepest reading inside the extreme zone over the bars leading into
    /// the cross.
    fn zone_depth(rsi: &[Option<Decimal>], side: Side) -> Decimal {
        let window = rsi.iter().rev().skip(1).take(5).flatten();
        match side {
            Side::Buy => window
                .min()
                .map(|deepest| (OVERSOLD - *deepest).max(Decimal::ZERO))
                .unwrap_or_default(),
            Side::Sell => window
                .max()
                .map(|deepest| (*deepest - OVERBOUGHT).max(Decimal::ZERO))
                .unwrap_or_default(),
        }
    }
}

impl Default for RsiExtremes {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for RsiExtremes {
    fn id(&self) -> &'static str {
        "rsi-extremes"
    }

    fn name(&self) -> &'static str {
        "RSI Extremes"
    }

    fn timeframe(&self) -> Timeframe {
        Timeframe::M5
    }

    fn win_rate_expectation(&self) -> &'static str {
        "58-65%"
    }

    fn min_bars(&self) -> usize {
        12
    }

    fn analyze(&self, bars: &[Bar]) -> Result<Signal> {
        if bars.len() < self.min_bars() {
            return Ok(Signal::wait(format!(
                "insufficient history: {} of {} bars",
                bars.len(),
                self.min_bars()
            )));
        }

        let rsi = rsi_series(&closes(bars), RSI_PERIOD);
        let i = bars.len() - 1;
        let (Some(current), Some(previous)) = (rsi[i], rsi[i - 1]) else {
            return Ok(Signal::wait("RSI not yet defined"));
        };

        let side = if previous < OVERSOLD && current > OVERSOLD {
            Side::Buy
        } else if previous > OVERBOUGHT && current < OVERBOUGHT {
            Side::Sell
        } else {
            return Ok(Signal::wait(format!(
                "RSI {:.1} without extreme cross",
                current
            )));
        };

        let entry = bars[i].close;
        let stop_loss = swing_stop(bars, SWING_LOOKBACK, side, SWING_BUFFER);
        let take_profit = target_from_stop(entry, stop_loss, side, TARGET_MULTIPLIER);
        let confidence = clamp_confidence(dec!(70) + Self::zone_depth(&rsi, side));

        let action = match side {
            Side::Buy => SignalAction::Buy,
            Side::Sell => SignalAction::Sell,
        };
        Ok(Signal::entry(
            action,
            confidence,
            entry,
            stop_loss,
            take_profit,
            format!("RSI(7) {:.1} -> {:.1} crossed extreme", previous, current),
        ))
    }
}
