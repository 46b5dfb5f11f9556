use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::indicators::{adx, bollinger_bands, rsi_series};
use crate::types::{closes, Bar, Side, SignalAction, Timeframe};

use super::{clamp_confidence, target_from_stop, Signal, Strategy, PIP};

const BB_PERIOD: usize = 20;
const BB_DEVIATION: Decimal = dec!(2);
const RSI_PERIOD: usize = 7;
const RSI_BUY: Decimal = dec!(30);
const RSI_SELL: Decimal = dec!(70);
const ADX_PERIOD: usize = 14;
const ADX_RANGING_MAX: Decimal = dec!(32);
const STOP_BUFFER: Decimal = dec!(0.0007);
const TARGET_MULTIPLIER: Decimal = dec!(1.8);

/// Mean-reversion combo for ranging markets: a band touch plus an RSI
/// recovery cross, filtered by ADX to stay out of trends.
pub struct BollingerRsiAdx;

impl BollingerRsiAdx {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BollingerRsiAdx {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for BollingerRsiAdx {
    fn id(&self) -> &'static str {
        "bollinger-rsi-adx"
    }

    fn name(&self) -> &'static str {
        "Bollinger + RSI + ADX Combo"
    }

    fn timeframe(&self) -> Timeframe {
        Timeframe::M5
    }

    fn win_rate_expectation(&self) -> &'static str {
        "60-68%"
    }

    fn is_premium(&self) -> bool {
        true
    }

    fn min_bars(&self) -> usize {
        30
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
        let Some(bands) = bollinger_bands(&close_prices, BB_PERIOD, BB_DEVIATION) else {
            return Ok(Signal::wait("Bollinger bands not yet defined"));
        };
        let Some(adx_value) = adx(bars, ADX_PERIOD) else {
            return Ok(Signal::wait("ADX not yet defined"));
        };
        if adx_value >= ADX_RANGING_MAX {
            return Ok(Signal::wait(format!(
                "ADX {:.1} signals trending market",
                adx_value
            )));
        }

        let rsi = rsi_series(&close_prices, RSI_PERIOD);
        let i = bars.len() - 1;
        let (Some(current_rsi), Some(previous_rsi)) = (rsi[i], rsi[i - 1]) else {
            return Ok(Signal::wait("RSI not yet defined"));
        };

        let bar = &bars[i];
        let rsi_crossed_up = previous_rsi < RSI_BUY && current_rsi > RSI_BUY;
        let rsi_crossed_down = previous_rsi > RSI_SELL && current_rsi < RSI_SELL;

        let (side, penetration) = if bar.low <= bands.lower && rsi_crossed_up {
            (Side::Buy, (bands.lower - bar.low) / PIP)
        } else if bar.high >= bands.upper && rsi_crossed_down {
            (Side::Sell, (bar.high - bands.upper) / PIP)
        } else {
            return Ok(Signal::wait(format!(
                "no band touch with RSI cross (RSI {:.1}, band {:.5}/{:.5})",
                current_rsi, bands.lower, bands.upper
            )));
        };

        let entry = bar.close;
        let stop_loss = match side {
            Side::Buy => bar.low - STOP_BUFFER,
            Side::Sell => bar.high + STOP_BUFFER,
        };
        let take_profit = target_from_stop(entry, stop_loss, side, TARGET_MULTIPLIER);

        let confidence = clamp_confidence(
            dec!(70)
                + penetration.max(Decimal::ZERO).min(dec!(10))
                + ((ADX_RANGING_MAX - adx_value) / dec!(2)).min(dec!(10)),
        );

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
            format!(
                "band touch with RSI(7) cross at ADX {:.1}",
                adx_value
            ),
        ))
    }
}
