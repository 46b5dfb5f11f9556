use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::indicators::stochastic_series;
use crate::types::{Bar, Side, SignalAction, Timeframe};

use super::{clamp_confidence, swing_stop, target_from_stop, Signal, Strategy, SWING_BUFFER};

const K_PERIOD: usize = 14;
const D_PERIOD: usize = 3;
const OVERSOLD: Decimal = dec!(20);
const OVERBOUGHT: Decimal = dec!(80);
const SWING_LOOKBACK: usize = 10;
const TARGET_MULTIPLIER: Decimal = dec!(1.5);

/// %K/%D crossover taken only inside the extreme zones: BUY on a %K-over-%D
/// cross while both sit below 20, SELL on the mirror cross above 80.
pub struct StochasticQuick;

impl StochasticQuick {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StochasticQuick {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for StochasticQuick {
    fn id(&self) -> &'static str {
        "stochastic-quick"
    }

    fn name(&self) -> &'static str {
        "Stochastic Quick Signal"
    }

    fn timeframe(&self) -> Timeframe {
        Timeframe::M1
    }

    fn win_rate_expectation(&self) -> &'static str {
        "52-60%"
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

        let (k_series, d_series) = stochastic_series(bars, K_PERIOD, D_PERIOD);
        let i = bars.len() - 1;
        let (Some(k), Some(d), Some(prev_k), Some(prev_d)) =
            (k_series[i], d_series[i], k_series[i - 1], d_series[i - 1])
        else {
            return Ok(Signal::wait("stochastic not yet defined"));
        };

        let crossed_up = prev_k <= prev_d && k > d;
        let crossed_down = prev_k >= prev_d && k < d;

        let (side, depth) = if crossed_up && k < OVERSOLD && d < OVERSOLD {
            (Side::Buy, OVERSOLD - k.max(d))
        } else if crossed_down && k > OVERBOUGHT && d > OVERBOUGHT {
            (Side::Sell, k.min(d) - OVERBOUGHT)
        } else {
            return Ok(Signal::wait(format!(
                "%K {:.1} / %D {:.1} without zone crossover",
                k, d
            )));
        };

        let entry = bars[i].close;
        let stop_loss = swing_stop(bars, SWING_LOOKBACK, side, SWING_BUFFER);
        let take_profit = target_from_stop(entry, stop_loss, side, TARGET_MULTIPLIER);
        let confidence = clamp_confidence(dec!(70) + depth.max(Decimal::ZERO));

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
            format!("%K {:.1} crossed %D {:.1} in extreme zone", k, d),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn bars_from_ohlc(data: &[(Decimal, Decimal, Decimal, Decimal)]) -> Vec<Bar> {
        let start = Utc::now();
        data.iter()
            .enumerate()
            .map(|(i, &(o, h, l, c))| {
                Bar::new(start + Duration::minutes(i as i64), o, h, l, c, None)
            })
            .collect()
    }

    /// Wide early range fixes the window extremes, then closes hug the
    /// bottom of the range (both lines deep under 20) with a final uptick
    /// that lifts %K over %D.
    fn oversold_crossover() -> Vec<Bar> {
        let mut data = Vec::new();
        // Range-setting bars: highs at 1.0900, lows at 1.0800.
        for _ in 0..10 {
            data.push((dec!(1.0850), dec!(1.0900), dec!(1.0800), dec!(1.0850)));
        }
        // Grind along the low: %K sinks as the range-setting bars stay
        // inside the window.
        for _ in 0..8 {
            data.push((dec!(1.0805), dec!(1.0808), dec!(1.0801), dec!(1.0803)));
        }
        // Uptick, still well below the 20 line.
        data.push((dec!(1.0803), dec!(1.0812), dec!(1.0802), dec!(1.0810)));
        bars_from_ohlc(&data)
    }

    #[test]
    fn insufficient_history_waits_with_zero_confidence() {
        let strategy = StochasticQuick::new();
        let bars = oversold_crossover();
        let signal = strategy.analyze(&bars[..15]).unwrap();
        assert!(signal.action.is_wait());
        assert_eq!(signal.confidence, Decimal::ZERO);
    }

    #[test]
    fn buy_on_oversold_crossover() {
        let bars = oversold_crossover();
        let (k, d) = stochastic_series(&bars, K_PERIOD, D_PERIOD);
        let i = bars.len() - 1;
        assert!(k[i].unwrap() > d[i].unwrap(), "final bar must cross up");
        assert!(k[i].unwrap() < OVERSOLD && d[i].unwrap() < OVERSOLD);
        assert!(k[i - 1].unwrap() <= d[i - 1].unwrap());

        let strategy = StochasticQuick::new();
        let signal = strategy.analyze(&bars).unwrap();
        assert_eq!(signal.action, SignalAction::Buy);
        assert!(signal.confidence >= dec!(70));
        assert!(signal.stop_loss < signal.entry);

        let risk = signal.entry - signal.stop_loss;
        assert_eq!(signal.take_profit, signal.entry + risk * dec!(1.5));
    }

    #[test]
    fn midrange_crossover_waits() {
        // Closes around the middle of the window range.
        let mut data = vec![(dec!(1.0850), dec!(1.0900), dec!(1.0800), dec!(1.0850)); 18];
        data.push((dec!(1.0850), dec!(1.0860), dec!(1.0840), dec!(1.0855)));
        let strategy = StochasticQuick::new();
        let signal = strategy.analyze(&bars_from_ohlc(&data)).unwrap();
        assert!(signal.action.is_wait());
    }

    #[test]
    fn sell_on_overbought_crossover() {
        let mut data = Vec::new();
        for _ in 0..10 {
            data.push((dec!(1.0850), dec!(1.0900), dec!(1.0800), dec!(1.0850)));
        }
        for _ in 0..8 {
            data.push((dec!(1.0895), dec!(1.0899), dec!(1.0892), dec!(1.0897)));
        }
        // Downtick while both lines remain above 80.
        data.push((dec!(1.0897), dec!(1.0898), dec!(1.0888), dec!(1.0890)));
        let bars = bars_from_ohlc(&data);

        let strategy = StochasticQuick::new();
        let signal = strategy.analyze(&bars).unwrap();
        assert_eq!(signal.action, SignalAction::Sell);
        assert!(signal.stop_loss > signal.entry);
        assert!(signal.take_profit < signal.entry);
    }
}
