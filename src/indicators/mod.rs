pub mod adx;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod stochastic;
pub mod trend_strength;
pub mod vwap;

pub use adx::*;
pub use bollinger::*;
pub use ema::*;
pub use macd::*;
pub use rsi::*;
pub use stochastic::*;
pub use trend_strength::*;
pub use vwap::*;

use rust_decimal::Decimal;

/// Arithmetic mean of the trailing `period` values.
pub fn sma(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    let sum: Decimal = values.iter().rev().take(period).sum();
    Some(sum / Decimal::from(period as u32))
}

/// Simple moving average series: defined from index `period - 1`.
pub fn sma_series(values: &[Decimal], period: usize) -> Vec<Option<Decimal>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < period {
                None
            } else {
                sma(&values[..=i], period)
            }
        })
        .collect()
}

pub fn highest(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    values.iter().rev().take(period).max().copied()
}

pub fn lowest(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    values.iter().rev().take(period).min().copied()
}

/// Population standard deviation of the trailing `period` values.
pub fn stddev(values: &[Decimal], period: usize) -> Option<Decimal> {
    if period == 0 || values.len() < period {
        return None;
    }
    let mean = sma(values, period)?;
    let variance: Decimal = values
        .iter()
        .rev()
        .take(period)
        .map(|v| {
            let diff = *v - mean;
            diff * diff
        })
        .sum::<Decimal>()
        / Decimal::from(period as u32);

    Some(sqrt_decimal(variance))
}

/// Newton's method square root; negative input collapses to zero.
pub fn sqrt_decimal(value: Decimal) -> Decimal {
    if value.is_zero() || value.is_sign_negative() {
        return Decimal::ZERO;
    }

    let mut guess = value / Decimal::from(2);
    let epsilon = Decimal::new(1, 10);

    for _ in 0..50 {
        let new_guess = (guess + value / guess) / Decimal::from(2);
        if (new_guess - guess).abs() < epsilon {
            return new_guess;
        }
        guess = new_guess;
    }
    guess
}
