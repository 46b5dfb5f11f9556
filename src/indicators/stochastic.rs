use rust_decimal::Decimal;

use crate::types::Bar;

/// %K and %D series aligned with the input bars.
///
/// %K is defined from index `k_period - 1`; %D (the SMA of %K over
/// `d_period`) from index `k_period + d_period - 2`. A flat window
/// (highest == lowest) reads %K = 50 instead of dividing by zero.
pub fn stochastic_series(
    bars: &[Bar],
    k_period: usize,
    d_period: usize,
) -> (Vec<Option<Decimal>>, Vec<Option<Decimal>>) {
    let n = bars.len();
    let mut k_series: Vec<Option<Decimal>> = vec![None; n];
    let mut d_series: Vec<Option<Decimal>> = vec![None; n];
    if k_period == 0 || d_period == 0 {
        return (k_series, d_series);
    }

    for i in (k_period - 1)..n {
        let window = &bars[i + 1 - k_period..=i];
        let highest = window
            .iter()
            .map(|b| b.high)
            .max()
            .unwrap_or(bars[i].high);
        let lowest = window.iter().map(|b| b.low).min().unwrap_or(bars[i].low);
        let range = highest - lowest;
        let k = if range.is_zero() {
            Decimal::from(50)
        } else {
            (bars[i].close - lowest) / range * Decimal::from(100)
        };
        k_series[i] = Some(k);

        if i + 2 >= k_period + d_period {
            let sum: Decimal = k_series[i + 1 - d_period..=i]
                .iter()
                .map(|k| k.unwrap_or_default())
                .sum();
            d_series[i] = Some(sum / Decimal::from(d_period as u32));
        }
    }

    (k_series, d_series)
}
