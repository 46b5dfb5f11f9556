use rust_decimal::Decimal;

use super::ema::ema_series;

/// Full MACD output, aligned index-for-index with the input closes.
/// Every component is defined from index 0 because the underlying EMAs are.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub macd: Vec<Decimal>,
    pub signal: Vec<Decimal>,
    pub histogram: Vec<Decimal>,
}

pub fn macd_series(
    values: &[Decimal],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdSeries {
    let fast = ema_series(values, fast_period);
    let slow = ema_series(values, slow_period);
    let macd: Vec<Decimal> = fast.iter().zip(&slow).map(|(f, s)| *f - *s).collect();
    let signal = ema_series(&macd, signal_period);
    let histogram: Vec<Decimal> = macd.iter().zip(&signal).map(|(m, s)| *m - *s).collect();
    MacdSeries {
        macd,
        signal,
        histogram,
    }
}

pub fn default_macd(values: &[Decimal]) -> MacdSeries {
    macd_series(values, 12, 26, 9)
}
