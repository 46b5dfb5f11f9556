use rust_decimal::Decimal;

use crate::types::Bar;

/// Running volume-weighted average price, cumulative from the start of
/// the series (not a rolling window). If no volume has accumulated yet
/// the typical price stands in.
pub fn vwap_series(bars: &[Bar]) -> Vec<Decimal> {
    let mut out = Vec::with_capacity(bars.len());
    let mut cumulative_pv = Decimal::ZERO;
    let mut cumulative_volume = Decimal::ZERO;

    for bar in bars {
        cumulative_pv += bar.typical_price() * bar.volume;
        cumulative_volume += bar.volume;
        if cumulative_volume.is_zero() {
            out.push(bar.typical_price());
        } else {
            out.push(cumulative_pv / cumulative_volume);
        }
    }

    out
}
