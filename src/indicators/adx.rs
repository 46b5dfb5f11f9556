use rust_decimal::Decimal;

use crate::types::Bar;

/// Average Directional Index over rolling-window sums.
///
/// True range and directional movement are computed bar-over-bar, summed
/// over a `period` window into +DI/-DI, combined into DX, and DX is then
/// smoothed with a simple moving average. The first defined value sits at
/// index `2 * period - 1`.
pub fn adx_series(bars: &[Bar], period: usize) -> Vec<Option<Decimal>> {
    let n = bars.len();
    let mut out = vec![None; n];
    if period == 0 || n < 2 * period {
        return out;
    }

    let hundred = Decimal::from(100);
    let mut tr = vec![Decimal::ZERO; n];
    let mut plus_dm = vec![Decimal::ZERO; n];
    let mut minus_dm = vec![Decimal::ZERO; n];

    for i in 1..n {
        let prev = &bars[i - 1];
        let cur = &bars[i];
        tr[i] = (cur.high - cur.low)
            .max((cur.high - prev.close).abs())
            .max((cur.low - prev.close).abs());

        let up_move = cur.high - prev.high;
        let down_move = prev.low - cur.low;
        if up_move > down_move && up_move > Decimal::ZERO {
            plus_dm[i] = up_move;
        }
        if down_move > up_move && down_move > Decimal::ZERO {
            minus_dm[i] = down_move;
        }
    }

    let mut dx = vec![None; n];
    for i in period..n {
        let window = (i + 1 - period)..=i;
        let tr_sum: Decimal = tr[window.clone()].iter().sum();
        let (plus_di, minus_di) = if tr_sum.is_zero() {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            let plus: Decimal = plus_dm[window.clone()].iter().sum();
            let minus: Decimal = minus_dm[window].iter().sum();
            (plus / tr_sum * hundred, minus / tr_sum * hundred)
        };
        let di_sum = plus_di + minus_di;
        dx[i] = Some(if di_sum.is_zero() {
            Decimal::ZERO
        } else {
            (plus_di - minus_di).abs() / di_sum * hundred
        });
    }

    for i in (2 * period - 1)..n {
        let sum: Decimal = dx[i + 1 - period..=i]
            .iter()
            .map(|v| v.unwrap_or_default())
            .sum();
        out[i] = Some(sum / Decimal::from(period as u32));
    }

    out
}

/// ADX at the most recent bar, if enough history exists.
pub fn adx(bars: &[Bar], period: usize) -> Option<Decimal> {
    adx_series(bars, period).last().copied().flatten()
}
