use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const RETURN_WINDOW: usize = 20;

/// Trend strength of the trailing closes, normalised to `[0, 1]`.
///
/// Measures the mean bar-over-bar return against its population standard
/// deviation over the last 20 returns. A persistent drift in either
/// direction with low noise reads close to 1; choppy price action reads
/// close to 0. Returns `None` until 21 closes are available.
pub fn trend_strength(closes: &[Decimal]) -> Option<f64> {
    if closes.len() < RETURN_WINDOW + 1 {
        return None;
    }

    let tail = &closes[closes.len() - (RETURN_WINDOW + 1)..];
    let mut returns = Vec::with_capacity(RETURN_WINDOW);
    for pair in tail.windows(2) {
        let prev = pair[0].to_f64()?;
        let cur = pair[1].to_f64()?;
        if prev == 0.0 {
            return Some(0.0);
        }
        returns.push((cur - prev) / prev);
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let strength = mean.abs() / (variance.sqrt() + 1e-10) / 2.0;

    Some(strength.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn steady_drift_saturates_to_one() {
        // Constant positive returns: zero deviation, huge ratio.
        let mut closes = Vec::new();
        let mut price = dec!(1.0500);
        for _ in 0..30 {
            closes.push(price);
            price *= dec!(1.001);
        }
        assert_eq!(trend_strength(&closes), Some(1.0));
    }

    #[test]
    fn alternating_chop_reads_near_zero() {
        let closes: Vec<Decimal> = (0..30)
            .map(|i| {
                if i % 2 == 0 {
                    dec!(1.0850)
                } else {
                    dec!(1.0840)
                }
            })
            .collect();
        let strength = trend_strength(&closes).unwrap();
        assert!(strength < 0.1, "chop should read weak, got {strength}");
    }

    #[test]
    fn flat_series_is_zero() {
        let closes = vec![dec!(1.0850); 30];
        assert_eq!(trend_strength(&closes), Some(0.0));
    }

    #[test]
    fn insufficient_history_is_none() {
        let closes = vec![dec!(1.0850); 20];
        assert_eq!(trend_strength(&closes), None);
    }
}
