use rust_decimal::Decimal;

/// Wilder RSI series. First defined value is at index `period` (one full
/// set of price changes plus the seed bar).
///
/// When the average loss is zero the gain/loss ratio is unbounded; the
/// value is clamped to 100 instead of propagating a division by zero.
pub fn rsi_series(values: &[Decimal], period: usize) -> Vec<Option<Decimal>> {
    let n = values.len();
    let mut out = vec![None; n];
    if period == 0 || n <= period {
        return out;
    }

    let period_dec = Decimal::from(period as u32);
    let mut avg_gain = Decimal::ZERO;
    let mut avg_loss = Decimal::ZERO;

    // Seed from the first `period` changes.
    for i in 1..=period {
        let change = values[i] - values[i - 1];
        if change > Decimal::ZERO {
            avg_gain += change;
        } else {
            avg_loss += change.abs();
        }
    }
    avg_gain /= period_dec;
    avg_loss /= period_dec;
    out[period] = Some(rsi_value(avg_gain, avg_loss));

    for i in (period + 1)..n {
        let change = values[i] - values[i - 1];
        let gain = if change > Decimal::ZERO { change } else { Decimal::ZERO };
        let loss = if change < Decimal::ZERO { change.abs() } else { Decimal::ZERO };
        avg_gain = (avg_gain * (period_dec - Decimal::ONE) + gain) / period_dec;
        avg_loss = (avg_loss * (period_dec - Decimal::ONE) + loss) / period_dec;
        out[i] = Some(rsi_value(avg_gain, avg_loss));
    }

    out
}

fn rsi_value(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        return Decimal::from(100);
    }
    let rs = avg_gain / avg_loss;
    Decimal::from(100) - (Decimal::from(100) / (Decimal::ONE + rs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn warm_up_gap_is_period_bars() {
        let values: Vec<Decimal> = (1..=20).map(Decimal::from).collect();
        let series = rsi_series(&values, 7);
        assert!(series[..7].iter().all(|v| v.is_none()));
        assert!(series[7..].iter().all(|v| v.is_some()));
    }

    #[test]
    fn all_gains_clamps_to_100() {
        let values: Vec<Decimal> = (1..=20).map(Decimal::from).collect();
        let series = rsi_series(&values, 7);
        assert_eq!(series[19], Some(dec!(100)));
    }

    #[test]
    fn all_losses_reads_zero() {
        let values: Vec<Decimal> = (1..=20).rev().map(Decimal::from).collect();
        let series = rsi_series(&values, 7);
        assert_eq!(series[19], Some(Decimal::ZERO));
    }

    #[test]
    fn bounded_between_0_and_100() {
        let values = vec![
            dec!(1.0850), dec!(1.0853), dec!(1.0848), dec!(1.0851), dec!(1.0846),
            dec!(1.0852), dec!(1.0855), dec!(1.0849), dec!(1.0844), dec!(1.0850),
            dec!(1.0857), dec!(1.0853), dec!(1.0847), dec!(1.0851),
        ];
        for rsi in rsi_series(&values, 7).into_iter().flatten() {
            assert!(rsi >= Decimal::ZERO && rsi <= dec!(100));
        }
    }

    #[test]
    fn insufficient_history_returns_all_none() {
        let values = vec![dec!(1.1); 7];
        assert!(rsi_series(&values, 7).iter().all(|v| v.is_none()));
    }
}
