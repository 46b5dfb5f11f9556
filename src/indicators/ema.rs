use rust_decimal::Decimal;

/// Exponential moving average series, seeded with the first close.
///
/// Unlike the SMA there is no warm-up gap: the series is defined at every
/// index, converging toward the true EMA as history accumulates.
pub fn ema_series(values: &[Decimal], period: usize) -> Vec<Decimal> {
    if values.is_empty() || period == 0 {
        return Vec::new();
    }
    let alpha = Decimal::from(2) / Decimal::from(period as u32 + 1);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = values[0];
    out.push(ema);
    for value in &values[1..] {
        ema = *value * alpha + ema * (Decimal::ONE - alpha);
        out.push(ema);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn seeded_with_first_value() {
        let series = ema_series(&[dec!(10), dec!(20)], 3);
        assert_eq!(series[0], dec!(10));
        // alpha = 2/4 = 0.5 -> 20*0.5 + 10*0.5 = 15
        assert_eq!(series[1], dec!(15));
    }

    #[test]
    fn defined_at_every_index() {
        let values: Vec<Decimal> = (1..=50).map(Decimal::from).collect();
        let series = ema_series(&values, 21);
        assert_eq!(series.len(), values.len());
    }

    #[test]
    fn constant_input_stays_constant() {
        let series = ema_series(&[dec!(7); 30], 10);
        assert!(series.iter().all(|v| *v == dec!(7)));
    }

    #[test]
    fn empty_input_yields_empty_series() {
        assert!(ema_series(&[], 14).is_empty());
    }
}
