use rust_decimal::Decimal;

use super::{sma, stddev};

#[derive(Debug, Clone, Copy)]
pub struct BollingerBands {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
}

impl BollingerBands {
    pub fn bandwidth(&self) -> Decimal {
        self.upper - self.lower
    }
}

/// Bands over the trailing `period` closes: rolling mean plus/minus
/// `deviation` population standard deviations.
pub fn bollinger_bands(
    values: &[Decimal],
    period: usize,
    deviation: Decimal,
) -> Option<BollingerBands> {
    let middle = sma(values, period)?;
    let sd = stddev(values, period)?;
    let offset = sd * deviation;
    Some(BollingerBands {
        upper: middle + offset,
        middle,
        lower: middle - offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn flat_series_collapses_bands_onto_mean() {
        let values = vec![dec!(1.0850); 20];
        let bands = bollinger_bands(&values, 20, dec!(2)).unwrap();
        assert_eq!(bands.upper, dec!(1.0850));
        assert_eq!(bands.middle, dec!(1.0850));
        assert_eq!(bands.lower, dec!(1.0850));
    }

    #[test]
    fn bands_are_symmetric_around_middle() {
        let values: Vec<Decimal> = (1..=25).map(Decimal::from).collect();
        let bands = bollinger_bands(&values, 20, dec!(2)).unwrap();
        assert_eq!(bands.upper - bands.middle, bands.middle - bands.lower);
        assert!(bands.upper > bands.lower);
    }

    #[test]
    fn insufficient_history_is_none() {
        let values = vec![dec!(1.1); 19];
        assert!(bollinger_bands(&values, 20, dec!(2)).is_none());
    }
}
