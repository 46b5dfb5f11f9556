use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::BacktestError;

/// Caller-supplied run parameters, validated once before any simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub strategy_id: String,
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub timeframe: crate::types::Timeframe,
    pub initial_balance: Decimal,
    /// Percent of balance risked per trade.
    pub risk_per_trade: Decimal,
    /// Percent of balance that may be lost in one calendar day before
    /// new entries are blocked for the rest of that day.
    pub max_daily_loss: Decimal,
    /// Commission per unit of base currency (0.0002 = 2 pips per lot).
    pub commission_rate: Decimal,
    /// Signals below this confidence are ignored.
    pub min_confidence: Decimal,
    /// Losing closes in a row before the entry breaker trips.
    pub max_consecutive_losses: u32,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            strategy_id: "rsi-extremes".to_string(),
            symbol: "EURUSD".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            timeframe: crate::types::Timeframe::M5,
            initial_balance: dec!(10000),
            risk_per_trade: dec!(2),
            max_daily_loss: dec!(5),
            commission_rate: dec!(0.0002),
            min_confidence: dec!(70),
            max_consecutive_losses: 3,
        }
    }
}

impl BacktestConfig {
    /// Fails fast with the first violated constraint.
    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.strategy_id.trim().is_empty() {
            return Err(BacktestError::Configuration(
                "strategy_id must not be empty".into(),
            ));
        }
        if self.symbol.trim().is_empty() {
            return Err(BacktestError::Configuration(
                "symbol must not be empty".into(),
            ));
        }
        if self.start_date >= self.end_date {
            return Err(BacktestError::Configuration(format!(
                "start_date {} must be before end_date {}",
                self.start_date, self.end_date
            )));
        }
        if self.initial_balance <= Decimal::ZERO {
            return Err(BacktestError::Configuration(format!(
                "initial_balance must be positive, got {}",
                self.initial_balance
            )));
        }
        if self.risk_per_trade <= Decimal::ZERO || self.risk_per_trade > dec!(100) {
            return Err(BacktestError::Configuration(format!(
                "risk_per_trade must be in (0, 100], got {}",
                self.risk_per_trade
            )));
        }
        if self.max_daily_loss <= Decimal::ZERO || self.max_daily_loss > dec!(100) {
            return Err(BacktestError::Configuration(format!(
                "max_daily_loss must be in (0, 100], got {}",
                self.max_daily_loss
            )));
        }
        if self.commission_rate < Decimal::ZERO {
            return Err(BacktestError::Configuration(format!(
                "commission_rate must not be negative, got {}",
                self.commission_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(BacktestConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_date_range() {
        let config = BacktestConfig {
            start_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("start_date"));
    }

    #[test]
    fn rejects_non_positive_balance() {
        let config = BacktestConfig {
            initial_balance: Decimal::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_strategy_id() {
        let config = BacktestConfig {
            strategy_id: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_risk() {
        let config = BacktestConfig {
            risk_per_trade: dec!(150),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
