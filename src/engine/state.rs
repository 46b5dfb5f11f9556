use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::types::{ClosedTrade, Position};

/// Mutable bookkeeping for one backtest run. Created at run start, owned by
/// the bar loop, discarded once the result is computed; never shared
/// between concurrent runs.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub balance: Decimal,
    /// High-water mark, non-decreasing.
    pub peak_balance: Decimal,
    /// Largest fraction of the peak given back, non-decreasing.
    pub max_drawdown: Decimal,
    /// Realised P&L for the current calendar date.
    pub daily_pnl: Decimal,
    pub current_date: Option<NaiveDate>,
    pub consecutive_losses: u32,
    pub open_position: Option<Position>,
    /// Append-only ledger in close order.
    pub trades: Vec<ClosedTrade>,
}

impl EngineState {
    pub fn new(initial_balance: Decimal) -> Self {
        Self {
            balance: initial_balance,
            peak_balance: initial_balance,
            max_drawdown: Decimal::ZERO,
            daily_pnl: Decimal::ZERO,
            current_date: None,
            consecutive_losses: 0,
            open_position: None,
            trades: Vec::new(),
        }
    }

    /// Roll the session date forward, resetting the daily P&L accumulator
    /// whenever the calendar date changes.
    pub fn roll_date(&mut self, date: NaiveDate) {
        if self.current_date != Some(date) {
            self.current_date = Some(date);
            self.daily_pnl = Decimal::ZERO;
        }
    }

    /// Settle a closed trade: move the balance, the daily accumulator and
    /// the loss streak, then append to the ledger.
    pub fn settle(&mut self, trade: ClosedTrade) {
        self.balance += trade.pnl;
        self.daily_pnl += trade.pnl;
        if trade.is_loss() {
            self.consecutive_losses += 1;
        } else if trade.is_win() {
            self.consecutive_losses = 0;
        }
        self.trades.push(trade);
    }

    /// Advance the high-water mark and drawdown after any balance change.
    pub fn update_drawdown(&mut self) {
        if self.balance > self.peak_balance {
            self.peak_balance = self.balance;
        }
        if self.peak_balance > Decimal::ZERO {
            let drawdown = (self.peak_balance - self.balance) / self.peak_balance;
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExitReason, Side};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn trade(pnl: Decimal) -> ClosedTrade {
        let now = Utc::now();
        ClosedTrade {
            direction: Side::Buy,
            entry: dec!(1.0850),
            exit: dec!(1.0860),
            stop_loss: dec!(1.0830),
            take_profit: dec!(1.0890),
            size: dec!(0.5),
            entry_time: now,
            exit_time: now,
            exit_reason: ExitReason::TakeProfit,
            pips: dec!(10),
            gross_pnl: pnl,
            commission: Decimal::ZERO,
            pnl,
            duration_minutes: 5,
            confidence: dec!(80),
            reason: "test".to_string(),
        }
    }

    #[test]
    fn settle_moves_balance_and_streak() {
        let mut state = EngineState::new(dec!(10000));
        state.settle(trade(dec!(-110)));
        state.settle(trade(dec!(-50)));
        assert_eq!(state.balance, dec!(9840));
        assert_eq!(state.daily_pnl, dec!(-160));
        assert_eq!(state.consecutive_losses, 2);

        state.settle(trade(dec!(200)));
        assert_eq!(state.consecutive_losses, 0);
        assert_eq!(state.trades.len(), 3);
    }

    #[test]
    fn breakeven_trade_keeps_streak() {
        let mut state = EngineState::new(dec!(10000));
        state.settle(trade(dec!(-10)));
        state.settle(trade(Decimal::ZERO));
        assert_eq!(state.consecutive_losses, 1);
    }

    #[test]
    fn date_roll_resets_daily_pnl() {
        let mut state = EngineState::new(dec!(10000));
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        state.roll_date(monday);
        state.settle(trade(dec!(-300)));
        assert_eq!(state.daily_pnl, dec!(-300));

        state.roll_date(monday);
        assert_eq!(state.daily_pnl, dec!(-300));

        state.roll_date(monday.succ_opt().unwrap());
        assert_eq!(state.daily_pnl, Decimal::ZERO);
    }

    #[test]
    fn drawdown_is_non_decreasing_fraction_of_peak() {
        let mut state = EngineState::new(dec!(10000));
        state.settle(trade(dec!(1000)));
        state.update_drawdown();
        assert_eq!(state.peak_balance, dec!(11000));
        assert_eq!(state.max_drawdown, Decimal::ZERO);

        state.settle(trade(dec!(-2200)));
        state.update_drawdown();
        assert_eq!(state.max_drawdown, dec!(0.2));

        // Recovery never shrinks the recorded drawdown.
        state.settle(trade(dec!(1100)));
        state.update_drawdown();
        assert_eq!(state.max_drawdown, dec!(0.2));
    }
}
