use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::BacktestConfig;
use crate::types::ClosedTrade;

/// Final aggregate of one backtest run. The ledger is the sole source of
/// every statistic here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub session_id: Uuid,
    pub strategy_id: String,
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_balance: Decimal,
    pub final_balance: Decimal,

    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub win_rate: Decimal,

    pub total_pnl: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub profit_factor: Decimal,

    /// Largest peak-to-trough giveback, in percent.
    pub max_drawdown_pct: Decimal,
    pub sharpe_ratio: Decimal,

    pub avg_win: Decimal,
    /// Positive magnitude.
    pub avg_loss: Decimal,
    pub largest_win: Decimal,
    /// Positive magnitude.
    pub largest_loss: Decimal,
    pub avg_trade_duration_minutes: i64,
    pub total_pips: Decimal,

    /// True when the run was cut short by a cancellation request; the
    /// statistics then cover only the bars processed so far.
    pub cancelled: bool,

    pub trades: Vec<ClosedTrade>,
}

impl BacktestResult {
    /// Pretty print a run summary to the console.
    pub fn print_summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("                    BACKTEST RESULTS");
        println!("{}", "=".repeat(60));
        println!("Session:            {}", self.session_id);
        println!("Strategy:           {}", self.strategy_id);
        println!("Symbol:             {}", self.symbol);
        println!("Period:             {} to {}", self.start_date, self.end_date);
        if self.cancelled {
            println!("Status:             CANCELLED (partial result)");
        }
        println!("Initial Balance:    ${:.2}", self.initial_balance);
        println!("Final Balance:      ${:.2}", self.final_balance);
        println!("{}", "-".repeat(60));
        println!("PERFORMANCE");
        println!("  Total P&L:          ${:.2}", self.total_pnl);
        println!("  Total Pips:         {:.1}", self.total_pips);
        println!("  Max Drawdown:       {:.2}%", self.max_drawdown_pct);
        println!("  Sharpe Ratio:       {:.2}", self.sharpe_ratio);
        println!("{}", "-".repeat(60));
        println!("TRADES");
        println!("  Total Trades:       {}", self.total_trades);
        println!("  Winning Trades:     {} ({:.1}%)", self.winning_trades, self.win_rate);
        println!("  Losing Trades:      {}", self.losing_trades);
        println!("  Profit Factor:      {:.2}", self.profit_factor);
        println!("  Average Win:        ${:.2}", self.avg_win);
        println!("  Average Loss:       ${:.2}", self.avg_loss);
        println!("  Largest Win:        ${:.2}", self.largest_win);
        println!("  Largest Loss:       ${:.2}", self.largest_loss);
        println!("  Avg Duration:       {} min", self.avg_trade_duration_minutes);
        println!("{}", "=".repeat(60));
    }
}

/// Calculator for run statistics.
pub struct MetricsCalculator;

impl MetricsCalculator {
    pub fn calculate(
        session_id: Uuid,
        config: &BacktestConfig,
        final_balance: Decimal,
        max_drawdown: Decimal,
        trades: Vec<ClosedTrade>,
        cancelled: bool,
    ) -> BacktestResult {
        let total_trades = trades.len() as u64;
        let winners: Vec<&ClosedTrade> = trades.iter().filter(|t| t.is_win()).collect();
        let losers: Vec<&ClosedTrade> = trades.iter().filter(|t| t.is_loss()).collect();
        let wins = winners.len() as u64;
        let losses = losers.len() as u64;

        let gross_profit: Decimal = winners.iter().map(|t| t.pnl).sum();
        let gross_loss: Decimal = losers.iter().map(|t| t.pnl.abs()).sum();
        let total_pnl: Decimal = trades.iter().map(|t| t.pnl).sum();
        let total_pips: Decimal = trades.iter().map(|t| t.pips).sum();

        let win_rate = if total_trades > 0 {
            Decimal::from(wins) / Decimal::from(total_trades) * dec!(100)
        } else {
            Decimal::ZERO
        };

        let profit_factor = if !gross_loss.is_zero() {
            gross_profit / gross_loss
        } else if gross_profit > Decimal::ZERO {
            dec!(999)
        } else {
            Decimal::ONE
        };

        let avg_win = if wins > 0 {
            gross_profit / Decimal::from(wins)
        } else {
            Decimal::ZERO
        };
        let avg_loss = if losses > 0 {
            gross_loss / Decimal::from(losses)
        } else {
            Decimal::ZERO
        };
        let largest_win = winners.iter().map(|t| t.pnl).max().unwrap_or(Decimal::ZERO);
        let largest_loss = losers
            .iter()
            .map(|t| t.pnl.abs())
            .max()
            .unwrap_or(Decimal::ZERO);

        let avg_trade_duration_minutes = if total_trades > 0 {
            trades.iter().map(|t| t.duration_minutes).sum::<i64>() / total_trades as i64
        } else {
            0
        };

        let sharpe_ratio = Self::sharpe_ratio(&trades, config.initial_balance);

        BacktestResult {
            session_id,
            strategy_id: config.strategy_id.clone(),
            symbol: config.symbol.clone(),
            start_date: config.start_date,
            end_date: config.end_date,
            initial_balance: config.initial_balance,
            final_balance,
            total_trades,
            winning_trades: wins,
            losing_trades: losses,
            win_rate,
            total_pnl,
            gross_profit,
            gross_loss,
            profit_factor,
            max_drawdown_pct: max_drawdown * dec!(100),
            sharpe_ratio,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            avg_trade_duration_minutes,
            total_pips,
            cancelled,
            trades,
        }
    }

    /// Annualized Sharpe over per-trade returns against the initial
    /// balance, risk-free rate 0. Zero when returns do not vary.
    fn sharpe_ratio(trades: &[ClosedTrade], initial_balance: Decimal) -> Decimal {
        if trades.is_empty() || initial_balance.is_zero() {
            return Decimal::ZERO;
        }

        let returns: Vec<f64> = trades
            .iter()
            .map(|t| (t.pnl / initial_balance).try_into().unwrap_or(0.0))
            .collect();

        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        if std_dev > 0.0 {
            Decimal::try_from(mean / std_dev * (252_f64).sqrt()).unwrap_or(Decimal::ZERO)
        } else {
            Decimal::ZERO
        }
    }
}
