use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;
use tracing::debug;

use crate::config::BacktestConfig;
use crate::strategies::{Signal, PIP};
use crate::types::{Bar, ClosedTrade, ExitReason, Position, Side};

const UNITS_PER_LOT: Decimal = dec!(100000);
const PIP_VALUE_PER_LOT: Decimal = dec!(10);
const MIN_LOTS: Decimal = dec!(0.01);
const MAX_LOTS: Decimal = dec!(10);

/// Circuit breaker that blocks new entries for the rest of the session day
/// (daily loss) or the rest of the run (consecutive losses).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breaker {
    DailyLoss,
    ConsecutiveLosses,
}

impl fmt::Display for Breaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Breaker::DailyLoss => write!(f, "daily loss limit"),
            Breaker::ConsecutiveLosses => write!(f, "consecutive loss limit"),
        }
    }
}

/// Sizing, exit and circuit-breaker rules. Holds only the limits copied
/// from the run config; all per-run state lives in the engine.
pub struct RiskManager {
    risk_per_trade: Decimal,
    max_daily_loss: Decimal,
    commission_rate: Decimal,
    max_consecutive_losses: u32,
}

impl RiskManager {
    pub fn from_config(config: &BacktestConfig) -> Self {
        Self {
            risk_per_trade: config.risk_per_trade,
            max_daily_loss: config.max_daily_loss,
            commission_rate: config.commission_rate,
            max_consecutive_losses: config.max_consecutive_losses,
        }
    }

    /// Lot size risking `risk_per_trade` percent of the balance over the
    /// stop distance, clamped to broker lot limits. A stop at or through
    /// the entry yields zero: the trade is skipped.
    pub fn position_size(&self, balance: Decimal, entry: Decimal, stop_loss: Decimal) -> Decimal {
        let stop_distance = (entry - stop_loss).abs();
        if stop_distance <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let risk_amount = balance * self.risk_per_trade / Decimal::ONE_HUNDRED;
        let lots = risk_amount / (stop_distance * UNITS_PER_LOT);
        lots.clamp(MIN_LOTS, MAX_LOTS)
    }

    /// Open a position from a tradeable signal, or `None` when sizing
    /// rejects it.
    pub fn open_position(
        &self,
        signal: &Signal,
        balance: Decimal,
        entry_time: DateTime<Utc>,
    ) -> Option<Position> {
        let direction = signal.action.side()?;
        let size = self.position_size(balance, signal.entry, signal.stop_loss);
        if size.is_zero() {
            debug!(entry = %signal.entry, stop = %signal.stop_loss, "signal rejected: zero size");
            return None;
        }

        Some(Position {
            direction,
            entry: signal.entry,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
            size,
            entry_time,
            confidence: signal.confidence,
            reason: signal.reason.clone(),
        })
    }

    /// Intra-bar exit check. The stop is evaluated before the target: when
    /// a bar's range spans both levels, the conservative fill wins. Fills
    /// happen at the level price, not the close.
    pub fn check_exit(&self, position: &Position, bar: &Bar) -> Option<(Decimal, ExitReason)> {
        match position.direction {
            Side::Buy => {
                if bar.low <= position.stop_loss {
                    Some((position.stop_loss, ExitReason::StopLoss))
                } else if bar.high >= position.take_profit {
                    Some((position.take_profit, ExitReason::TakeProfit))
                } else {
                    None
                }
            }
            Side::Sell => {
                if bar.high >= position.stop_loss {
                    Some((position.stop_loss, ExitReason::StopLoss))
                } else if bar.low <= position.take_profit {
                    Some((position.take_profit, ExitReason::TakeProfit))
                } else {
                    None
                }
            }
        }
    }

    /// Settle a position into a ledger record. Commission is charged on
    /// notional volume regardless of outcome.
    pub fn close_position(
        &self,
        position: &Position,
        exit: Decimal,
        exit_time: DateTime<Utc>,
        exit_reason: ExitReason,
    ) -> ClosedTrade {
        let pips = match position.direction {
            Side::Buy => (exit - position.entry) / PIP,
            Side::Sell => (position.entry - exit) / PIP,
        };
        let gross_pnl = pips * position.size * PIP_VALUE_PER_LOT;
        let commission = self.commission_rate * position.size * UNITS_PER_LOT;

        ClosedTrade {
            direction: position.direction,
            entry: position.entry,
            exit,
            stop_loss: position.stop_loss,
            take_profit: position.take_profit,
            size: position.size,
            entry_time: position.entry_time,
            exit_time,
            exit_reason,
            pips,
            gross_pnl,
            commission,
            pnl: gross_pnl - commission,
            duration_minutes: (exit_time - position.entry_time).num_minutes(),
            confidence: position.confidence,
            reason: position.reason.clone(),
        }
    }

    /// First tripped breaker, if any. Daily loss compares the magnitude of
    /// the day's realised P&L against a percentage of the current balance.
    pub fn tripped_breaker(
        &self,
        balance: Decimal,
        daily_pnl: Decimal,
        consecutive_losses: u32,
    ) -> Option<Breaker> {
        if consecutive_losses >= self.max_consecutive_losses {
            return Some(Breaker::ConsecutiveLosses);
        }

        let daily_limit = balance * self.max_daily_loss / Decimal::ONE_HUNDRED;
        if daily_pnl.abs() >= daily_limit {
            return Some(Breaker::DailyLoss);
        }

        None
    }
}
