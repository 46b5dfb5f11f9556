use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Side;

/// The single open trade. Created by the risk manager from a tradeable
/// signal, mutated only by the risk manager, destroyed on close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub direction: Side,
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    /// Position size in lots (100,000 units of base currency per lot).
    pub size: Decimal,
    pub entry_time: DateTime<Utc>,
    pub confidence: Decimal,
    pub reason: String,
}

/// Immutable ledger record appended when a position closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub direction: Side,
    pub entry: Decimal,
    pub exit: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub size: Decimal,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub exit_reason: ExitReason,
    pub pips: Decimal,
    pub gross_pnl: Decimal,
    pub commission: Decimal,
    /// Net P&L: gross minus commission. The only field that moves balance.
    pub pnl: Decimal,
    pub duration_minutes: i64,
    pub confidence: Decimal,
    pub reason: String,
}

impl ClosedTrade {
    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }

    pub fn is_loss(&self) -> bool {
        self.pnl < Decimal::ZERO
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    SessionEnd,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "Stop Loss"),
            ExitReason::TakeProfit => write!(f, "Take Profit"),
            ExitReason::SessionEnd => write!(f, "Session end"),
        }
    }
}
