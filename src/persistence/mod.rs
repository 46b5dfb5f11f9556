use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use crate::engine::BacktestResult;

/// Stores finished runs. Failures here never invalidate a computed
/// result; the engine logs them and returns the result anyway.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn save(&self, result: &BacktestResult) -> Result<()>;
}

/// SQLite-backed sink: one session row per run, one trade row per ledger
/// entry, keyed by the session id.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(db_path: &str) -> Result<Self> {
        info!("Initializing SQLite store at: {}", db_path);

        let options = SqliteConnectOptions::from_str(db_path)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.create_schema().await?;
        Ok(store)
    }

    async fn create_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS backtest_sessions (
                id TEXT PRIMARY KEY,
                strategy_id TEXT NOT NULL,
                symbol TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                initial_balance TEXT NOT NULL,
                final_balance TEXT NOT NULL,
                total_trades INTEGER NOT NULL,
                winning_trades INTEGER NOT NULL,
                losing_trades INTEGER NOT NULL,
                win_rate TEXT NOT NULL,
                total_pnl TEXT NOT NULL,
                profit_factor TEXT NOT NULL,
                max_drawdown_pct TEXT NOT NULL,
                sharpe_ratio TEXT NOT NULL,
                total_pips TEXT NOT NULL,
                cancelled INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS backtest_trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                direction TEXT NOT NULL,
                entry_price TEXT NOT NULL,
                exit_price TEXT NOT NULL,
                stop_loss TEXT NOT NULL,
                take_profit TEXT NOT NULL,
                size TEXT NOT NULL,
                entry_time TEXT NOT NULL,
                exit_time TEXT NOT NULL,
                exit_reason TEXT NOT NULL,
                pips TEXT NOT NULL,
                gross_pnl TEXT NOT NULL,
                commission TEXT NOT NULL,
                pnl TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL,
                confidence TEXT NOT NULL,
                reason TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_backtest_trades_session
                ON backtest_trades(session_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl PersistenceSink for SqliteStore {
    async fn save(&self, result: &BacktestResult) -> Result<()> {
        let session_id = result.session_id.to_string();

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO backtest_sessions (
                id, strategy_id, symbol, start_date, end_date,
                initial_balance, final_balance, total_trades, winning_trades,
                losing_trades, win_rate, total_pnl, profit_factor,
                max_drawdown_pct, sharpe_ratio, total_pips, cancelled, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session_id)
        .bind(&result.strategy_id)
        .bind(&result.symbol)
        .bind(result.start_date.to_string())
        .bind(result.end_date.to_string())
        .bind(result.initial_balance.to_string())
        .bind(result.final_balance.to_string())
        .bind(result.total_trades as i64)
        .bind(result.winning_trades as i64)
        .bind(result.losing_trades as i64)
        .bind(result.win_rate.to_string())
        .bind(result.total_pnl.to_string())
        .bind(result.profit_factor.to_string())
        .bind(result.max_drawdown_pct.to_string())
        .bind(result.sharpe_ratio.to_string())
        .bind(result.total_pips.to_string())
        .bind(result.cancelled as i64)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        for trade in &result.trades {
            sqlx::query(
                r#"
                INSERT INTO backtest_trades (
                    session_id, direction, entry_price, exit_price, stop_loss,
                    take_profit, size, entry_time, exit_time, exit_reason,
                    pips, gross_pnl, commission, pnl, duration_minutes,
                    confidence, reason
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&session_id)
            .bind(trade.direction.as_str())
            .bind(trade.entry.to_string())
            .bind(trade.exit.to_string())
            .bind(trade.stop_loss.to_string())
            .bind(trade.take_profit.to_string())
            .bind(trade.size.to_string())
            .bind(trade.entry_time.to_rfc3339())
            .bind(trade.exit_time.to_rfc3339())
            .bind(trade.exit_reason.to_string())
            .bind(trade.pips.to_string())
            .bind(trade.gross_pnl.to_string())
            .bind(trade.commission.to_string())
            .bind(trade.pnl.to_string())
            .bind(trade.duration_minutes)
            .bind(trade.confidence.to_string())
            .bind(&trade.reason)
            .execute(&self.pool)
            .await?;
        }

        info!(
            session = %session_id,
            trades = result.trades.len(),
            "backtest session persisted"
        );
        Ok(())
    }
}
