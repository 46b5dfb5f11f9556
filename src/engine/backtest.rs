use chrono::{NaiveTime, TimeZone, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BacktestConfig;
use crate::data::MarketDataProvider;
use crate::error::BacktestError;
use crate::persistence::PersistenceSink;
use crate::risk::RiskManager;
use crate::strategies::StrategyRegistry;
use crate::types::ExitReason;

use super::progress::{CancelHandle, ProgressTracker};
use super::results::{BacktestResult, MetricsCalculator};
use super::state::EngineState;

/// Bars skipped before the first strategy evaluation, sized to the
/// slowest indicator warm-up (the 200-period EMA).
pub const WARM_UP_BARS: usize = 200;

const HUNDRED: rust_decimal::Decimal = rust_decimal_macros::dec!(100);

/// Orchestrates one bar-by-bar simulation per call. Holds only immutable
/// collaborators, so a single engine can serve concurrent runs; all
/// per-run state lives in an `EngineState` local to `run_with`.
pub struct BacktestEngine {
    registry: Arc<StrategyRegistry>,
    data: Arc<dyn MarketDataProvider>,
    sink: Option<Arc<dyn PersistenceSink>>,
}

impl BacktestEngine {
    pub fn new(registry: Arc<StrategyRegistry>, data: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            registry,
            data,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn PersistenceSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run with engine-owned handles; for callers that do not observe
    /// progress or cancel.
    pub async fn run(&self, config: &BacktestConfig) -> Result<BacktestResult, BacktestError> {
        let progress = ProgressTracker::new(Uuid::new_v4(), config.initial_balance);
        self.run_with(config, &progress, &CancelHandle::new()).await
    }

    /// Full entry point. The session takes its identity from the progress
    /// tracker so external pollers can correlate snapshots with the final
    /// result.
    pub async fn run_with(
        &self,
        config: &BacktestConfig,
        progress: &ProgressTracker,
        cancel: &CancelHandle,
    ) -> Result<BacktestResult, BacktestError> {
        config.validate()?;
        let strategy = self
            .registry
            .resolve(&config.strategy_id)
            .ok_or_else(|| BacktestError::UnknownStrategy(config.strategy_id.clone()))?;

        let session_id = progress.snapshot().session_id;
        let start = Utc.from_utc_datetime(&config.start_date.and_time(NaiveTime::MIN));
        // The configured end date is inclusive.
        let end = Utc.from_utc_datetime(&config.end_date.and_time(NaiveTime::MIN))
            + chrono::Duration::days(1);

        info!(
            session = %session_id,
            strategy = config.strategy_id,
            symbol = config.symbol,
            "fetching bars for backtest"
        );
        let bars = self
            .data
            .fetch_bars(&config.symbol, start, end, config.timeframe)
            .await
            .map_err(BacktestError::DataFetch)?;
        if bars.is_empty() {
            return Err(BacktestError::DataUnavailable {
                symbol: config.symbol.clone(),
                start: config.start_date.to_string(),
                end: config.end_date.to_string(),
            });
        }

        let risk = RiskManager::from_config(config);
        let mut state = EngineState::new(config.initial_balance);
        progress.update(true, state.balance, 0, rust_decimal::Decimal::ZERO);

        let mut cancelled = false;
        let mut stop_index = bars.len() - 1;
        for i in WARM_UP_BARS..bars.len() {
            let bar = &bars[i];
            state.roll_date(bar.timestamp.date_naive());

            if let Some(position) = state.open_position.clone() {
                if let Some((exit, exit_reason)) = risk.check_exit(&position, bar) {
                    let trade = risk.close_position(&position, exit, bar.timestamp, exit_reason);
                    info!(
                        session = %session_id,
                        %exit_reason,
                        pips = %trade.pips,
                        pnl = %trade.pnl,
                        "position closed"
                    );
                    state.open_position = None;
                    state.settle(trade);
                }
            }

            if state.open_position.is_none() {
                match risk.tripped_breaker(state.balance, state.daily_pnl, state.consecutive_losses)
                {
                    Some(breaker) => {
                        debug!(session = %session_id, %breaker, "entries blocked")
                    }
                    None => match strategy.analyze(&bars[..=i]) {
                        Ok(signal) if signal.is_tradeable(config.min_confidence) => {
                            if let Some(position) =
                                risk.open_position(&signal, state.balance, bar.timestamp)
                            {
                                info!(
                                    session = %session_id,
                                    direction = %position.direction,
                                    entry = %position.entry,
                                    size = %position.size,
                                    confidence = %position.confidence,
                                    "position opened"
                                );
                                state.open_position = Some(position);
                            }
                        }
                        Ok(_) => {}
                        Err(error) => {
                            warn!(
                                session = %session_id,
                                bar = i,
                                %error,
                                "strategy analysis failed, treating bar as WAIT"
                            );
                        }
                    },
                }
            }

            state.update_drawdown();
            progress.update(
                true,
                state.balance,
                state.trades.len(),
                state.max_drawdown * HUNDRED,
            );

            if cancel.is_cancelled() {
                info!(session = %session_id, bar = i, "cancellation requested, stopping run");
                cancelled = true;
                stop_index = i;
                break;
            }
        }

        if let Some(position) = state.open_position.take() {
            // Series ended (or the run was cancelled) with a live
            // position: flat it at the last processed close.
            let last = &bars[stop_index];
            let trade =
                risk.close_position(&position, last.close, last.timestamp, ExitReason::SessionEnd);
            state.settle(trade);
            state.update_drawdown();
        }

        let result = MetricsCalculator::calculate(
            session_id,
            config,
            state.balance,
            state.max_drawdown,
            state.trades,
            cancelled,
        );
        progress.update(
            false,
            result.final_balance,
            result.trades.len(),
            result.max_drawdown_pct,
        );

        if let Some(sink) = &self.sink {
            if let Err(error) = sink.save(&result).await {
                warn!(session = %session_id, %error, "failed to persist backtest result");
            }
        }

        info!(
            session = %session_id,
            trades = result.total_trades,
            final_balance = %result.final_balance,
            cancelled,
            "backtest finished"
        );
        Ok(result)
    }
}
