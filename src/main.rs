use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use scalper_backtest::config::BacktestConfig;
use scalper_backtest::data::SyntheticDataProvider;
use scalper_backtest::engine::{BacktestEngine, CancelHandle, ProgressTracker};
use scalper_backtest::persistence::SqliteStore;
use scalper_backtest::strategies::StrategyRegistry;
use scalper_backtest::types::Timeframe;

#[derive(Parser)]
#[command(name = "scalper-backtest")]
#[command(version = "0.1.0")]
#[command(about = "Bar-by-bar forex scalping backtester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest for one strategy over a date range
    Run {
        /// Strategy id (see `strategies` for the list)
        #[arg(short = 'S', long, default_value = "rsi-extremes")]
        strategy: String,

        /// Currency pair
        #[arg(long, default_value = "EURUSD")]
        symbol: String,

        /// Start date (YYYY-MM-DD)
        #[arg(short, long, default_value = "2024-01-01")]
        start: String,

        /// End date (YYYY-MM-DD)
        #[arg(short, long, default_value = "2024-06-30")]
        end: String,

        /// Bar timeframe (1m, 5m, 15m, 30m, 1h, 4h, 1d)
        #[arg(short = 'f', long, default_value = "5m")]
        timeframe: String,

        /// Initial account balance in USD
        #[arg(short, long, default_value = "10000")]
        balance: f64,

        /// Percent of balance risked per trade
        #[arg(short, long, default_value = "2")]
        risk: f64,

        /// Daily loss limit as percent of balance
        #[arg(long, default_value = "5")]
        max_daily_loss: f64,

        /// Commission per unit of base currency
        #[arg(long, default_value = "0.0002")]
        commission: f64,

        /// Minimum signal confidence accepted for entry
        #[arg(long, default_value = "70")]
        min_confidence: f64,

        /// Losing trades in a row before entries stop
        #[arg(long, default_value = "3")]
        max_consecutive_losses: u32,

        /// Seed for the synthetic price series
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Per-bar drift of the synthetic series
        #[arg(long, default_value = "0.0")]
        drift: f64,

        /// Per-bar volatility of the synthetic series
        #[arg(long, default_value = "0.0004")]
        volatility: f64,

        /// Save the session and its trades to SQLite
        #[arg(long)]
        save_to_db: bool,

        /// Database path used with --save-to-db
        #[arg(long, default_value = "sqlite:./backtests.db")]
        db_path: String,

        /// Write the full result as JSON to this file
        #[arg(short, long)]
        output: Option<String>,
    },
    /// List the built-in strategies
    Strategies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            strategy,
            symbol,
            start,
            end,
            timeframe,
            balance,
            risk,
            max_daily_loss,
            commission,
            min_confidence,
            max_consecutive_losses,
            seed,
            drift,
            volatility,
            save_to_db,
            db_path,
            output,
        } => {
            let config = BacktestConfig {
                strategy_id: strategy,
                symbol,
                start_date: parse_date(&start)?,
                end_date: parse_date(&end)?,
                timeframe: Timeframe::parse(&timeframe)
                    .ok_or_else(|| anyhow!("Unknown timeframe: {}", timeframe))?,
                initial_balance: Decimal::try_from(balance)?,
                risk_per_trade: Decimal::try_from(risk)?,
                max_daily_loss: Decimal::try_from(max_daily_loss)?,
                commission_rate: Decimal::try_from(commission)?,
                min_confidence: Decimal::try_from(min_confidence)?,
                max_consecutive_losses,
            };

            run_backtest(config, seed, drift, volatility, save_to_db, &db_path, output).await?;
        }
        Commands::Strategies => {
            list_strategies();
        }
    }

    Ok(())
}

async fn run_backtest(
    config: BacktestConfig,
    seed: u64,
    drift: f64,
    volatility: f64,
    save_to_db: bool,
    db_path: &str,
    output: Option<String>,
) -> Result<()> {
    info!(
        "Backtest: {} on {} {} from {} to {}",
        config.strategy_id,
        config.symbol,
        config.timeframe.as_str(),
        config.start_date,
        config.end_date
    );

    let registry = Arc::new(StrategyRegistry::builtin());
    let data = Arc::new(
        SyntheticDataProvider::new(seed)
            .with_drift(drift)
            .with_volatility(volatility),
    );

    let mut engine = BacktestEngine::new(registry, data);
    if save_to_db {
        let store = SqliteStore::new(db_path).await?;
        engine = engine.with_sink(Arc::new(store));
        info!("Results will be saved to {}", db_path);
    }

    let progress = ProgressTracker::new(Uuid::new_v4(), config.initial_balance);
    let cancel = CancelHandle::new();

    // Ctrl+C stops the run at the current bar and reports a partial result.
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current bar");
            cancel_on_signal.cancel();
        }
    });

    let reporter_progress = progress.clone();
    let reporter = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(5));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let snapshot = reporter_progress.snapshot();
            if !snapshot.is_running {
                break;
            }
            info!(
                "Progress: balance ${:.2} | trades {} | drawdown {:.2}%",
                snapshot.current_balance, snapshot.total_trades, snapshot.current_drawdown
            );
        }
    });

    let result = engine.run_with(&config, &progress, &cancel).await?;
    reporter.abort();

    result.print_summary();

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&result)?;
        std::fs::write(&path, json)?;
        info!("Results saved to {}", path);
    }

    Ok(())
}

fn list_strategies() {
    let registry = StrategyRegistry::builtin();

    println!("\n=== Built-in Strategies ===");
    for id in registry.ids() {
        if let Some(strategy) = registry.resolve(id) {
            println!(
                "{:<22} {:<28} {:>4} bars  expected {}{}",
                id,
                strategy.name(),
                strategy.min_bars(),
                strategy.win_rate_expectation(),
                if strategy.is_premium() { "  [premium]" } else { "" }
            );
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| anyhow!("Invalid date (use YYYY-MM-DD): {}", s))
}
