//! Bar-by-bar forex scalping backtester.
//!
//! The engine replays historical bars through a signal strategy, manages a
//! single simulated position under fixed risk rules, and reports run
//! statistics. Market data and result persistence sit behind traits so
//! callers can plug in their own providers.

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod persistence;
pub mod risk;
pub mod strategies;
pub mod types;

pub use config::BacktestConfig;
pub use data::{MarketDataProvider, SyntheticDataProvider};
pub use engine::{
    BacktestEngine, BacktestResult, CancelHandle, ProgressSnapshot, ProgressTracker, WARM_UP_BARS,
};
pub use error::BacktestError;
pub use persistence::{PersistenceSink, SqliteStore};
pub use risk::RiskManager;
pub use strategies::{Signal, Strategy, StrategyRegistry};
