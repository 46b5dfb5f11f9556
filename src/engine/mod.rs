pub mod backtest;
pub mod progress;
pub mod results;
pub mod state;

pub use backtest::{BacktestEngine, WARM_UP_BARS};
pub use progress::{CancelHandle, ProgressSnapshot, ProgressTracker};
pub use results::{BacktestResult, MetricsCalculator};
pub use state::EngineState;
